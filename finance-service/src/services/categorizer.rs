//! Keyword-based category suggestion for imported statement lines, and the
//! default category set those suggestions resolve to.

use crate::models::{Category, CategoryType, TransactionType};

/// A category seeded by `POST /categories/defaults`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub category_type: CategoryType,
    pub color: &'static str,
    pub icon: &'static str,
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory { name: "Alimentação", category_type: CategoryType::Expense, color: "#f97316", icon: "utensils" },
    DefaultCategory { name: "Transporte", category_type: CategoryType::Expense, color: "#3b82f6", icon: "car" },
    DefaultCategory { name: "Moradia", category_type: CategoryType::Expense, color: "#8b5cf6", icon: "home" },
    DefaultCategory { name: "Saúde", category_type: CategoryType::Expense, color: "#ef4444", icon: "heart-pulse" },
    DefaultCategory { name: "Educação", category_type: CategoryType::Expense, color: "#0ea5e9", icon: "graduation-cap" },
    DefaultCategory { name: "Lazer", category_type: CategoryType::Expense, color: "#ec4899", icon: "gamepad" },
    DefaultCategory { name: "Compras", category_type: CategoryType::Expense, color: "#eab308", icon: "shopping-bag" },
    DefaultCategory { name: "Contas", category_type: CategoryType::Expense, color: "#64748b", icon: "receipt" },
    DefaultCategory { name: "Outros", category_type: CategoryType::Expense, color: "#94a3b8", icon: "circle" },
    DefaultCategory { name: "Salário", category_type: CategoryType::Income, color: "#22c55e", icon: "wallet" },
    DefaultCategory { name: "Freelance", category_type: CategoryType::Income, color: "#14b8a6", icon: "briefcase" },
    DefaultCategory { name: "Rendimentos", category_type: CategoryType::Income, color: "#10b981", icon: "trending-up" },
    DefaultCategory { name: "Investimentos", category_type: CategoryType::Investment, color: "#6366f1", icon: "piggy-bank" },
];

/// Folded keywords, checked in order; the first hit wins.
const KEYWORDS: &[(&str, TransactionType, &[&str])] = &[
    ("Salário", TransactionType::Income, &["salario", "folha pgto", "pagamento salario", "proventos"]),
    ("Rendimentos", TransactionType::Income, &["rendimento", "juros", "dividendo", "cdb", "tesouro"]),
    ("Freelance", TransactionType::Income, &["freelance", "honorario"]),
    ("Alimentação", TransactionType::Expense, &[
        "ifood", "rappi", "mercado", "supermercado", "padaria", "restaurante", "lanchonete",
        "acougue", "hortifruti", "pizzaria", "burger", "mcdonald", "atacadao", "carrefour",
        "assai", "pao de acucar",
    ]),
    ("Transporte", TransactionType::Expense, &[
        "uber", "99app", "99 taxi", "cabify", "posto", "combustivel", "gasolina", "shell",
        "ipiranga", "estacionamento", "pedagio", "metro", "onibus", "sem parar",
    ]),
    ("Lazer", TransactionType::Expense, &[
        "netflix", "spotify", "disney", "hbo", "prime video", "youtube", "cinema", "ingresso",
        "steam", "playstation", "xbox", "teatro",
    ]),
    ("Saúde", TransactionType::Expense, &[
        "farmacia", "drogaria", "droga raia", "drogasil", "pague menos", "hospital", "clinica",
        "laboratorio", "unimed", "amil", "dentista", "academia", "smartfit",
    ]),
    ("Educação", TransactionType::Expense, &[
        "escola", "faculdade", "universidade", "curso", "udemy", "alura", "livraria", "mensalidade",
    ]),
    ("Moradia", TransactionType::Expense, &["aluguel", "condominio", "iptu", "imobiliaria"]),
    ("Contas", TransactionType::Expense, &[
        "energia", "enel", "cemig", "light", "sabesp", "agua", "internet", "vivo", "claro", "tim celular",
        "oi fibra", "telefone", "gas ",
    ]),
    ("Compras", TransactionType::Expense, &[
        "amazon", "mercado livre", "mercadolivre", "shopee", "magalu", "magazine", "americanas",
        "aliexpress", "shein", "renner", "riachuelo",
    ]),
];

/// Lowercase and strip Portuguese diacritics.
pub fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Category name suggested for a description, if any keyword matches.
pub fn suggest_category_name(
    description: &str,
    transaction_type: TransactionType,
) -> Option<&'static str> {
    let folded = fold(description);
    KEYWORDS
        .iter()
        .filter(|(_, kind, _)| *kind == transaction_type)
        .find(|(_, _, words)| words.iter().any(|w| folded.contains(w)))
        .map(|(name, _, _)| *name)
}

/// Resolve a suggestion against the user's own categories of the matching type.
pub fn suggest_category<'a>(
    description: &str,
    transaction_type: TransactionType,
    categories: &'a [Category],
) -> Option<&'a Category> {
    let name = fold(suggest_category_name(description, transaction_type)?);
    let wanted = match transaction_type {
        TransactionType::Income => CategoryType::Income,
        TransactionType::Expense => CategoryType::Expense,
    };
    categories
        .iter()
        .filter(|c| CategoryType::parse(&c.category_type) == Some(wanted))
        .find(|c| fold(c.name.trim()) == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn category(name: &str, kind: CategoryType) -> Category {
        Category {
            category_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            category_type: kind.as_str().to_string(),
            color: None,
            icon: None,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn folding_strips_accents_and_case() {
        assert_eq!(fold("FARMÁCIA São João"), "farmacia sao joao");
        assert_eq!(fold("Alimentação"), "alimentacao");
    }

    #[test]
    fn suggests_by_keyword() {
        assert_eq!(
            suggest_category_name("IFOOD *RESTAURANTE", TransactionType::Expense),
            Some("Alimentação")
        );
        assert_eq!(
            suggest_category_name("UBER *TRIP", TransactionType::Expense),
            Some("Transporte")
        );
        assert_eq!(
            suggest_category_name("Netflix.com", TransactionType::Expense),
            Some("Lazer")
        );
        assert_eq!(
            suggest_category_name("DROGARIA FARMÁCIA", TransactionType::Expense),
            Some("Saúde")
        );
        assert_eq!(
            suggest_category_name("CRED SALÁRIO ACME", TransactionType::Income),
            Some("Salário")
        );
    }

    #[test]
    fn keyword_must_match_transaction_type() {
        assert_eq!(suggest_category_name("SALARIO", TransactionType::Expense), None);
        assert_eq!(suggest_category_name("TED RECEBIDA", TransactionType::Income), None);
    }

    #[test]
    fn resolves_against_user_categories_ignoring_accents() {
        let categories = vec![
            category("alimentacao", CategoryType::Expense),
            category("Salário", CategoryType::Income),
        ];
        let hit = suggest_category("MERCADO DIA", TransactionType::Expense, &categories).unwrap();
        assert_eq!(hit.name, "alimentacao");

        let salary = suggest_category("SALARIO", TransactionType::Income, &categories).unwrap();
        assert_eq!(salary.name, "Salário");
    }

    #[test]
    fn no_user_category_means_no_suggestion() {
        let categories = vec![category("Alimentação", CategoryType::Income)];
        assert!(suggest_category("IFOOD", TransactionType::Expense, &categories).is_none());
    }

    #[test]
    fn every_keyword_target_is_a_default_category() {
        for (name, _, _) in KEYWORDS {
            assert!(
                DEFAULT_CATEGORIES.iter().any(|c| c.name == *name),
                "{name} missing from defaults"
            );
        }
    }
}
