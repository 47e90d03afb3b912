use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashSet;
use tracing::info;
use validator::Validate;

use crate::dtos::transactions::{
    ConfirmImportRequest, ImportCandidate, ImportPreviewResponse, ImportResponse,
};
use crate::handlers::transactions::check_ownership;
use crate::middleware::AuthUser;
use crate::models::{Category, NewTransaction};
use crate::services::categorizer;
use crate::services::database::DuplicateKey;
use crate::services::metrics::{record_ofx_import, record_transactions_created};
use crate::services::ofx::{self, OfxStatement};
use crate::startup::AppState;

/// Statement bytes from the multipart `file` field, or the raw body.
async fn read_statement(request: Request) -> Result<Bytes, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        return Bytes::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(anyhow!("Failed to read body: {}", e)));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid multipart body: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(anyhow!("Failed to read file: {}", e)));
        }
    }

    Err(AppError::bad_request("No file provided"))
}

/// Preview rows: suggested category and duplicate flag per statement line.
fn build_preview(
    statement: OfxStatement,
    categories: &[Category],
    existing: &HashSet<DuplicateKey>,
) -> ImportPreviewResponse {
    let transactions: Vec<ImportCandidate> = statement
        .transactions
        .into_iter()
        .map(|tx| {
            let suggestion =
                categorizer::suggest_category(&tx.description, tx.transaction_type, categories);
            let key = (
                tx.date,
                tx.amount.normalize(),
                tx.transaction_type.as_str().to_string(),
            );
            ImportCandidate {
                is_duplicate: existing.contains(&key),
                suggested_category_id: suggestion.map(|c| c.category_id),
                suggested_category_name: suggestion.map(|c| c.name.clone()),
                fitid: tx.fitid,
                date: tx.date,
                amount: tx.amount,
                transaction_type: tx.transaction_type,
                description: tx.description,
            }
        })
        .collect();

    let duplicates = transactions.iter().filter(|t| t.is_duplicate).count();
    ImportPreviewResponse {
        total: transactions.len(),
        duplicates,
        skipped: statement.skipped,
        transactions,
    }
}

/// Parse an OFX statement into a preview. Nothing is stored.
pub async fn preview_ofx(
    State(state): State<AppState>,
    user: AuthUser,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let bytes = read_statement(request).await?;
    if bytes.is_empty() {
        record_ofx_import("empty");
        return Err(AppError::bad_request("Empty file"));
    }

    let statement = ofx::parse(&ofx::decode(&bytes));
    if statement.transactions.is_empty() {
        record_ofx_import("no_transactions");
        return Err(AppError::bad_request("No transactions found in OFX file"));
    }

    let existing = match statement.date_range() {
        Some((start, end)) => state.db.duplicate_keys(user.user_id, start, end).await?,
        None => HashSet::new(),
    };
    let categories = state.db.list_categories(user.user_id, None).await?;

    let preview = build_preview(statement, &categories, &existing);
    record_ofx_import("parsed");
    info!(
        user_id = %user.user_id,
        total = preview.total,
        duplicates = preview.duplicates,
        skipped = preview.skipped,
        "OFX statement parsed"
    );

    Ok(Json(preview))
}

/// Bulk-create the lines the user confirmed from a preview.
pub async fn confirm_import(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ConfirmImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    check_ownership(&state, user.user_id, req.account_id, None).await?;

    let owned: HashSet<_> = state
        .db
        .list_categories(user.user_id, None)
        .await?
        .into_iter()
        .map(|c| c.category_id)
        .collect();
    if let Some(missing) = req
        .transactions
        .iter()
        .filter_map(|t| t.category_id)
        .find(|id| !owned.contains(id))
    {
        return Err(AppError::NotFound(anyhow!("Category {} not found", missing)));
    }

    let rows: Vec<NewTransaction> = req
        .transactions
        .into_iter()
        .map(|item| NewTransaction {
            user_id: user.user_id,
            account_id: req.account_id,
            category_id: item.category_id,
            amount: item.amount,
            transaction_type: item.transaction_type,
            description: item.description.trim().to_string(),
            date: item.date,
            tags: Vec::new(),
            attachment_url: None,
            installment: None,
            recurrence: None,
        })
        .collect();

    let created = state.db.insert_transactions(&rows).await?;
    record_transactions_created("import", created.len());
    record_ofx_import("imported");

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            imported: created.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryType, TransactionType};
    use crate::services::ofx::OfxTransaction;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn line(description: &str, amount: rust_decimal::Decimal, kind: TransactionType) -> OfxTransaction {
        OfxTransaction {
            fitid: Some("1".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            amount,
            transaction_type: kind,
            description: description.to_string(),
        }
    }

    #[test]
    fn preview_flags_duplicates_and_suggests_categories() {
        let food = Category {
            category_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Alimentacao".to_string(),
            category_type: CategoryType::Expense.as_str().to_string(),
            color: None,
            icon: None,
            created_utc: Utc::now(),
        };
        let statement = OfxStatement {
            transactions: vec![
                line("IFOOD *RESTAURANTE", dec!(45.90), TransactionType::Expense),
                line("PIX RECEBIDO", dec!(100.00), TransactionType::Income),
            ],
            skipped: 2,
        };
        let mut existing = HashSet::new();
        existing.insert((
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            dec!(100),
            "income".to_string(),
        ));

        let preview = build_preview(statement, &[food.clone()], &existing);

        assert_eq!(preview.total, 2);
        assert_eq!(preview.duplicates, 1);
        assert_eq!(preview.skipped, 2);
        assert_eq!(preview.transactions[0].suggested_category_id, Some(food.category_id));
        assert!(!preview.transactions[0].is_duplicate);
        assert!(preview.transactions[1].suggested_category_id.is_none());
        assert!(preview.transactions[1].is_duplicate);
    }
}
