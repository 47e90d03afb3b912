//! Mock provider used when no LLM API key is configured, and in tests.

use super::{InsightProvider, ProviderError, ProviderResponse};
use async_trait::async_trait;
use serde_json::json;

pub struct MockInsightProvider {
    enabled: bool,
}

impl MockInsightProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl InsightProvider for MockInsightProvider {
    async fn complete_json(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock insight provider not enabled".to_string(),
            ));
        }

        let body = json!({
            "summary": "Resumo gerado localmente a partir dos dados do mês.",
            "insights": [{
                "type": "neutral",
                "title": "Análise simulada",
                "description": "Nenhum provedor de IA configurado; este relatório é um exemplo."
            }],
            "recommendations": [{
                "title": "Revise seus gastos",
                "description": "Acompanhe as categorias com maior participação nas despesas.",
                "priority": "medium"
            }]
        });

        Ok(ProviderResponse {
            text: body.to_string(),
            model: self.model().to_string(),
            prompt_tokens: user_prompt.len() as i32 / 4,
            completion_tokens: 60,
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enabled_mock_returns_json_object() {
        let response = MockInsightProvider::new(true)
            .complete_json("system", "dados do mês")
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&response.text).unwrap();
        assert!(value["summary"].is_string());
        assert_eq!(response.model, "mock");
    }

    #[tokio::test]
    async fn disabled_mock_is_not_configured() {
        let err = MockInsightProvider::new(false)
            .complete_json("system", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
