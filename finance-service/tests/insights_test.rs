//! Insight generation integration tests, with the mock provider and with
//! an OpenAI-compatible endpoint served by wiremock.

mod common;

use common::{money, spawn_app, spawn_app_with_llm};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
#[ignore] // Requires database
async fn month_without_transactions_is_bad_request() {
    let app = spawn_app().await;

    let response = app
        .post("/insights/generate", &json!({ "month": 1, "year": 2024 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore]
async fn report_is_generated_then_served_from_cache() {
    let app = spawn_app().await;
    app.create_transactions(json!({
        "amount": "4000.00",
        "transaction_type": "income",
        "date": "2024-03-05"
    }))
    .await;
    app.create_transactions(json!({
        "amount": "250.00",
        "transaction_type": "expense",
        "description": "Supermercado",
        "date": "2024-03-09"
    }))
    .await;

    let response = app
        .post("/insights/generate", &json!({ "month": 3, "year": 2024 }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["model"], "mock");
    assert_eq!(money(&first["balance"]), dec!(3750));
    assert_eq!(first["transaction_count"], 2);
    assert_eq!(
        first["report"]["top_categories"][0]["name"],
        "Sem categoria"
    );

    let response = app
        .post("/insights/generate", &json!({ "month": 3, "year": 2024 }))
        .await;
    let cached: Value = response.json().await.unwrap();
    assert_eq!(cached["insight_id"], first["insight_id"]);
    assert_eq!(cached["created_utc"], first["created_utc"]);

    let response = app.get("/insights/2024/3").await;
    assert_eq!(response.status().as_u16(), 200);

    let history: Vec<Value> = app.get("/insights").await.json().await.unwrap();
    assert_eq!(history.len(), 1);

    let response = app
        .delete(&format!("/insights/{}", first["insight_id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(app.get("/insights/2024/3").await.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn forced_generation_uses_provider_answer() {
    let server = MockServer::start().await;
    let report = json!({
        "summary": "Mês equilibrado.",
        "insights": [{ "type": "positive", "title": "Saldo positivo", "description": "Receitas superaram despesas." }],
        "recommendations": [{ "title": "Invista a sobra", "description": "Reserve 10%.", "priority": "high" }]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-test",
            "choices": [{ "message": { "role": "assistant", "content": report.to_string() } }],
            "usage": { "prompt_tokens": 321, "completion_tokens": 123 }
        })))
        .mount(&server)
        .await;

    let app = spawn_app_with_llm(Some(server.uri())).await;
    app.create_transactions(json!({
        "amount": "80.00",
        "transaction_type": "expense",
        "date": "2024-04-02"
    }))
    .await;

    let response = app
        .post(
            "/insights/generate",
            &json!({ "month": 4, "year": 2024, "force": true }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let insight: Value = response.json().await.unwrap();
    assert_eq!(insight["report"]["summary"], "Mês equilibrado.");
    assert_eq!(insight["report"]["recommendations"][0]["priority"], "high");
    assert_eq!(insight["prompt_tokens"], 321);
    assert_eq!(insight["completion_tokens"], 123);
}

#[tokio::test]
#[ignore]
async fn provider_rate_limit_maps_to_busy_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let app = spawn_app_with_llm(Some(server.uri())).await;
    app.create_transactions(json!({
        "amount": "80.00",
        "transaction_type": "expense",
        "date": "2024-05-02"
    }))
    .await;

    let response = app
        .post("/insights/generate", &json!({ "month": 5, "year": 2024 }))
        .await;
    assert_eq!(response.status().as_u16(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "AI service is busy, please try again in a few minutes"
    );
}

#[tokio::test]
#[ignore]
async fn provider_failure_maps_to_generic_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let app = spawn_app_with_llm(Some(server.uri())).await;
    app.create_transactions(json!({
        "amount": "80.00",
        "transaction_type": "expense",
        "date": "2024-06-02"
    }))
    .await;

    let response = app
        .post("/insights/generate", &json!({ "month": 6, "year": 2024 }))
        .await;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to generate insights");
}
