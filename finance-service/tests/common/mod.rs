//! Common test utilities for finance-service integration tests.

#![allow(dead_code)]

use finance_service::config::{
    AuthConfig, DatabaseConfig, FinanceConfig, LlmConfig, RateLimitConfig, SchedulerConfig,
    SecurityConfig,
};
use finance_service::services::providers::mock::MockInsightProvider;
use finance_service::services::{Database, InsightGenerator};
use finance_service::middleware::JwtValidator;
use finance_service::startup::{AppState, Application};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;
use std::sync::{Arc, Once};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";
pub const AUDIENCE: &str = "authenticated";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,finance_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Configuration pointing at `database_url`, with the mock LLM unless
/// `llm_base_url` is given, and the debt sweep disabled.
pub fn test_config(database_url: String, llm_base_url: Option<String>) -> FinanceConfig {
    FinanceConfig {
        common: CommonConfig {
            port: 0,
            ..CommonConfig::default()
        },
        service_name: "finance-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: Secret::new(JWT_SECRET.to_string()),
            audience: Some(AUDIENCE.to_string()),
        },
        llm: LlmConfig {
            api_key: llm_base_url
                .as_ref()
                .map(|_| Secret::new("test-key".to_string())),
            base_url: llm_base_url.unwrap_or_else(|| "http://127.0.0.1:9".to_string()),
            model: "gpt-test".to_string(),
            timeout_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit: RateLimitConfig {
            insights_limit: 3,
            insights_window_seconds: 60,
        },
        scheduler: SchedulerConfig {
            debt_sweep_interval_seconds: 0,
        },
    }
}

/// Money fields serialize as strings; compare them numerically.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {}", other),
    }
}

/// Access token for `user_id`, signed like the hosted auth provider signs them.
pub fn mint_token(user_id: Uuid) -> String {
    mint_token_with(user_id, JWT_SECRET, 3600)
}

pub fn mint_token_with(user_id: Uuid, secret: &str, expires_in: i64) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "aud": AUDIENCE,
        "exp": chrono::Utc::now().timestamp() + expires_in,
        "email": "teste@example.com",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// State over a lazy pool that never connects; for router tests that
/// stop before the database.
pub fn offline_state() -> AppState {
    let config = test_config("postgres://localhost:5432/unused".to_string(), None);
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    let db = Database::from_pool(pool);

    AppState {
        jwt: JwtValidator::new(&config.auth.jwt_secret, config.auth.audience.as_deref()),
        insights: InsightGenerator::new(db.clone(), Arc::new(MockInsightProvider::new(true))),
        db,
        config: Arc::new(config),
    }
}

/// A running application plus an authenticated client for a fresh user.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub user_id: Uuid,
    pub token: String,
    pub client: reqwest::Client,
    pub db: Database,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Same server, different user.
    pub fn as_user(&self, user_id: Uuid) -> TestApp {
        TestApp {
            address: self.address.clone(),
            port: self.port,
            user_id,
            token: mint_token(user_id),
            client: self.client.clone(),
            db: self.db.clone(),
        }
    }

    pub async fn create_account(&self, body: Value) -> Value {
        let response = self.post("/accounts", &body).await;
        assert_eq!(response.status().as_u16(), 201, "create account failed");
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn create_category(&self, name: &str, category_type: &str) -> Value {
        let response = self
            .post(
                "/categories",
                &json!({ "name": name, "category_type": category_type }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "create category failed");
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn create_transactions(&self, body: Value) -> Vec<Value> {
        let response = self.post("/transactions", &body).await;
        assert_eq!(response.status().as_u16(), 201, "create transaction failed");
        response.json().await.expect("Failed to parse JSON")
    }
}

/// Spawn the application against `TEST_DATABASE_URL` with the mock LLM.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_llm(None).await
}

pub async fn spawn_app_with_llm(llm_base_url: Option<String>) -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run integration tests");

    let app = Application::build(test_config(database_url, llm_base_url))
        .await
        .expect("Failed to build application");

    let port = app.port();
    let db = app.db().clone();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let address = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // Wait for the listener to serve requests
    let mut attempts = 0;
    loop {
        match client.get(format!("{}/health", address)).send().await {
            Ok(_) => break,
            Err(_) if attempts < 20 => {
                attempts += 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }
            Err(e) => panic!("Server not ready after 20 attempts: {}", e),
        }
    }

    let user_id = Uuid::new_v4();
    TestApp {
        address,
        port,
        user_id,
        token: mint_token(user_id),
        client,
        db,
    }
}
