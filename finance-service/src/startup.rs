//! Application startup and lifecycle management.

use crate::config::FinanceConfig;
use crate::handlers::{
    accounts, budgets, categories, debts, goals, health_check, imports, insights, investments,
    metrics_handler, profiles, readiness_check, transactions,
};
use crate::middleware::{auth_middleware, JwtValidator};
use crate::services::providers::{
    mock::MockInsightProvider,
    openai::{OpenAiConfig, OpenAiProvider},
    InsightProvider,
};
use crate::services::{init_metrics, scheduler, Database, InsightGenerator};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FinanceConfig>,
    pub db: Database,
    pub jwt: JwtValidator,
    pub insights: InsightGenerator,
}

/// Real provider when an API key is configured, otherwise the mock.
fn build_provider(config: &FinanceConfig) -> Result<Arc<dyn InsightProvider>, AppError> {
    match &config.llm.api_key {
        Some(api_key) => {
            let provider = OpenAiProvider::new(OpenAiConfig {
                api_key: api_key.clone(),
                base_url: config.llm.base_url.clone(),
                model: config.llm.model.clone(),
                timeout_seconds: config.llm.timeout_seconds,
            })
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to create LLM provider: {}", e))
            })?;
            tracing::info!(model = %config.llm.model, "Using OpenAI-compatible insight provider");
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("LLM_API_KEY not set - using mock insight provider");
            Ok(Arc::new(MockInsightProvider::new(true)))
        }
    }
}

fn cors_layer(config: &FinanceConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let insights_limiter = create_ip_rate_limiter(
        state.config.rate_limit.insights_limit,
        state.config.rate_limit.insights_window_seconds,
    );

    // Generating a report calls the LLM; limit it per client IP
    let generate_route = Router::new()
        .route("/insights/generate", post(insights::generate_insight))
        .layer(from_fn_with_state(insights_limiter, ip_rate_limit_middleware));

    let protected = Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(accounts::get_account)
                .patch(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/:id/invoice", get(accounts::get_invoice))
        .route("/accounts/:id/invoices", get(accounts::list_invoices))
        .route(
            "/accounts/:id/invoices/pay",
            post(accounts::pay_invoice).delete(accounts::unpay_invoice),
        )
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/summary", get(transactions::transaction_summary))
        .route("/transactions/by-category", get(transactions::by_category))
        .route(
            "/transactions/monthly-evolution",
            get(transactions::monthly_evolution),
        )
        .route("/transactions/import/ofx", post(imports::preview_ofx))
        .route("/transactions/import", post(imports::confirm_import))
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .patch(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/defaults",
            post(categories::seed_default_categories),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/budgets",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route(
            "/budgets/:id",
            get(budgets::get_budget)
                .patch(budgets::update_budget)
                .delete(budgets::delete_budget),
        )
        .route(
            "/investments",
            get(investments::list_investments).post(investments::create_investment),
        )
        .route("/investments/summary", get(investments::investment_summary))
        .route(
            "/investments/:id",
            get(investments::get_investment)
                .patch(investments::update_investment)
                .delete(investments::delete_investment),
        )
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/:id",
            get(goals::get_goal)
                .patch(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/goals/:id/contribute", post(goals::contribute))
        .route("/debts", get(debts::list_debts).post(debts::create_debt))
        .route("/debts/summary", get(debts::debt_summary))
        .route(
            "/debts/:id",
            get(debts::get_debt)
                .patch(debts::update_debt)
                .delete(debts::delete_debt),
        )
        .route("/debts/:id/pay", post(debts::pay_debt))
        .route("/debts/:id/payments", post(debts::register_payment))
        .route("/insights", get(insights::list_insights))
        .route("/insights/:year/:month", get(insights::get_insight))
        .route(
            "/insights/:id",
            axum::routing::delete(insights::delete_insight),
        )
        .merge(generate_route)
        .route(
            "/profiles/me",
            get(profiles::get_profile).patch(profiles::update_profile),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    sweep: Option<JoinHandle<()>>,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: FinanceConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: FinanceConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: FinanceConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let provider = build_provider(&config)?;
        let jwt = JwtValidator::new(&config.auth.jwt_secret, config.auth.audience.as_deref());
        let insights = InsightGenerator::new(db.clone(), provider);

        let sweep =
            scheduler::start_debt_sweep(db.clone(), config.scheduler.debt_sweep_interval_seconds);

        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Finance service listener bound");

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                db,
                jwt,
                insights,
            },
            sweep,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state.clone());

        tracing::info!(
            service = %self.state.config.service_name,
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        let result = axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;

        if let Some(sweep) = self.sweep {
            sweep.abort();
        }

        result.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
