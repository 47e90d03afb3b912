//! Prometheus metrics for finance-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

/// Histogram for database query duration by operation.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "finance_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Counter for created transactions by kind (single, installment, recurring, import).
pub static TRANSACTIONS_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "finance_transactions_created_total",
        "Total number of transaction rows created",
        &["kind"]
    )
    .expect("Failed to register TRANSACTIONS_CREATED")
});

/// Counter for insight generations by outcome.
pub static INSIGHTS_GENERATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "finance_insights_generated_total",
        "Total number of insight generation attempts",
        &["status"]
    )
    .expect("Failed to register INSIGHTS_GENERATED")
});

/// Counter for OFX uploads by outcome.
pub static OFX_IMPORTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "finance_ofx_imports_total",
        "Total number of OFX statement uploads",
        &["status"]
    )
    .expect("Failed to register OFX_IMPORTS")
});

/// Debts flipped to overdue by the sweep.
pub static OVERDUE_DEBTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "finance_overdue_debts_total",
        "Total number of debts marked overdue by the scheduler"
    )
    .expect("Failed to register OVERDUE_DEBTS")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "finance_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&TRANSACTIONS_CREATED);
    Lazy::force(&INSIGHTS_GENERATED);
    Lazy::force(&OFX_IMPORTS);
    Lazy::force(&OVERDUE_DEBTS);
    Lazy::force(&ERRORS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_transactions_created(kind: &str, count: usize) {
    TRANSACTIONS_CREATED
        .with_label_values(&[kind])
        .inc_by(count as f64);
}

pub fn record_insight_generation(status: &str) {
    INSIGHTS_GENERATED.with_label_values(&[status]).inc();
}

pub fn record_ofx_import(status: &str) {
    OFX_IMPORTS.with_label_values(&[status]).inc();
}

pub fn record_overdue_debts(count: u64) {
    OVERDUE_DEBTS.inc_by(count);
}

/// Record an error.
pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}
