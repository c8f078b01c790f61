//! Prometheus metrics for erp-service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec, TextEncoder};

/// Validated documents by kind (invoice, purchase, sale).
pub static DOCUMENTS_VALIDATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "erp_documents_validated_total",
        "Total number of validated documents by kind",
        &["kind"]
    )
    .expect("Failed to register documents_validated_total")
});

/// Stock movements by kind.
pub static STOCK_MOVEMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "erp_stock_movements_total",
        "Total number of stock movements by kind",
        &["kind"]
    )
    .expect("Failed to register stock_movements_total")
});

/// Remote backup operations by operation and outcome.
pub static BACKUP_OPERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "erp_backup_operations_total",
        "Total number of remote backup operations by outcome",
        &["operation", "outcome"] // push/pull, ok/not_found/failed
    )
    .expect("Failed to register backup_operations_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "erp_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DOCUMENTS_VALIDATED_TOTAL);
    Lazy::force(&STOCK_MOVEMENTS_TOTAL);
    Lazy::force(&BACKUP_OPERATIONS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

pub fn record_error(kind: &str) {
    ERRORS_TOTAL.with_label_values(&[kind]).inc();
}
