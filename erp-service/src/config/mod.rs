//! Configuration module for erp-service.
//!
//! Values come from an optional `configuration.{toml,yaml,json}` file, then
//! `ERP__SECTION__KEY` environment variables. Every field has a default.

use rust_decimal::Decimal;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::load_layered;
use service_core::error::AppError;

pub const CONFIG_FILE_STEM: &str = "configuration";
pub const ENV_PREFIX: &str = "ERP";

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ErpConfig {
    pub service_name: String,
    pub log_level: String,
    pub log_json: bool,
    pub storage: StorageConfig,
    pub backup: BackupConfig,
    pub stock: StockConfig,
    pub scoring: ScoringConfig,
    pub support: SupportConfig,
    pub reports: ReportsConfig,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            service_name: "erp-service".to_string(),
            log_level: "info".to_string(),
            log_json: true,
            storage: StorageConfig::default(),
            backup: BackupConfig::default(),
            stock: StockConfig::default(),
            scoring: ScoringConfig::default(),
            support: SupportConfig::default(),
            reports: ReportsConfig::default(),
        }
    }
}

impl ErpConfig {
    pub fn load() -> Result<Self, AppError> {
        load_layered(CONFIG_FILE_STEM, ENV_PREFIX)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StorageConfig {
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: "erp-state.json".to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BackupConfig {
    /// Base URL of the PostgREST-style API. Backup is disabled when unset.
    pub endpoint: Option<String>,
    pub api_key: Option<Secret<String>>,
    pub table: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            table: "backups".to_string(),
            timeout_secs: 10,
            max_retries: 2,
            initial_backoff_ms: 200,
        }
    }
}

/// What validation does when a line asks for more than is on hand.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Let stock go negative and log a warning.
    #[default]
    Permissive,
    /// Reject with `InsufficientStock`.
    Strict,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct StockConfig {
    pub policy: StockPolicy,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ScoringConfig {
    pub vip_threshold: f64,
    pub gold_threshold: f64,
    pub reactivation_days: i64,
    pub recency_days: i64,
    pub recency_bonus: f64,
    pub revenue_divisor: Decimal,
    pub order_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            vip_threshold: 1000.0,
            gold_threshold: 400.0,
            reactivation_days: 180,
            recency_days: 30,
            recency_bonus: 50.0,
            revenue_divisor: Decimal::ONE_HUNDRED,
            order_weight: 10.0,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct SupportConfig {
    pub sla_hours: SlaHours,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SlaHours {
    pub critical: i64,
    pub high: i64,
    pub standard: i64,
}

impl Default for SlaHours {
    fn default() -> Self {
        Self {
            critical: 2,
            high: 8,
            standard: 48,
        }
    }
}

/// Thresholds behind the insights attached to the financial summary.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ReportsConfig {
    /// Fuel cost per km above which the fleet is flagged.
    pub max_cost_per_km: Decimal,
    /// Ticket resolution rate, in percent, below which support is flagged.
    pub min_resolution_rate: Decimal,
    pub revenue_target: Decimal,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            max_cost_per_km: Decimal::from(15),
            min_resolution_rate: Decimal::from(50),
            revenue_target: Decimal::from(50_000),
        }
    }
}
