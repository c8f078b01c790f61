//! Best-effort remote backup of the state document.
//!
//! One JSON blob per owner in a PostgREST-style `backups(user_id, data_blob,
//! updated_at)` table. Failures are logged and reported as a plain outcome;
//! they never reach the local store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::retry::{retry_async, RetryConfig, Retryable};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::metrics::{record_error, BACKUP_OPERATIONS_TOTAL};
use super::store::StateStore;
use crate::config::BackupConfig;
use crate::models::StateDocument;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backup request timed out")]
    Timeout,

    #[error("Backup table is missing on the remote side")]
    SchemaMissing,

    #[error("Backup credentials rejected")]
    Unauthorized,

    #[error("Remote error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Backup payload could not be decoded: {0}")]
    Decode(String),
}

impl BackupError {
    pub fn kind(&self) -> &'static str {
        match self {
            BackupError::Network(_) => "backup_network",
            BackupError::Timeout => "backup_timeout",
            BackupError::SchemaMissing => "backup_schema_missing",
            BackupError::Unauthorized => "backup_unauthorized",
            BackupError::Remote { .. } => "backup_remote",
            BackupError::Decode(_) => "backup_decode",
        }
    }
}

impl Retryable for BackupError {
    fn is_retryable(&self) -> bool {
        match self {
            BackupError::Network(_) | BackupError::Timeout => true,
            BackupError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BackupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackupError::Timeout
        } else if err.is_decode() {
            BackupError::Decode(err.to_string())
        } else {
            BackupError::Network(err.to_string())
        }
    }
}

/// Blob store keyed by an opaque owner id.
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn upsert(&self, owner_id: &str, blob: &Value, updated_at: DateTime<Utc>) -> Result<(), BackupError>;
    async fn fetch(&self, owner_id: &str) -> Result<Option<Value>, BackupError>;
}

#[derive(Debug, Serialize)]
struct BackupRow<'a> {
    user_id: &'a str,
    data_blob: &'a Value,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct BlobRow {
    data_blob: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
}

/// PostgREST error codes for "relation does not exist".
const MISSING_TABLE_CODES: [&str; 2] = ["42P01", "PGRST205"];
/// PostgREST code for "no row" on single-object requests.
const NO_ROWS_CODE: &str = "PGRST116";

#[derive(Clone)]
pub struct RestBackupStore {
    client: Client,
    base_url: String,
    table: String,
    api_key: Option<Secret<String>>,
}

impl RestBackupStore {
    pub fn new(
        base_url: &str,
        table: &str,
        api_key: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self, BackupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request
                .header("apikey", key.expose_secret())
                .bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    fn classify(status: StatusCode, body: String) -> BackupError {
        let code = serde_json::from_str::<PostgrestError>(&body)
            .ok()
            .and_then(|e| e.code);
        if code.as_deref().is_some_and(|c| MISSING_TABLE_CODES.contains(&c)) {
            return BackupError::SchemaMissing;
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackupError::Unauthorized,
            StatusCode::NOT_FOUND => BackupError::SchemaMissing,
            _ => BackupError::Remote {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
impl BackupStore for RestBackupStore {
    async fn upsert(&self, owner_id: &str, blob: &Value, updated_at: DateTime<Utc>) -> Result<(), BackupError> {
        let row = BackupRow {
            user_id: owner_id,
            data_blob: blob,
            updated_at,
        };
        let response = self
            .authorize(self.client.post(self.url()))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::classify(status, body))
    }

    async fn fetch(&self, owner_id: &str) -> Result<Option<Value>, BackupError> {
        let owner_filter = format!("eq.{owner_id}");
        let response = self
            .authorize(self.client.get(self.url()))
            .query(&[("select", "data_blob"), ("user_id", owner_filter.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let no_rows = serde_json::from_str::<PostgrestError>(&body)
                .ok()
                .and_then(|e| e.code)
                .is_some_and(|c| c == NO_ROWS_CODE);
            if no_rows {
                return Ok(None);
            }
            return Err(Self::classify(status, body));
        }

        let rows: Vec<BlobRow> =
            serde_json::from_str(&body).map_err(|e| BackupError::Decode(e.to_string()))?;
        Ok(rows.into_iter().next().and_then(|r| r.data_blob))
    }
}

#[derive(Debug)]
pub enum PullOutcome {
    Restored(Box<StateDocument>),
    NotFound,
    Failed,
}

/// Push/pull on top of a [`BackupStore`] with bounded retry of transient
/// failures. Errors stop here.
#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn BackupStore>,
    retry: RetryConfig,
}

impl BackupService {
    pub fn new(store: Arc<dyn BackupStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// `None` when no endpoint is configured or the HTTP client cannot be built.
    pub fn from_config(config: &BackupConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?;
        let store = match RestBackupStore::new(
            endpoint,
            &config.table,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        ) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Remote backup disabled");
                return None;
            }
        };
        let retry = RetryConfig {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            ..RetryConfig::default()
        };
        Some(Self::new(Arc::new(store), retry))
    }

    fn record(operation: &str, outcome: &str) {
        BACKUP_OPERATIONS_TOTAL
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Mirrors the document to the remote store. Returns whether it was stored.
    #[instrument(skip(self, doc), fields(revision = doc.revision))]
    pub async fn push(&self, doc: &StateDocument, owner_id: &str) -> bool {
        let blob = match serde_json::to_value(doc) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Could not serialize state document for backup");
                Self::record("push", "failed");
                return false;
            }
        };
        let now = Utc::now();
        let result = retry_async(&self.retry, "backup_push", || {
            self.store.upsert(owner_id, &blob, now)
        })
        .await;

        match result {
            Ok(()) => {
                info!(owner_id = %owner_id, "State document backed up");
                Self::record("push", "ok");
                true
            }
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, kind = e.kind(), "Remote backup failed");
                record_error(e.kind());
                Self::record("push", "failed");
                false
            }
        }
    }

    /// Fetches the owner's backup. Never writes locally.
    #[instrument(skip(self))]
    pub async fn pull(&self, owner_id: &str) -> PullOutcome {
        let result = retry_async(&self.retry, "backup_pull", || self.store.fetch(owner_id)).await;
        let blob = match result {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!(owner_id = %owner_id, "No remote backup for owner");
                Self::record("pull", "not_found");
                return PullOutcome::NotFound;
            }
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, kind = e.kind(), "Remote restore failed");
                record_error(e.kind());
                Self::record("pull", "failed");
                return PullOutcome::Failed;
            }
        };

        match serde_json::from_value::<StateDocument>(blob) {
            Ok(mut doc) => {
                doc.normalize();
                Self::record("pull", "ok");
                PullOutcome::Restored(Box::new(doc))
            }
            Err(e) => {
                let e = BackupError::Decode(e.to_string());
                warn!(owner_id = %owner_id, error = %e, "Remote backup is not a valid state document");
                record_error(e.kind());
                Self::record("pull", "failed");
                PullOutcome::Failed
            }
        }
    }

    /// Pulls and, on success, overwrites the local document. Only ever
    /// called on explicit request.
    #[instrument(skip(self, local))]
    pub async fn restore(&self, owner_id: &str, local: &dyn StateStore) -> bool {
        match self.pull(owner_id).await {
            PullOutcome::Restored(doc) => match local.save(&doc) {
                Ok(()) => {
                    info!(owner_id = %owner_id, "Local state replaced from backup");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Could not write restored document");
                    false
                }
            },
            PullOutcome::NotFound | PullOutcome::Failed => false,
        }
    }
}
