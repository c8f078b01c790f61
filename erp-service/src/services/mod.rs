pub mod backup;
pub mod error;
pub mod fleet;
pub mod ids;
pub mod invoicing;
pub mod journal;
pub mod ledger;
pub mod metrics;
pub mod pos;
pub mod purchasing;
pub mod reports;
pub mod scoring;
pub mod sequence;
pub mod stock;
pub mod store;
pub mod support;
pub mod valuation;

pub use backup::{BackupError, BackupService, BackupStore, PullOutcome, RestBackupStore};
pub use error::{ServiceError, ServiceResult};
pub use store::{FileStateStore, StateStore};
