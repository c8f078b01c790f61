//! erp-service: computation core of a small-business back office.
//!
//! Pure operations over a single [`models::StateDocument`], a file-backed
//! [`services::StateStore`] and a best-effort remote backup.
pub mod config;
pub mod models;
pub mod services;
