use rust_decimal::Decimal;
use service_core::error::AppError;
use thiserror::Error;

/// Domain failures. Every variant is raised before the document is touched.
#[derive(Error, Debug, PartialEq)]
pub enum ServiceError {
    #[error("Document has no lines")]
    EmptyDocument,

    #[error("Document has no {0}")]
    MissingParty(&'static str),

    #[error("Document {0} is already validated")]
    AlreadyValidated(String),

    #[error("Document {0} is not a draft")]
    NotDraft(String),

    #[error("Transition from {from} to {to} is not allowed")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("A reason is required")]
    MissingReason,

    #[error("Line {0} not found")]
    LineNotFound(String),

    #[error("Document {0} not found")]
    DocumentNotFound(String),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Discount {requested} exceeds the {limit_percent}% limit of {role}")]
    DiscountLimitExceeded {
        role: String,
        requested: Decimal,
        limit_percent: Decimal,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::EmptyDocument => "empty_document",
            ServiceError::MissingParty(_) => "missing_party",
            ServiceError::AlreadyValidated(_) => "already_validated",
            ServiceError::NotDraft(_) => "not_draft",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::MissingReason => "missing_reason",
            ServiceError::LineNotFound(_) => "line_not_found",
            ServiceError::DocumentNotFound(_) => "document_not_found",
            ServiceError::ProductNotFound(_) => "product_not_found",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::DiscountLimitExceeded { .. } => "discount_limit_exceeded",
            ServiceError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::LineNotFound(_)
            | ServiceError::DocumentNotFound(_)
            | ServiceError::ProductNotFound(_) => AppError::NotFound(anyhow::anyhow!(err)),
            ServiceError::AlreadyValidated(_)
            | ServiceError::NotDraft(_)
            | ServiceError::InvalidTransition { .. }
            | ServiceError::InsufficientStock { .. } => AppError::Conflict(anyhow::anyhow!(err)),
            ServiceError::EmptyDocument
            | ServiceError::MissingParty(_)
            | ServiceError::MissingReason
            | ServiceError::DiscountLimitExceeded { .. }
            | ServiceError::InvalidInput(_) => AppError::BadRequest(anyhow::anyhow!(err)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
