pub mod package;
pub mod payment;
pub mod rates;
pub mod repository;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Selection is empty")]
    EmptySelection,
    #[error("Package {0} already belongs to a consolidation")]
    PackageAlreadyGrouped(Uuid),
    #[error("Package {0} is not available for consolidation")]
    PackageNotAvailable(Uuid),
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),
    #[error("Payment failed: {0}")]
    PaymentFailed(String),
    #[error("Package {0} already has an active protection policy")]
    PolicyAlreadyActive(Uuid),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
