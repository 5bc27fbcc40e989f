use thiserror::Error;

use crate::mailer::TransportError;
use crate::predict::PredictError;
use crate::scheduler::StoreError;

/// Errors surfaced by [`crate::service::PassService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before any propagation or persistence work happened.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("notification not found: {0}")]
    NotFound(i64),
    #[error("persistence failure: {0}")]
    PersistenceFailure(StoreError),
}

impl From<PredictError> for ServiceError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::InvalidTle(_) | PredictError::InvalidObserver(_) => {
                ServiceError::InvalidInput(e.to_string())
            }
            PredictError::Propagation(_) => ServiceError::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::PersistenceFailure(other),
        }
    }
}

impl From<TransportError> for ServiceError {
    fn from(e: TransportError) -> Self {
        ServiceError::UpstreamUnavailable(e.to_string())
    }
}
