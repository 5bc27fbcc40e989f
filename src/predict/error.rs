use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid tle: {0}")]
    InvalidTle(String),
    #[error("invalid observer: {0}")]
    InvalidObserver(String),
    #[error("propagation error: {0}")]
    Propagation(String),
}

impl From<sgp4::TleError> for PredictError {
    fn from(err: sgp4::TleError) -> Self {
        PredictError::InvalidTle(err.to_string())
    }
}

impl From<sgp4::ElementsError> for PredictError {
    fn from(err: sgp4::ElementsError) -> Self {
        PredictError::InvalidTle(err.to_string())
    }
}

impl From<sgp4::Error> for PredictError {
    fn from(err: sgp4::Error) -> Self {
        PredictError::Propagation(err.to_string())
    }
}
