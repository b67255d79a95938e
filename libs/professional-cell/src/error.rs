use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ProfessionalError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// The store rejected the caller's token.
    #[error("{0}")]
    Unauthorized(String),

    /// The backing store could not be read or written.
    #[error("Data store unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ProfessionalError {
    pub fn store(err: anyhow::Error) -> Self {
        if StoreError::is_unauthorized(&err) {
            return ProfessionalError::Unauthorized(err.to_string());
        }
        ProfessionalError::ServiceUnavailable(err.to_string())
    }
}

impl From<ProfessionalError> for AppError {
    fn from(err: ProfessionalError) -> Self {
        match err {
            ProfessionalError::InvalidRequest(msg) => AppError::BadRequest(msg),
            ProfessionalError::NotFound(msg) => AppError::NotFound(msg),
            ProfessionalError::Forbidden(msg) => AppError::Forbidden(msg),
            ProfessionalError::Unauthorized(msg) => AppError::Auth(msg),
            e @ ProfessionalError::ServiceUnavailable(_) => AppError::ServiceUnavailable(e.to_string()),
        }
    }
}
