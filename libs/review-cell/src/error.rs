use thiserror::Error;

use appointment_cell::AppointmentError;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Only the patient of an appointment can review it")]
    NotPatient,

    #[error("Only completed appointments can be reviewed")]
    NotCompleted,

    #[error("This appointment has already been reviewed")]
    AlreadyReviewed,

    #[error("Token rejected by the data store: {0}")]
    Unauthorized(String),

    #[error("Data store unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}

impl ReviewError {
    pub fn store(err: anyhow::Error) -> Self {
        if StoreError::is_unauthorized(&err) {
            return ReviewError::Unauthorized(err.to_string());
        }
        ReviewError::ServiceUnavailable(err.to_string())
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidRequest(msg) => AppError::BadRequest(msg),
            e @ ReviewError::NotPatient => AppError::Forbidden(e.to_string()),
            e @ ReviewError::NotCompleted => AppError::BadRequest(e.to_string()),
            e @ ReviewError::AlreadyReviewed => AppError::Conflict(e.to_string()),
            ReviewError::Unauthorized(msg) => AppError::Auth(msg),
            e @ ReviewError::ServiceUnavailable(_) => AppError::ServiceUnavailable(e.to_string()),
            ReviewError::Appointment(e) => e.into(),
        }
    }
}
