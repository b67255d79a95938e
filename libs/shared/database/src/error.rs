use thiserror::Error;

/// Non-success PostgREST responses, carried inside the `anyhow::Error`
/// returned by `SupabaseClient`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl StoreError {
    pub fn of(err: &anyhow::Error) -> Option<&StoreError> {
        err.downcast_ref::<StoreError>()
    }

    pub fn is_conflict(err: &anyhow::Error) -> bool {
        matches!(Self::of(err), Some(StoreError::Conflict(_)))
    }

    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        matches!(Self::of(err), Some(StoreError::Unauthorized(_)))
    }
}
