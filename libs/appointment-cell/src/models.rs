use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use professional_cell::ProfessionalError;
use shared_database::StoreError;
use shared_models::error::AppError;

pub use professional_cell::{AppointmentStatus, AppointmentType};

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "shared_utils::time_format")]
    pub time: NaiveTime,
    pub appointment_type: AppointmentType,
    pub price: f64,
    pub platform_fee: f64,
    pub professional_amount: f64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.professional_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "shared_utils::time_format")]
    pub time: NaiveTime,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    pub price: f64,
    pub notes: Option<String>,
    pub address: Option<String>,
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppointmentError::ValidationError(
                "Price must be greater than zero".to_string(),
            ));
        }

        let has_address = self.address.as_deref().is_some_and(|a| !a.trim().is_empty());
        if self.appointment_type.requires_address() && !has_address {
            return Err(AppointmentError::ValidationError(
                "Home visits require an address".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// PAYMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// How a consultation price is divided between the platform and the professional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeSplit {
    pub price: f64,
    pub platform_fee: f64,
    pub professional_amount: f64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment slot not available")]
    SlotNotAvailable,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Token rejected by the data store: {0}")]
    Unauthenticated(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Availability(#[from] ProfessionalError),
}

impl AppointmentError {
    pub fn store(err: anyhow::Error) -> Self {
        if StoreError::is_unauthorized(&err) {
            return AppointmentError::Unauthenticated(err.to_string());
        }
        AppointmentError::DatabaseError(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::SlotNotAvailable => {
                AppError::Conflict("Appointment slot no longer available".to_string())
            }
            e @ AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            AppointmentError::Unauthorized => {
                AppError::Forbidden("Not authorized to access this appointment".to_string())
            }
            AppointmentError::Unauthenticated(msg) => AppError::Auth(msg),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            e @ AppointmentError::DatabaseError(_) => AppError::ServiceUnavailable(e.to_string()),
            AppointmentError::Availability(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(appointment_type: AppointmentType, price: f64, address: Option<&str>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            professional_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            appointment_type,
            price,
            notes: None,
            address: address.map(str::to_string),
        }
    }

    #[test]
    fn test_price_must_be_positive() {
        assert_matches!(
            request(AppointmentType::Online, 0.0, None).validate(),
            Err(AppointmentError::ValidationError(_))
        );
        assert!(request(AppointmentType::Online, 80.0, None).validate().is_ok());
    }

    #[test]
    fn test_home_visit_needs_address() {
        assert_matches!(
            request(AppointmentType::HomeVisit, 200.0, Some("  ")).validate(),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("address")
        );
        assert!(request(AppointmentType::HomeVisit, 200.0, Some("Rua A, 10")).validate().is_ok());
    }

    #[test]
    fn test_book_request_defaults_to_online() {
        let parsed: BookAppointmentRequest = serde_json::from_value(serde_json::json!({
            "professional_id": Uuid::new_v4(),
            "date": "2030-01-07",
            "time": "14:30",
            "price": 120.0
        }))
        .unwrap();

        assert_eq!(parsed.appointment_type, AppointmentType::Online);
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }

    #[test]
    fn test_error_status_mapping() {
        use axum::http::StatusCode;

        let conflict: AppError = AppointmentError::SlotNotAvailable.into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let transition: AppError = AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Pending,
        }
        .into();
        assert_eq!(transition.status_code(), StatusCode::BAD_REQUEST);

        let store: AppError = AppointmentError::DatabaseError("timeout".to_string()).into();
        assert_eq!(store.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let rejected: AppError = AppointmentError::store(
            StoreError::Unauthorized("JWT expired".to_string()).into(),
        )
        .into();
        assert_eq!(rejected.status_code(), StatusCode::UNAUTHORIZED);

        let missing: AppError = AppointmentError::Availability(
            ProfessionalError::NotFound("Professional not found".to_string()),
        )
        .into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }
}
