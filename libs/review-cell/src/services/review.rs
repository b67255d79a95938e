use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::{AppointmentBookingService, AppointmentStatus, Caller};
use professional_cell::RatingSummary;
use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};

use crate::error::ReviewError;
use crate::models::{CreateReviewRequest, ProfessionalReviews, Review};

pub struct ReviewService {
    supabase: Arc<SupabaseClient>,
    appointments: AppointmentBookingService,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            appointments: AppointmentBookingService::new(config),
        }
    }

    /// One review per completed appointment, written by its patient.
    pub async fn create_review(
        &self,
        appointment_id: Uuid,
        caller: Caller,
        request: CreateReviewRequest,
        auth_token: &str,
    ) -> Result<Review, ReviewError> {
        request.validate()?;

        let appointment = self.appointments
            .get_appointment(appointment_id, caller, auth_token)
            .await?;

        if appointment.patient_id != caller.id {
            warn!("User {} tried to review appointment {} as non-patient", caller.id, appointment_id);
            return Err(ReviewError::NotPatient);
        }
        if appointment.status != AppointmentStatus::Completed {
            return Err(ReviewError::NotCompleted);
        }

        let existing: Vec<Review> = self
            .fetch_rows(&format!("/rest/v1/reviews?appointment_id=eq.{}", appointment_id), Some(auth_token))
            .await?;
        if !existing.is_empty() {
            return Err(ReviewError::AlreadyReviewed);
        }

        let review_data = json!({
            "appointment_id": appointment_id,
            "patient_id": appointment.patient_id,
            "professional_id": appointment.professional_id,
            "rating": request.rating,
            "comment": request.comment.unwrap_or_default(),
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/reviews",
                Some(auth_token),
                Some(review_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| {
                if StoreError::is_conflict(&e) {
                    ReviewError::AlreadyReviewed
                } else {
                    ReviewError::store(e)
                }
            })?;

        let row = result.into_iter().next()
            .ok_or_else(|| ReviewError::ServiceUnavailable("Store returned no rows".to_string()))?;
        let review: Review = serde_json::from_value(row)
            .map_err(|e| ReviewError::ServiceUnavailable(format!("Malformed review row: {}", e)))?;

        info!("Review {} created for appointment {}", review.id, appointment_id);
        Ok(review)
    }

    pub async fn list_for_professional(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<ProfessionalReviews, ReviewError> {
        debug!("Fetching reviews of professional {}", professional_id);

        let reviews: Vec<Review> = self
            .fetch_rows(
                &format!("/rest/v1/reviews?professional_id=eq.{}&order=created_at.desc", professional_id),
                auth_token,
            )
            .await?;

        Ok(ProfessionalReviews {
            professional_id,
            rating: RatingSummary::from_ratings(reviews.iter().map(|r| r.rating)),
            reviews,
        })
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<T>, ReviewError> {
        let result: Vec<Value> = self.supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(ReviewError::store)?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| ReviewError::ServiceUnavailable(format!("Malformed review row: {}", e)))
    }
}
