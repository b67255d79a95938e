use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::time_format::format_hhmm;

use crate::error::ProfessionalError;
use crate::models::{AvailabilityWindow, BookedAppointment, CreateAvailabilityRequest};

/// Reads and writes the availability window store, plus the read-only ledger view
/// the slot generator needs.
pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Create an availability window. Overlapping windows are allowed.
    pub async fn create_window(
        &self,
        professional_id: Uuid,
        request: CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, ProfessionalError> {
        debug!("Creating availability window for professional: {}", professional_id);
        request.validate()?;

        let window_data = json!({
            "professional_id": professional_id,
            "day_of_week": request.day_of_week,
            "start_time": format_hhmm(&request.start_time),
            "end_time": format_hhmm(&request.end_time),
            "is_active": request.is_active.unwrap_or(true),
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/availabilities",
                Some(auth_token),
                Some(window_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(ProfessionalError::store)?;

        let window: AvailabilityWindow = first_row(result, "Failed to create availability window")?;
        info!("Availability window {} created for professional {}", window.id, professional_id);
        Ok(window)
    }

    /// Active windows of a professional, ordered by weekday then start.
    pub async fn list_windows(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<AvailabilityWindow>, ProfessionalError> {
        debug!("Fetching availability windows for professional: {}", professional_id);

        let path = format!(
            "/rest/v1/availabilities?professional_id=eq.{}&is_active=eq.true&order=day_of_week.asc,start_time.asc",
            professional_id
        );
        self.fetch_rows(&path, auth_token).await
    }

    pub async fn windows_for_day(
        &self,
        professional_id: Uuid,
        day_of_week: i32,
        auth_token: Option<&str>,
    ) -> Result<Vec<AvailabilityWindow>, ProfessionalError> {
        let path = format!(
            "/rest/v1/availabilities?professional_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&order=start_time.asc",
            professional_id, day_of_week
        );
        self.fetch_rows(&path, auth_token).await
    }

    /// Appointments that still hold a time on `date`.
    pub async fn bookings_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<BookedAppointment>, ProfessionalError> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&date=eq.{}&status=neq.cancelled&select=id,professional_id,date,time,status&order=time.asc",
            professional_id,
            date.format("%Y-%m-%d")
        );
        self.fetch_rows(&path, auth_token).await
    }

    pub async fn set_window_active(
        &self,
        window_id: Uuid,
        requester_id: Uuid,
        is_active: bool,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, ProfessionalError> {
        self.owned_window(window_id, requester_id, auth_token).await?;

        let path = format!("/rest/v1/availabilities?id=eq.{}", window_id);
        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_active": is_active })),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(ProfessionalError::store)?;

        first_row(result, "Failed to update availability window")
    }

    pub async fn delete_window(
        &self,
        window_id: Uuid,
        requester_id: Uuid,
        auth_token: &str,
    ) -> Result<(), ProfessionalError> {
        debug!("Deleting availability window: {}", window_id);
        self.owned_window(window_id, requester_id, auth_token).await?;

        let path = format!("/rest/v1/availabilities?id=eq.{}", window_id);
        let _: Vec<Value> = self.supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(ProfessionalError::store)?;

        info!("Availability window {} deleted", window_id);
        Ok(())
    }

    // Private helper methods

    async fn owned_window(
        &self,
        window_id: Uuid,
        requester_id: Uuid,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, ProfessionalError> {
        let path = format!("/rest/v1/availabilities?id=eq.{}", window_id);
        let windows: Vec<AvailabilityWindow> = self.fetch_rows(&path, Some(auth_token)).await?;

        let window = windows.into_iter().next()
            .ok_or_else(|| ProfessionalError::NotFound("Availability window not found".to_string()))?;

        if window.professional_id != requester_id {
            warn!("User {} tried to modify availability window {} they do not own", requester_id, window_id);
            return Err(ProfessionalError::Forbidden(
                "You do not have permission to modify this availability window".to_string(),
            ));
        }

        Ok(window)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<T>, ProfessionalError> {
        let result: Vec<Value> = self.supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(ProfessionalError::store)?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| ProfessionalError::ServiceUnavailable(format!("Malformed row: {}", e)))
    }
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>, missing: &str) -> Result<T, ProfessionalError> {
    let row = rows.into_iter().next()
        .ok_or_else(|| ProfessionalError::ServiceUnavailable(missing.to_string()))?;
    serde_json::from_value(row)
        .map_err(|e| ProfessionalError::ServiceUnavailable(format!("Malformed row: {}", e)))
}
