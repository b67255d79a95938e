use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::ProfessionalError;
use crate::models::{AppointmentType, AvailableSlotsQuery, AvailableSlotsResponse};
use crate::services::{
    availability::AvailabilityService,
    professional::ProfessionalService,
    slots::{day_of_week, generate_slots},
};

/// Validates a slot request, loads both datasets, then runs the generator.
/// Nothing is computed unless every read succeeded.
pub struct SlotQueryService {
    availability: AvailabilityService,
    professionals: ProfessionalService,
    today: NaiveDate,
}

impl SlotQueryService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            availability: AvailabilityService::with_client(supabase.clone()),
            professionals: ProfessionalService::with_client(supabase),
            today: config.today(),
        }
    }

    pub async fn get_available_slots(
        &self,
        professional_id: &str,
        query: AvailableSlotsQuery,
        auth_token: Option<&str>,
    ) -> Result<AvailableSlotsResponse, ProfessionalError> {
        let date = parse_query_date(query.date.as_deref(), self.today)?;
        let appointment_type = query.appointment_type
            .as_deref()
            .map(str::parse::<AppointmentType>)
            .transpose()?
            .unwrap_or_default();
        let professional_id = Uuid::parse_str(professional_id)
            .map_err(|_| ProfessionalError::InvalidRequest("Invalid professional id".to_string()))?;

        debug!("Calculating available slots for professional {} on {}", professional_id, date);

        let professional = self.professionals.get_professional(professional_id, auth_token).await?;
        let slot_duration = professional.effective_slot_duration()?;
        let weekday = day_of_week(date);

        let (windows, booked) = tokio::try_join!(
            self.availability.windows_for_day(professional_id, weekday, auth_token),
            self.availability.bookings_for_date(professional_id, date, auth_token),
        )?;

        let slots = generate_slots(date, weekday, slot_duration, &windows, &booked);
        debug!(
            "Found {} free slots from {} windows and {} bookings",
            slots.len(), windows.len(), booked.len()
        );

        Ok(AvailableSlotsResponse {
            professional_id,
            date,
            appointment_type,
            slot_duration,
            total_slots: slots.len(),
            slots,
        })
    }
}

/// Requires an ISO calendar date no earlier than `today`.
pub fn parse_query_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ProfessionalError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProfessionalError::InvalidRequest("Date is required".to_string()))?;

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ProfessionalError::InvalidRequest("Invalid date format. Use YYYY-MM-DD".to_string()))?;

    if date < today {
        warn!("Rejected slot request for past date {}", date);
        return Err(ProfessionalError::InvalidRequest("Date must not be in the past".to_string()));
    }

    Ok(date)
}
