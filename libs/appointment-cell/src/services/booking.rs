use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use professional_cell::{AvailableSlotsQuery, SlotQueryService, SlotTime};
use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};
use shared_models::auth::User;
use shared_utils::time_format::format_hhmm;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, Payment,
    PaymentStatus,
};
use crate::services::{lifecycle::AppointmentLifecycleService, pricing::PricingService};

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    slot_query: SlotQueryService,
    pricing: PricingService,
    lifecycle: AppointmentLifecycleService,
}

/// The caller as seen by appointment access rules.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: Uuid,
    pub is_professional: bool,
    pub is_admin: bool,
}

impl Caller {
    pub fn from_user(user: &User) -> Result<Self, AppointmentError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppointmentError::ValidationError("Invalid user id in token".to_string()))?;
        Ok(Self {
            id,
            is_professional: user.is_professional(),
            is_admin: user.is_admin(),
        })
    }
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            slot_query: SlotQueryService::new(config),
            pricing: PricingService::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a free slot for `patient_id`, re-checking availability first.
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking {} at {} {} for patient {}",
            request.professional_id, request.date, format_hhmm(&request.time), patient_id
        );
        request.validate()?;

        if patient_id == request.professional_id {
            return Err(AppointmentError::ValidationError(
                "Professionals cannot book appointments with themselves".to_string(),
            ));
        }

        let free = self.slot_query
            .get_available_slots(
                &request.professional_id.to_string(),
                AvailableSlotsQuery {
                    date: Some(request.date.format("%Y-%m-%d").to_string()),
                    appointment_type: Some(request.appointment_type.to_string()),
                },
                Some(auth_token),
            )
            .await?;

        if !free.slots.contains(&SlotTime::from(request.time)) {
            warn!(
                "Slot {} on {} is not free for professional {}",
                format_hhmm(&request.time), request.date, request.professional_id
            );
            return Err(AppointmentError::SlotNotAvailable);
        }

        let split = self.pricing.split(request.price);
        let now = Utc::now().to_rfc3339();

        let appointment_data = json!({
            "patient_id": patient_id,
            "professional_id": request.professional_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "time": format_hhmm(&request.time),
            "appointment_type": request.appointment_type,
            "price": split.price,
            "platform_fee": split.platform_fee,
            "professional_amount": split.professional_amount,
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "address": request.address,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| {
                // The store's uniqueness constraint catches the race the re-check cannot.
                if StoreError::is_conflict(&e) {
                    AppointmentError::SlotNotAvailable
                } else {
                    AppointmentError::store(e)
                }
            })?;

        let appointment: Appointment = first_row(result)?;

        let payment_data = json!({
            "appointment_id": appointment.id,
            "amount": split.price,
            "status": PaymentStatus::Pending,
            "created_at": now
        });

        let payment: Result<Vec<Value>, _> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/payments",
                Some(auth_token),
                Some(payment_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await;

        if let Err(e) = payment {
            error!("Payment record for appointment {} failed: {}", appointment.id, e);
            self.discard_appointment(appointment.id, auth_token).await;
            return Err(AppointmentError::store(e));
        }

        info!("Appointment {} booked with professional {}", appointment.id, appointment.professional_id);
        Ok(appointment)
    }

    /// Professionals see their agenda; everyone else sees what they booked.
    pub async fn list_appointments(
        &self,
        caller: Caller,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let column = if caller.is_professional { "professional_id" } else { "patient_id" };
        let path = format!(
            "/rest/v1/appointments?{}=eq.{}&order=date.asc,time.asc",
            column, caller.id
        );
        self.fetch_rows(&path, auth_token).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        caller: Caller,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let appointment = self.fetch_rows::<Appointment>(&path, auth_token).await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)?;

        if !caller.is_admin && !appointment.is_participant(caller.id) {
            warn!("User {} tried to read appointment {}", caller.id, appointment_id);
            return Err(AppointmentError::Unauthorized);
        }

        Ok(appointment)
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        caller: Caller,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, caller, auth_token).await?;

        if self.lifecycle.requires_professional(new_status)
            && !caller.is_admin
            && appointment.professional_id != caller.id
        {
            return Err(AppointmentError::Unauthorized);
        }

        self.lifecycle.validate_status_transition(appointment.status, new_status)?;

        let updated = self.write_status(appointment_id, new_status, auth_token).await?;

        let payment_status = match new_status {
            AppointmentStatus::Confirmed => Some(PaymentStatus::Paid),
            AppointmentStatus::Cancelled => Some(PaymentStatus::Refunded),
            _ => None,
        };

        if let Some(payment_status) = payment_status {
            if let Err(e) = self.set_payment_status(appointment_id, payment_status, auth_token).await {
                error!(
                    "Payment update for appointment {} failed, restoring status {}",
                    appointment_id, appointment.status
                );
                if let Err(restore) = self.write_status(appointment_id, appointment.status, auth_token).await {
                    error!("Could not restore status of appointment {}: {}", appointment_id, restore);
                }
                return Err(e);
            }
        }

        info!("Appointment {} moved {} -> {}", appointment_id, appointment.status, new_status);
        Ok(updated)
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        caller: Caller,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.update_status(appointment_id, caller, AppointmentStatus::Cancelled, auth_token).await
    }

    // Private helper methods

    /// Undo an appointment insert whose payment row could not be written.
    async fn discard_appointment(&self, appointment_id: Uuid, auth_token: &str) {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Result<Vec<Value>, _> = self.supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await;

        match result {
            Ok(_) => warn!("Discarded appointment {} after failed payment insert", appointment_id),
            Err(e) => error!("Appointment {} left without payment: {}", appointment_id, e),
        }
    }

    async fn write_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "status": status,
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(AppointmentError::store)?;

        first_row(result)
    }

    async fn set_payment_status(
        &self,
        appointment_id: Uuid,
        status: PaymentStatus,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/payments?appointment_id=eq.{}", appointment_id);
        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "status": status })),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(AppointmentError::store)?;

        let payments = rows.into_iter()
            .map(serde_json::from_value::<Payment>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Malformed payment row: {}", e)))?;

        if payments.is_empty() {
            warn!("No payment row found for appointment {}", appointment_id);
        } else {
            debug!("Payment for appointment {} set to {}", appointment_id, status);
        }
        Ok(())
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<T>, AppointmentError> {
        let result: Vec<Value> = self.supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(AppointmentError::store)?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Malformed appointment row: {}", e)))
    }
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<T, AppointmentError> {
    let row = rows.into_iter().next()
        .ok_or_else(|| AppointmentError::DatabaseError("Store returned no rows".to_string()))?;
    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("Malformed appointment row: {}", e)))
}
