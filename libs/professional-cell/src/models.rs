use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ProfessionalError;

// ==============================================================================
// PROFESSIONAL PROFILE
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub profession: Option<String>,
    pub regulatory_body: Option<String>,
    pub registration_number: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub photo_url: Option<String>,
    pub slot_duration: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Professional {
    pub fn effective_slot_duration(&self) -> Result<SlotDuration, ProfessionalError> {
        SlotDuration::from_profile(self.slot_duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSlotDurationRequest {
    pub slot_duration: i32,
}

/// Slot granularity in minutes. Only 15, 30, 45 and 60 are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub struct SlotDuration(u32);

impl SlotDuration {
    pub const ALLOWED: [u32; 4] = [15, 30, 45, 60];
    pub const DEFAULT: SlotDuration = SlotDuration(30);

    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Professionals who never picked a granularity get the default.
    pub fn from_profile(stored: Option<i32>) -> Result<Self, ProfessionalError> {
        stored.map_or(Ok(Self::DEFAULT), Self::try_from)
    }
}

impl TryFrom<i32> for SlotDuration {
    type Error = ProfessionalError;

    fn try_from(minutes: i32) -> Result<Self, Self::Error> {
        u32::try_from(minutes)
            .ok()
            .filter(|m| Self::ALLOWED.contains(m))
            .map(SlotDuration)
            .ok_or_else(|| ProfessionalError::InvalidRequest(format!(
                "Slot duration must be one of 15, 30, 45 or 60 minutes (got {})",
                minutes
            )))
    }
}

impl From<SlotDuration> for u32 {
    fn from(duration: SlotDuration) -> Self {
        duration.0
    }
}

impl Default for SlotDuration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ==============================================================================
// SLOT TIME
// ==============================================================================

/// A bookable start time, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(u16);

impl SlotTime {
    pub const MINUTES_PER_DAY: u32 = 24 * 60;

    pub fn from_minute_of_day(minute: u32) -> Option<Self> {
        (minute < Self::MINUTES_PER_DAY).then(|| SlotTime(minute as u16))
    }

    pub fn minute_of_day(self) -> u32 {
        u32::from(self.0)
    }
}

/// Seconds are dropped so a booking stored at 08:00:30 still matches the 08:00 slot.
impl From<NaiveTime> for SlotTime {
    fn from(time: NaiveTime) -> Self {
        SlotTime((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for SlotTime {
    type Err = ProfessionalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        shared_utils::time_format::parse_hhmm(raw)
            .map(SlotTime::from)
            .ok_or_else(|| ProfessionalError::InvalidRequest(format!(
                "Invalid time '{}', expected HH:MM",
                raw
            )))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// AVAILABILITY WINDOWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday .. 6 = Saturday
    #[serde(with = "shared_utils::time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_utils::time_format")]
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i32,
    #[serde(with = "shared_utils::time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "shared_utils::time_format")]
    pub end_time: NaiveTime,
    pub is_active: Option<bool>,
}

impl CreateAvailabilityRequest {
    pub fn validate(&self) -> Result<(), ProfessionalError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(ProfessionalError::InvalidRequest(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }
        if self.start_time >= self.end_time {
            return Err(ProfessionalError::InvalidRequest(
                "Start time must be before end time".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_active: bool,
}

// ==============================================================================
// APPOINTMENT LEDGER VIEW
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    #[serde(alias = "scheduled")]
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Everything except a cancellation keeps the time taken.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of an appointment row the slot generator needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "shared_utils::time_format")]
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}

impl BookedAppointment {
    pub fn blocks(&self, professional_id: Uuid, date: NaiveDate, slot: SlotTime) -> bool {
        self.professional_id == professional_id
            && self.date == date
            && self.status.is_active()
            && SlotTime::from(self.time) == slot
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    #[default]
    #[serde(alias = "online")]
    Online,

    #[serde(alias = "presencial", alias = "in_person")]
    InPerson,

    #[serde(alias = "domiciliar", alias = "home_visit")]
    HomeVisit,
}

impl AppointmentType {
    pub fn requires_address(&self) -> bool {
        matches!(self, AppointmentType::HomeVisit)
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Online => write!(f, "Online"),
            AppointmentType::InPerson => write!(f, "InPerson"),
            AppointmentType::HomeVisit => write!(f, "HomeVisit"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = ProfessionalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "online" => Ok(AppointmentType::Online),
            "inperson" | "in_person" | "presencial" => Ok(AppointmentType::InPerson),
            "homevisit" | "home_visit" | "domiciliar" => Ok(AppointmentType::HomeVisit),
            other => Err(ProfessionalError::InvalidRequest(format!(
                "Unknown appointment type '{}'",
                other
            ))),
        }
    }
}

// ==============================================================================
// SLOT QUERY DTOs
// ==============================================================================

/// Raw query string; parsed by the slot query service so every failure maps to one error kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: Option<String>,
    pub appointment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlotsResponse {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub appointment_type: AppointmentType,
    pub slot_duration: SlotDuration,
    pub slots: Vec<SlotTime>,
    pub total_slots: usize,
}

// ==============================================================================
// SEARCH AND RATINGS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalSearchQuery {
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub profession: Option<String>,
}

/// Rating column of a review row, as read by search.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRating {
    pub professional_id: Uuid,
    pub rating: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub total_reviews: usize,
}

impl RatingSummary {
    /// Mean rounded to one decimal; `None` when there are no reviews.
    pub fn from_ratings(ratings: impl IntoIterator<Item = i32>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0i64, 0usize), |(sum, count), r| (sum + i64::from(r), count + 1));

        let average_rating = (count > 0)
            .then(|| (sum as f64 / count as f64 * 10.0).round() / 10.0);

        Self { average_rating, total_reviews: count }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalSummary {
    #[serde(flatten)]
    pub professional: Professional,
    #[serde(flatten)]
    pub rating: RatingSummary,
}
