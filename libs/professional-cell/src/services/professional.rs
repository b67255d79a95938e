use std::sync::Arc;

use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Method, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::ProfessionalError;
use crate::models::{
    Professional, ProfessionalSearchQuery, ProfessionalSummary, RatingSummary, ReviewRating,
    SlotDuration,
};

const PROFILE_COLUMNS: &str = "id,name,email,profession,regulatory_body,registration_number,description,city,state,photo_url,slot_duration,created_at";

pub struct ProfessionalService {
    supabase: Arc<SupabaseClient>,
}

impl ProfessionalService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Public profile read. Accounts that are not professionals are reported as missing.
    pub async fn get_professional(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Professional, ProfessionalError> {
        debug!("Fetching professional profile: {}", professional_id);

        let path = format!(
            "/rest/v1/users?id=eq.{}&user_type=eq.professional&select={}",
            professional_id, PROFILE_COLUMNS
        );
        let result: Vec<Value> = self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(ProfessionalError::store)?;

        let row = result.into_iter().next()
            .ok_or_else(|| ProfessionalError::NotFound("Professional not found".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| ProfessionalError::ServiceUnavailable(format!("Malformed professional row: {}", e)))
    }

    pub async fn update_slot_duration(
        &self,
        professional_id: Uuid,
        slot_duration: i32,
        auth_token: &str,
    ) -> Result<Professional, ProfessionalError> {
        let duration = SlotDuration::try_from(slot_duration)?;
        debug!("Setting slot duration of {} to {} minutes", professional_id, duration.minutes());

        let path = format!(
            "/rest/v1/users?id=eq.{}&user_type=eq.professional&select={}",
            professional_id, PROFILE_COLUMNS
        );
        let body = json!({
            "slot_duration": duration.minutes(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(ProfessionalError::store)?;

        let row = result.into_iter().next()
            .ok_or_else(|| ProfessionalError::NotFound("Professional not found".to_string()))?;

        info!("Slot duration updated for professional {}", professional_id);
        serde_json::from_value(row)
            .map_err(|e| ProfessionalError::ServiceUnavailable(format!("Malformed professional row: {}", e)))
    }

    /// Professionals matching every given filter, each with its rating summary.
    /// Text filters are case-insensitive substring matches; `state` is an exact UF code.
    pub async fn search_professionals(
        &self,
        query: &ProfessionalSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<ProfessionalSummary>, ProfessionalError> {
        let path = search_path(query)?;
        debug!("Searching professionals: {}", path);

        let professionals: Vec<Professional> = self.fetch_rows(&path, auth_token).await?;
        if professionals.is_empty() {
            return Ok(Vec::new());
        }

        let ids = professionals.iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let ratings: Vec<ReviewRating> = self
            .fetch_rows(
                &format!("/rest/v1/reviews?professional_id=in.({})&select=professional_id,rating", ids),
                auth_token,
            )
            .await?;

        let mut by_professional: HashMap<Uuid, Vec<i32>> = HashMap::new();
        for review in ratings {
            by_professional.entry(review.professional_id).or_default().push(review.rating);
        }

        Ok(professionals
            .into_iter()
            .map(|professional| {
                let rating = RatingSummary::from_ratings(
                    by_professional.remove(&professional.id).unwrap_or_default(),
                );
                ProfessionalSummary { professional, rating }
            })
            .collect())
    }

    /// Distinct specialty names, alphabetical.
    pub async fn list_specialties(&self, auth_token: Option<&str>) -> Result<Vec<String>, ProfessionalError> {
        #[derive(Deserialize)]
        struct SpecialtyRow {
            name: String,
        }

        let rows: Vec<SpecialtyRow> = self
            .fetch_rows("/rest/v1/specialties?select=name&order=name.asc", auth_token)
            .await?;

        let mut names: Vec<String> = rows.into_iter().map(|row| row.name).collect();
        names.sort();
        names.dedup();
        Ok(names)
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

fn search_path(query: &ProfessionalSearchQuery) -> Result<String, ProfessionalError> {
    let mut url = Url::parse("http://store.local/rest/v1/users")
        .map_err(|e| ProfessionalError::ServiceUnavailable(e.to_string()))?;

    let filter = |value: &Option<String>| {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    };

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("user_type", "eq.professional");

        match filter(&query.specialty) {
            Some(specialty) => {
                pairs.append_pair("select", &format!("{},specialties!inner(name)", PROFILE_COLUMNS));
                pairs.append_pair("specialties.name", &format!("ilike.*{}*", specialty));
            }
            None => {
                pairs.append_pair("select", PROFILE_COLUMNS);
            }
        }
        if let Some(city) = filter(&query.city) {
            pairs.append_pair("city", &format!("ilike.*{}*", city));
        }
        if let Some(state) = filter(&query.state) {
            pairs.append_pair("state", &format!("eq.{}", state.to_uppercase()));
        }
        if let Some(profession) = filter(&query.profession) {
            pairs.append_pair("profession", &format!("ilike.*{}*", profession));
        }
        pairs.append_pair("order", "name.asc");
    }

    Ok(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
}
