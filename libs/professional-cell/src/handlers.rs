use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailableSlotsQuery, CreateAvailabilityRequest, ProfessionalSearchQuery,
    UpdateAvailabilityRequest, UpdateSlotDurationRequest,
};
use crate::services::{
    availability::AvailabilityService,
    professional::ProfessionalService,
    slot_query::SlotQueryService,
};

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}

/// The caller's own id, provided they are a professional.
fn professional_caller(user: &User) -> Result<Uuid, AppError> {
    if !user.is_professional() {
        return Err(AppError::Forbidden("Only professionals can manage availability".to_string()));
    }
    parse_id(&user.id, "user")
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_professionals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ProfessionalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let professionals = ProfessionalService::new(&state)
        .search_professionals(&query, None)
        .await?;

    Ok(Json(json!({
        "professionals": professionals,
        "total": professionals.len()
    })))
}

#[axum::debug_handler]
pub async fn get_specialties(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let specialties = ProfessionalService::new(&state).list_specialties(None).await?;

    Ok(Json(json!({ "specialties": specialties })))
}

#[axum::debug_handler]
pub async fn get_professional_public(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let professional_id = parse_id(&professional_id, "professional")?;
    let professional = ProfessionalService::new(&state)
        .get_professional(professional_id, None)
        .await?;

    Ok(Json(json!({ "professional": professional })))
}

#[axum::debug_handler]
pub async fn get_availability_public(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let professional_id = parse_id(&professional_id, "professional")?;
    let windows = AvailabilityService::new(&state)
        .list_windows(professional_id, None)
        .await?;

    Ok(Json(json!({
        "availability": windows,
        "total": windows.len()
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots_public(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<String>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let response = SlotQueryService::new(&state)
        .get_available_slots(&professional_id, query, None)
        .await?;

    Ok(Json(json!(response)))
}

// ==============================================================================
// PROTECTED AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = professional_caller(&user)?;

    let window = AvailabilityService::new(&state)
        .create_window(professional_id, request, auth.token())
        .await?;

    Ok(Json(json!({
        "message": "Availability window created",
        "availability": window
    })))
}

#[axum::debug_handler]
pub async fn get_my_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let professional_id = professional_caller(&user)?;

    let windows = AvailabilityService::new(&state)
        .list_windows(professional_id, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "availability": windows,
        "total": windows.len()
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(window_id): Path<String>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = professional_caller(&user)?;
    let window_id = parse_id(&window_id, "availability")?;

    let window = AvailabilityService::new(&state)
        .set_window_active(window_id, professional_id, request.is_active, auth.token())
        .await?;

    Ok(Json(json!({ "availability": window })))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(window_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let professional_id = professional_caller(&user)?;
    let window_id = parse_id(&window_id, "availability")?;

    AvailabilityService::new(&state)
        .delete_window(window_id, professional_id, auth.token())
        .await?;

    Ok(Json(json!({ "message": "Availability window deleted" })))
}

#[axum::debug_handler]
pub async fn update_slot_duration(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<String>,
    Json(request): Json<UpdateSlotDurationRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = parse_id(&professional_id, "professional")?;
    if professional_caller(&user)? != professional_id {
        return Err(AppError::Forbidden("You can only change your own slot duration".to_string()));
    }

    let professional = ProfessionalService::new(&state)
        .update_slot_duration(professional_id, request.slot_duration, auth.token())
        .await?;

    Ok(Json(json!({ "professional": professional })))
}
