use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use appointment_cell::Caller;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreateReviewRequest;
use crate::services::ReviewService;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id, "appointment")?;
    let caller = Caller::from_user(&user)?;

    let review = ReviewService::new(&state)
        .create_review(appointment_id, caller, request, auth.token())
        .await?;

    Ok(Json(json!({
        "message": "Review created",
        "review": review
    })))
}

#[axum::debug_handler]
pub async fn get_professional_reviews(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let professional_id = parse_id(&professional_id, "professional")?;

    let reviews = ReviewService::new(&state)
        .list_for_professional(professional_id, None)
        .await?;

    Ok(Json(json!({
        "reviews": reviews.reviews,
        "total": reviews.rating.total_reviews,
        "average_rating": reviews.rating.average_rating
    })))
}
