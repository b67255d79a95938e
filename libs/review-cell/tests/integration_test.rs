use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path, query_param};

use review_cell::router::review_routes;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

async fn setup() -> (Router, TestConfig, MockServer) {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let app = review_routes(Arc::new(config.to_app_config()));
    (app, config, mock_server)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn review_request(appointment_id: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/appointment/{}", appointment_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_appointment(mock_server: &MockServer, appointment_id: &str, patient_id: &str, professional_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id, patient_id, professional_id, "2030-01-07", "08:00", status
            )
        ])))
        .mount(mock_server)
        .await;
}

async fn mount_existing_reviews(mock_server: &MockServer, appointment_id: &str, reviews: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/reviews"))
        .and(query_param("appointment_id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(reviews))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_patient_reviews_completed_appointment() {
    let (app, config, mock_server) = setup().await;
    let patient = TestUser::patient("patient@example.com");
    let professional_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();

    mount_appointment(&mock_server, &appointment_id, &patient.id, &professional_id, "completed").await;
    mount_existing_reviews(&mock_server, &appointment_id, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/reviews"))
        .and(body_partial_json(json!({
            "appointment_id": appointment_id,
            "professional_id": professional_id,
            "rating": 5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::review_response(&appointment_id, &patient.id, &professional_id, 5)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);
    let (status, body) = send(app, review_request(&appointment_id, &token, json!({ "rating": 5, "comment": "Ótimo" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["rating"], 5);
    assert_eq!(body["review"]["professional_id"], professional_id);
}

#[tokio::test]
async fn test_rating_out_of_range_never_reaches_store() {
    let (app, config, mock_server) = setup().await;
    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);
    let (status, body) = send(app, review_request(&Uuid::new_v4().to_string(), &token, json!({ "rating": 6 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("between 1 and 5"));
}

#[tokio::test]
async fn test_pending_appointment_cannot_be_reviewed() {
    let (app, config, mock_server) = setup().await;
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4().to_string();

    mount_appointment(&mock_server, &appointment_id, &patient.id, &Uuid::new_v4().to_string(), "confirmed").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);
    let (status, body) = send(app, review_request(&appointment_id, &token, json!({ "rating": 4 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("completed"));
}

#[tokio::test]
async fn test_second_review_is_conflict() {
    let (app, config, mock_server) = setup().await;
    let patient = TestUser::patient("patient@example.com");
    let professional_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();

    mount_appointment(&mock_server, &appointment_id, &patient.id, &professional_id, "completed").await;
    mount_existing_reviews(&mock_server, &appointment_id, json!([
        MockSupabaseResponses::review_response(&appointment_id, &patient.id, &professional_id, 3)
    ])).await;

    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);
    let (status, _) = send(app, review_request(&appointment_id, &token, json!({ "rating": 5 }))).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_professional_cannot_review_own_appointment() {
    let (app, config, mock_server) = setup().await;
    let professional = TestUser::professional("pro@example.com");
    let appointment_id = Uuid::new_v4().to_string();

    mount_appointment(&mock_server, &appointment_id, &Uuid::new_v4().to_string(), &professional.id, "completed").await;

    let token = JwtTestUtils::create_test_token(&professional, &config.jwt_secret, None);
    let (status, _) = send(app, review_request(&appointment_id, &token, json!({ "rating": 5 }))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_professional_reviews_with_average() {
    let (app, _, mock_server) = setup().await;
    let professional_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/reviews"))
        .and(query_param("professional_id", format!("eq.{}", professional_id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::review_response(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), &professional_id, 5),
            MockSupabaseResponses::review_response(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), &professional_id, 4),
            MockSupabaseResponses::review_response(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), &professional_id, 4),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri(format!("/professional/{}", professional_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["average_rating"], 4.3);
}

#[tokio::test]
async fn test_reviewing_requires_token() {
    let (app, _, _mock_server) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/appointment/{}", Uuid::new_v4()))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "rating": 5 }).to_string()))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
