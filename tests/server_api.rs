mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{chat_reply, coach_for, plan_json};
use fitcoach::server::routes;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn profile_body() -> Value {
    json!({
        "name": "Ravi",
        "age": 34,
        "gender": "male",
        "height": 178,
        "weight": 80,
        "fitnessGoal": "Muscle Gain",
        "currentFitnessLevel": "Beginner",
        "workoutLocation": "Gym",
        "dietaryPreferences": "Veg"
    })
}

#[tokio::test]
async fn health_is_ok() {
    let server = MockServer::start().await;
    let app = routes(Arc::new(coach_for(&server)));
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn invalid_profile_is_422_with_field_errors() {
    let server = MockServer::start().await;
    let app = routes(Arc::new(coach_for(&server)));

    let mut body = profile_body();
    body["name"] = json!("R");
    body["gender"] = json!("robot");
    let resp = app.oneshot(post_json("/api/plan", body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = body_json(resp).await;
    assert_eq!(v["error"], "Invalid form data provided.");
    assert!(v["fieldErrors"]["name"].is_string());
    assert!(v["fieldErrors"]["gender"].is_string());
}

#[tokio::test]
async fn plan_success_returns_plan_and_user_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&plan_json().to_string())))
        .mount(&server)
        .await;
    let app = routes(Arc::new(coach_for(&server)));

    let resp = app.oneshot(post_json("/api/plan", profile_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["plan"]["workout_plan"]["days"][0]["day"], "Day 1 - Push");
    assert_eq!(v["userDetails"]["fitnessGoal"], "Muscle Gain");
    assert!(v.get("error").is_none());
}

#[tokio::test]
async fn upstream_failure_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = routes(Arc::new(coach_for(&server)));

    let resp = app.oneshot(post_json("/api/plan/regenerate", profile_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v = body_json(resp).await;
    assert_eq!(v["error"], "Failed to regenerate a plan. Please try again later.");
    assert!(v.get("fieldErrors").is_none());
}

#[tokio::test]
async fn image_without_text_is_rejected() {
    let server = MockServer::start().await;
    let app = routes(Arc::new(coach_for(&server)));

    let resp = app.oneshot(post_json("/api/image", json!({ "itemText": "" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await, json!({ "error": "No item text provided." }));
}

#[tokio::test]
async fn mistyped_fields_get_uniform_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = routes(Arc::new(coach_for(&server)));

    let mut body = profile_body();
    body["name"] = json!(5);
    body["age"] = json!(true);
    let resp = app.oneshot(post_json("/api/plan", body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = body_json(resp).await;
    assert_eq!(v["error"], "Invalid form data provided.");
    assert_eq!(v["fieldErrors"]["name"], "Expected string, received number");
    assert_eq!(v["fieldErrors"]["age"], "Expected number, received boolean");
}

#[tokio::test]
async fn non_object_body_gets_uniform_json_error() {
    let server = MockServer::start().await;
    let app = routes(Arc::new(coach_for(&server)));

    let resp = app.oneshot(post_json("/api/tips", json!(["Ravi", 34]))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await, json!({ "error": "Invalid form data provided." }));
}

#[tokio::test]
async fn image_body_without_json_content_type_is_rejected_as_json() {
    let server = MockServer::start().await;
    let app = routes(Arc::new(coach_for(&server)));

    let req = Request::builder()
        .method("POST")
        .uri("/api/image")
        .body(Body::from("itemText=Squats"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await, json!({ "error": "No item text provided." }));
}
