use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path, query_param};

use mood_cell::router::mood_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

fn create_test_app(config: AppConfig) -> Router {
    mood_routes(Arc::new(config))
}

async fn mock_config() -> (MockServer, AppConfig) {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    (mock_server, config)
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn log_request(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/log")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_log_mood_success() {
    let (mock_server, config) = mock_config().await;
    let user = TestUser::user("mood@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("POST"))
        .and(path("/rest/v1/mood_entries"))
        .and(body_partial_json(json!({ "user_id": user.id, "sentiment": "positive" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::mood_entry_response(user.id, "positive", "2025-06-01T10:00:00Z")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(config)
        .oneshot(log_request(&token, json!({ "sentiment": "positive" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Mood logged successfully");
    assert_eq!(body["entry"]["sentiment"], "positive");
}

#[tokio::test]
async fn test_log_mood_rejects_unknown_sentiment() {
    let (mock_server, config) = mock_config().await;
    let user = TestUser::user("mood@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("POST"))
        .and(path("/rest/v1/mood_entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    for body in [json!({ "sentiment": "elated" }), json!({})] {
        let response = create_test_app(config.clone())
            .oneshot(log_request(&token, body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["message"], "Invalid sentiment value");
    }
}

#[tokio::test]
async fn test_log_mood_requires_token() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request = Request::builder()
        .method("POST")
        .uri("/log")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "sentiment": "neutral" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mood_history_is_scoped_to_caller() {
    let (mock_server, config) = mock_config().await;
    let user = TestUser::user("mood@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/mood_entries"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::mood_entry_response(user.id, "negative", "2025-06-02T10:00:00Z"),
            MockSupabaseResponses::mood_entry_response(user.id, "positive", "2025-06-01T10:00:00Z")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/history?days=7")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["days"], 7);
    assert_eq!(body["total"], 2);
    assert_eq!(body["entries"][0]["sentiment"], "negative");
}
