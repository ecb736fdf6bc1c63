use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn client_for(server: &MockServer) -> CompanionClient {
    CompanionClient::new(&server.uri(), "secret-token", Duration::from_secs(1)).unwrap()
}

fn ok_body(message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "message": message,
        "duration_ms": 7
    })
}

#[test]
fn test_rejects_non_loopback_base_url() {
    let result = CompanionClient::new("http://automation.example.com:8765", "t", Duration::from_secs(1));
    assert!(matches!(result, Err(CompanionError::NotLoopback(_))));

    let ok = CompanionClient::new("http://127.0.0.1:8765", "t", Duration::from_secs(1));
    assert!(ok.is_ok());
    let local = CompanionClient::new("http://localhost:8765", "t", Duration::from_secs(1));
    assert!(local.is_ok());
}

#[tokio::test]
async fn test_click_sends_token_and_point() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/click"))
        .and(header("X-Auth-Token", "secret-token"))
        .and(body_partial_json(serde_json::json!({"x": 125, "y": 210})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Clicked at (125, 210)")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.click(ScreenPoint::new(125, 210)).await.unwrap();
    assert!(response.success);
    assert_eq!(response.duration_ms, Some(7));
}

#[tokio::test]
async fn test_type_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/type"))
        .and(body_partial_json(serde_json::json!({"text": "alex@x.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Typed 10 characters")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.type_text("alex@x.com").await.unwrap().success);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/click"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Invalid authentication token"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.click(ScreenPoint::new(1, 1)).await;
    assert!(matches!(result, Err(CompanionError::Unauthorized)));
}

#[tokio::test]
async fn test_disabled_capability() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/screenshot"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Screenshots disabled"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.screenshot().await;
    assert!(matches!(result, Err(CompanionError::Disabled(_))));
}

#[tokio::test]
async fn test_optical_click_reports_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/optical_click"))
        .and(body_partial_json(serde_json::json!({
            "label": "Submit application",
            "confidence_threshold": 0.8
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "matched",
            "confidence": 0.91,
            "coordinates": {"x": 480, "y": 660}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.optical_click("Submit application", 0.8).await.unwrap();
    assert_eq!(response.confidence, Some(0.91));
    assert_eq!(response.coordinates, Some(ScreenPoint::new(480, 660)));
}

#[tokio::test]
async fn test_screenshot_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/screenshot"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_body("screenshots/shot_20250601_1200.png")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let shot = client.screenshot().await.unwrap();
    assert_eq!(shot.reference, "screenshots/shot_20250601_1200.png");
}

#[tokio::test]
async fn test_upload_and_scroll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_partial_json(serde_json::json!({"file_path": "/tmp/resume.pdf"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("File uploaded")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scroll"))
        .and(body_partial_json(serde_json::json!({"delta": -3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Scrolled")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.upload("/tmp/resume.pdf").await.unwrap().success);
    assert!(client.scroll(-3).await.unwrap().success);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "service": "companion"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "companion");
}

#[tokio::test]
async fn test_server_error_is_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/click"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.click(ScreenPoint::new(1, 1)).await;
    assert!(matches!(result, Err(CompanionError::Service(_))));
}
