use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use price_whisperer::constants::SUCCESS_NOTICE;
use price_whisperer::web_server::{router, AppState};
use price_whisperer::{ApiKey, GeminiClient, GeminiConfig, Locale, ServerConfig, SessionStore};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOD_REPLY: &str = r#"Prediction: {"predictedPrice":"$1,049.00","priceRange":{"min":"$949.00","max":"$1,149.00"},"confidence":81,"priceType":"high","factors":["OLED display","Strong resale value"]}"#;

fn test_server(gemini: &MockServer) -> TestServer {
    let config = GeminiConfig::new(ApiKey::new("test-key"))
        .with_api_url(gemini.uri())
        .with_model("gemini-1.5-flash");
    let sessions = Arc::new(SessionStore::new(
        GeminiClient::new(&config).unwrap(),
        Locale::EnUs,
    ));
    let server_config = ServerConfig {
        templates_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string(),
        static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
    };
    let state = AppState::new(sessions, &server_config);
    TestServer::new(router(state, &server_config.static_dir)).unwrap()
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

/// The `name=value` pair a browser would send back for the session cookie.
fn session_cookie(response: &TestResponse) -> HeaderValue {
    let set_cookie = response.header(SET_COOKIE);
    let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
    assert!(pair.starts_with("price_whisperer_session="));
    HeaderValue::from_str(&pair).unwrap()
}

async fn gemini_replying(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_index_renders_empty_form() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Product Price Prediction"));
    assert!(html.contains("name=\"historicalPrices\""));
    assert!(html.contains("value=\"furniture\""));
    assert!(html.contains("Submit a product to see its predicted price."));
}

#[tokio::test]
async fn test_api_predict_returns_model_prediction() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let response = server
        .post("/api/predict")
        .json(&json!({
            "name": "Phone X",
            "category": "smartphone",
            "brand": "Acme",
            "features": "6GB RAM"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "model");
    assert_eq!(body["prediction"]["predictedPrice"], "$1,049.00");
    assert_eq!(body["prediction"]["priceRange"]["max"], "$1,149.00");
    assert_eq!(body["prediction"]["factors"][1], "Strong resale value");
    assert_eq!(body["message"], SUCCESS_NOTICE);
    assert!(body.get("notice").is_none());
}

#[tokio::test]
async fn test_api_predict_falls_back_on_malformed_reply() {
    let gemini = gemini_replying("no json here").await;
    let server = test_server(&gemini);

    let response = server
        .post("/api/predict")
        .json(&json!({
            "name": "Phone X",
            "category": "smartphone",
            "brand": "Acme",
            "features": "6GB RAM",
            "historicalPrices": ""
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "fallback");
    assert!(body["notice"].as_str().unwrap().contains("Failed to get a price prediction"));
    assert_eq!(body["prediction"]["predictedPrice"], "$2,499.00");
    assert_eq!(body["prediction"]["confidence"], 75);
    assert_eq!(body["prediction"]["priceType"], "medium");
}

#[tokio::test]
async fn test_api_predict_rejects_unknown_category() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let response = server
        .post("/api/predict")
        .json(&json!({
            "name": "Rocket",
            "category": "spaceship",
            "brand": "Acme",
            "features": "fast"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_form_submission_renders_card_and_chart() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let response = server
        .post("/predict")
        .form(&[
            ("name", "Phone X"),
            ("category", "smartphone"),
            ("brand", "Acme"),
            ("features", "6GB RAM"),
            ("historicalPrices", ""),
        ])
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Prediction: Phone X"));
    assert!(html.contains("$1,049.00"));
    assert!(html.contains("Range: $949.00 - $1,149.00"));
    assert!(html.contains("Confidence level: 81%"));
    assert!(html.contains("High Price"));
    assert!(html.contains("Minimum"));
    assert!(html.contains("$1,149"));
    assert!(html.contains("notice-success"));
    assert!(html.contains(SUCCESS_NOTICE));
    assert!(!html.contains("role=\"alert\""));

    // The last submission stays on the page for the same browser.
    let cookie = session_cookie(&response);
    let index = server.get("/").add_header(COOKIE, cookie).await;
    assert!(index.headers().get(SET_COOKIE).is_none());
    assert!(index.text().contains("Prediction: Phone X"));
}

#[tokio::test]
async fn test_form_submission_shows_failure_notice() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&gemini)
        .await;
    let server = test_server(&gemini);

    let response = server
        .post("/predict")
        .form(&[
            ("name", "Phone X"),
            ("category", "smartphone"),
            ("brand", "Acme"),
            ("features", "6GB RAM"),
            ("historicalPrices", ""),
        ])
        .await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("role=\"alert\""));
    assert!(html.contains("Failed to get a price prediction"));
    assert!(!html.contains(SUCCESS_NOTICE));
    assert!(html.contains("$2,499.00"));
    assert!(html.contains("Medium Price"));
}

#[tokio::test]
async fn test_health_and_static_assets() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let health: Value = server.get("/api/health").await.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["busy"], false);

    let css = server.get("/static/style.css").await;
    css.assert_status_ok();
    assert!(css.text().contains(".bar"));
}

#[tokio::test]
async fn test_cancel_without_request() {
    let gemini = gemini_replying(GOOD_REPLY).await;
    let server = test_server(&gemini);

    let body: Value = server.post("/api/cancel").await.json();
    assert_eq!(body["cancelled"], false);
}

#[tokio::test]
async fn test_browsers_do_not_share_sessions() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Alice Phone"))
        .respond_with(reply(GOOD_REPLY).set_delay(Duration::from_millis(500)))
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Bob Phone"))
        .respond_with(reply(GOOD_REPLY))
        .mount(&gemini)
        .await;
    let server = test_server(&gemini);

    let alice = async {
        server
            .post("/predict")
            .form(&[
                ("name", "Alice Phone"),
                ("category", "smartphone"),
                ("brand", "Acme"),
                ("features", "6GB RAM"),
                ("historicalPrices", ""),
            ])
            .await
    };
    let bob = async {
        // Submit only once Alice's request is in flight.
        loop {
            let health: Value = server.get("/api/health").await.json();
            if health["busy"] == true {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        server
            .post("/predict")
            .form(&[
                ("name", "Bob Phone"),
                ("category", "smartphone"),
                ("brand", "Acme"),
                ("features", "6GB RAM"),
                ("historicalPrices", ""),
            ])
            .await
    };
    let (alice, bob) = tokio::join!(alice, bob);

    alice.assert_status_ok();
    bob.assert_status_ok();
    assert!(alice.text().contains("Prediction: Alice Phone"));
    assert!(bob.text().contains("Prediction: Bob Phone"));

    let alice_page = server
        .get("/")
        .add_header(COOKIE, session_cookie(&alice))
        .await
        .text();
    assert!(alice_page.contains("Prediction: Alice Phone"));
    assert!(!alice_page.contains("Bob Phone"));

    let fresh = server.get("/").await;
    let fresh_page = fresh.text();
    assert!(fresh_page.contains("Submit a product to see its predicted price."));
    assert!(!fresh_page.contains("Bob Phone"));
    assert!(!fresh_page.contains("Alice Phone"));
    assert_ne!(session_cookie(&fresh), session_cookie(&alice));
}
