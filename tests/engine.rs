//! EngineLocalizer against a local axum stand-in for the engine.

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

use lingo::config::Credentials;
use lingo::localizer::{EngineLocalizer, LocalizeRequest, Localizer, Messages};

const KEY: &str = "test-key";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", KEY))
}

async fn whoami(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({"email": "dev@example.com"})))
}

async fn localize(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let target = body["targetLocale"].as_str().unwrap_or_default().to_string();
    let data: serde_json::Map<String, Value> = body["data"]
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, json!(format!("{}:{}", target, v.as_str().unwrap_or_default()))))
        .collect();
    Ok(Json(json!({"data": data})))
}

async fn spawn_engine() -> String {
    let app = Router::new()
        .route("/whoami", get(whoami))
        .route("/localize", post(localize));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn localizer(url: String, key: &str) -> EngineLocalizer {
    EngineLocalizer::new(Credentials {
        api_key: key.to_string(),
        api_url: url,
    })
    .unwrap()
}

#[tokio::test]
async fn test_whoami_returns_email() {
    let url = spawn_engine().await;
    let email = localizer(url, KEY).whoami().await.unwrap();
    assert_eq!(email.as_deref(), Some("dev@example.com"));
}

#[tokio::test]
async fn test_whoami_rejected_key_is_error() {
    let url = spawn_engine().await;
    assert!(localizer(url, "wrong").whoami().await.is_err());
}

#[tokio::test]
async fn test_localize_round_trip() {
    let url = spawn_engine().await;
    let out = localizer(url, KEY)
        .localize(LocalizeRequest {
            source_locale: "en".into(),
            target_locale: "es".into(),
            data: Messages::from([
                ("greeting".to_string(), "Hello".to_string()),
                ("nav.home".to_string(), "Home".to_string()),
            ]),
        })
        .await
        .unwrap();
    assert_eq!(out["greeting"], "es:Hello");
    assert_eq!(out["nav.home"], "es:Home");
}

#[tokio::test]
async fn test_unreachable_engine_is_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let err = localizer(url, KEY).whoami().await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to reach localization engine"));
}
