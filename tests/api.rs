#![cfg(feature = "server")]

// HTTP API over a seeded in-memory context.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use church_admin::{
    server, AdminCredentials, ChurchContext, ChurchRegistry, KeyValueStorage, MemoryStorage,
    StaticAuthenticator,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let ctx = ChurchContext::new(
        ChurchRegistry::local(storage.clone()),
        Arc::new(StaticAuthenticator::new(AdminCredentials::default(), storage)),
    );
    server::router(Arc::new(ctx))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signed_in() -> Router {
    let app = app();
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "admin", "password": "admin123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": "OK"}));
}

#[tokio::test]
async fn data_routes_require_sign_in() {
    let app = app();

    for uri in ["/api/dashboard", "/api/members", "/api/events", "/api/finance/summary"] {
        let (status, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["success"], false);
    }

    let (status, _) = call(
        &app,
        "POST",
        "/api/members",
        Some(json!({"name": "Ruth", "phone": "0812"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_logout_and_session() {
    let app = app();

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "admin", "password": "salah"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, "GET", "/api/auth/session", None).await;
    assert_eq!(body["data"]["authenticated"], false);

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({"username": "admin", "password": "admin123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Admin Gereja");

    let (_, body) = call(&app, "GET", "/api/auth/session", None).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["user"]["role"], "Administrator");

    let (status, _) = call(&app, "POST", "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", "/api/members", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signup",
        Some(json!({"email": "baru@gereja.id", "password": "rahasia"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn dashboard_summarises_seed_data() {
    let app = signed_in().await;
    let (status, body) = call(&app, "GET", "/api/dashboard", None).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_members"], 4);
    assert_eq!(data["active_members"], 3);
    assert_eq!(data["upcoming_events"], 4);
    assert_eq!(data["total_income"], 21_250_000);
    assert_eq!(data["balance"], 14_450_000);
    assert_eq!(data["recent_members"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn member_crud_round() {
    let app = signed_in().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/members",
        Some(json!({"name": "Ruth Simanjuntak", "phone": "081299990000", "gender": "Perempuan"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "Aktif");

    let (_, body) = call(&app, "GET", "/api/members?q=simanjuntak", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/members/{}", id),
        Some(json!({"status": "Pindahan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Pindahan");
    assert_eq!(body["data"]["phone"], "081299990000");

    let (status, _) = call(&app, "DELETE", &format!("/api/members/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "GET", "/api/members", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = signed_in().await;

    let (status, body) = call(&app, "POST", "/api/members", Some(json!({"name": "Ruth"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("phone"));

    let (status, _) = call(
        &app,
        "POST",
        "/api/finance",
        Some(json!({"type": "Pemasukan", "category": "Donasi", "amount": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        "POST",
        "/api/finance",
        Some(json!({"type": "Pemasukan", "category": "Donasi", "amount": i64::MAX / 2 + 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("at most"));

    let (status, _) = call(
        &app,
        "POST",
        "/api/events",
        Some(json!({"name": "Ibadah", "date": "20-04-2026"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(&app, "GET", "/api/finance", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn type_filters() {
    let app = signed_in().await;

    let (status, body) = call(&app, "GET", "/api/events?type=Rapat", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call(&app, "GET", "/api/events?type=all", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (status, _) = call(&app, "GET", "/api/events?type=Konser", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, "GET", "/api/finance?type=Pengeluaran", None).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["type"] == "Pengeluaran"));
}

#[tokio::test]
async fn finance_summary_and_categories() {
    let app = signed_in().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/finance",
        Some(json!({"type": "Pengeluaran", "category": "Operasional", "amount": 450000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["amount"], 450_000);

    let (_, body) = call(&app, "GET", "/api/finance/summary", None).await;
    assert_eq!(body["data"]["total_expense"], 7_250_000);
    assert_eq!(body["data"]["balance"], 14_000_000);

    let (_, body) = call(&app, "GET", "/api/finance/categories?type=Pemasukan", None).await;
    let categories = body["data"].as_array().unwrap();
    assert!(categories.contains(&json!("Perpuluhan")));
    assert!(!categories.contains(&json!("Operasional")));
}
