use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiredesk_server::{app, AppState};

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signed_in(app: &Router, email: &str) -> String {
    let credentials = json!({ "email": email, "password": "password123" });
    let (status, _) = call(app, "POST", "/api/auth/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, tokens) = call(app, "POST", "/api/auth/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["token_type"], "bearer");
    tokens["access_token"].as_str().unwrap().to_string()
}

fn wire(sender: &str) -> Value {
    json!({
        "sender_name": sender,
        "recipient_name": "Jane Smith",
        "amount": "1000.00",
        "currency": "USD",
    })
}

#[tokio::test]
async fn register_rejects_duplicates_and_login_checks_password() {
    let app = app(AppState::new(None));
    signed_in(&app, "dup@example.com").await;

    let (status, problem) = call(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "dup@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["detail"], "Email already registered");

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "dup@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wires_need_a_valid_token() {
    let app = app(AppState::new(None));
    let (status, _) = call(&app, "GET", "/api/wires", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, "GET", "/api/wires", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn crud_round_trip() {
    let app = app(AppState::new(None));
    let token = signed_in(&app, "crud@example.com").await;

    let (status, created) = call(&app, "POST", "/api/wires", Some(&token), Some(wire("John Doe"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let reference = created["reference_number"].as_str().unwrap();
    assert!(reference.starts_with("WIRE-") && reference.len() == 17);
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/wires/{id}"),
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["sender_name"], "John Doe");

    let (status, _) = call(&app, "DELETE", &format!("/api/wires/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, problem) = call(&app, "GET", &format!("/api/wires/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["detail"], format!("Wire with ID {id} not found"));
}

#[tokio::test]
async fn list_paginates_filters_and_scopes() {
    let app = app(AppState::new(None));
    let token = signed_in(&app, "list@example.com").await;
    let other = signed_in(&app, "other@example.com").await;

    for n in 0..3 {
        call(&app, "POST", "/api/wires", Some(&token), Some(wire(&format!("Sender {n}")))).await;
    }
    call(&app, "POST", "/api/wires", Some(&other), Some(wire("Someone else"))).await;

    let (_, page) = call(&app, "GET", "/api/wires?page=1&page_size=2", Some(&token), None).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["wires"].as_array().unwrap().len(), 2);
    assert_eq!(page["wires"][0]["sender_name"], "Sender 2");
    assert_eq!(page["cached"], false);

    let (_, filtered) = call(&app, "GET", "/api/wires?status=completed", Some(&token), None).await;
    assert_eq!(filtered["total"], 0);

    let (_, unknown) = call(&app, "GET", "/api/wires?status=settled", Some(&token), None).await;
    assert_eq!(unknown["total"], 3);

    let (status, _) = call(&app, "GET", "/api/wires?page_size=101", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = call(&app, "GET", "/api/wires?page=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_wire_is_rejected_with_problem_details() {
    let app = app(AppState::new(None));
    let token = signed_in(&app, "invalid@example.com").await;
    let mut body = wire("John Doe");
    body["currency"] = json!("usd");

    let (status, problem) = call(&app, "POST", "/api/wires", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["status"], 422);
    assert_eq!(problem["detail"], "currency: Currency must be 3 letters");
}
