#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use rendezvous_api::state::AppStateInner;
use rendezvous_db::Database;

pub const FEMALE: &str = "женский";
pub const MALE: &str = "мужской";

/// Percent-encoded labels for query strings.
pub const FEMALE_QS: &str = "%D0%B6%D0%B5%D0%BD%D1%81%D0%BA%D0%B8%D0%B9";
pub const MALE_QS: &str = "%D0%BC%D1%83%D0%B6%D1%81%D0%BA%D0%BE%D0%B9";

/// Router over a fresh in-memory store.
pub fn build_test_app() -> Router {
    let db = Database::open_in_memory().expect("in-memory database");
    rendezvous_api::router(AppStateInner::new(db))
}

/// Send a request and return the status plus the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(json) => send_raw(app, method, uri, Some("application/json"), json.to_string()).await,
        None => send_raw(app, method, uri, None, String::new()).await,
    }
}

/// Like [`send`] but with a literal body, for malformed payloads.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: String,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

pub fn profile_body(name: &str, age: i64, gender: &str) -> Value {
    json!({
        "name": name,
        "age": age,
        "gender": gender,
        "contact": format!("{}@x.com", name.to_lowercase()),
    })
}

/// Create a profile and return its id.
pub async fn create_profile(app: &Router, name: &str, age: i64, gender: &str) -> i64 {
    let (status, json) = post(app, "/profiles", profile_body(name, age, gender)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

/// Names of the error fields in a validation response.
pub fn error_fields(json: &Value) -> Vec<String> {
    json["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
