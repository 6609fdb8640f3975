//! In-process mock of the EventSphere REST backend for integration tests.
//!
//! Every request is recorded. Tokens are `tok-<role>`; a login email's local
//! part picks the role (`admin@expo.test` signs in as admin) and anything that
//! is not a role name signs in as organizer. Setting `revoked` makes every
//! authenticated endpoint answer 401.
//!
//! Canned failures: `nobody@expo.test` has no account, only the reset token
//! `good-reset` is valid, the company `Taken Inc` is already registered and
//! the session `full` cannot be booked.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri};
use axum::Json;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use eventsphere::app::App;
use eventsphere::config::ClientConfig;

pub const PASSWORD: &str = "secret1";
pub const RESET_TOKEN: &str = "good-reset";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub auth: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct Mock {
    pub requests: Mutex<Vec<Recorded>>,
    pub revoked: AtomicBool,
}

impl Mock {
    pub fn revoke(&self) { self.revoked.store(true, Ordering::SeqCst); }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests.lock().iter().filter(|r| r.path == path).cloned().collect()
    }
}

pub struct MockBackend {
    pub mock: Arc<Mock>,
    pub base: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) { self.handle.abort(); }
}

pub async fn spawn_backend() -> MockBackend {
    let mock = Arc::new(Mock::default());
    let router = axum::Router::new().fallback(handle).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    MockBackend { mock, base: format!("http://{addr}/api"), handle }
}

/// A client pointed at `backend` with its token file inside `dir`.
pub fn app_for(backend: &MockBackend, dir: &TempDir) -> App {
    let cfg = ClientConfig::new(&backend.base, token_path(dir)).expect("config");
    App::new(cfg).expect("app")
}

pub fn token_path(dir: &TempDir) -> PathBuf { dir.path().join("session").join("token") }

pub fn stored_token(dir: &TempDir) -> Option<String> { std::fs::read_to_string(token_path(dir)).ok() }

pub fn user_json(role: &str, email: &str) -> Value {
    json!({
        "_id": format!("u-{role}"),
        "firstName": "Ana",
        "lastName": "Diaz",
        "email": email,
        "role": role,
    })
}

fn role_for_email(email: &str) -> &str {
    match email.split('@').next().unwrap_or("") {
        r @ ("admin" | "organizer" | "exhibitor" | "attendee" | "vendor") => r,
        _ => "organizer",
    }
}

/// `base` with every field of `patch` written over it.
fn merged(mut base: Value, patch: &Value) -> Value {
    if let (Some(b), Some(p)) = (base.as_object_mut(), patch.as_object()) {
        for (k, v) in p {
            b.insert(k.clone(), v.clone());
        }
    }
    base
}

fn ok(data: Value) -> (StatusCode, Json<Value>) { (StatusCode::OK, Json(json!({ "success": true, "data": data }))) }

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "message": message })))
}

async fn handle(
    State(mock): State<Arc<Mock>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    mock.requests.lock().push(Recorded { method: method.to_string(), path: path.clone(), auth: auth.clone(), body: body.clone() });

    // Role of the caller when the bearer token is one this backend issued.
    let caller = auth
        .as_deref()
        .and_then(|a| a.strip_prefix("Bearer tok-"))
        .map(str::to_string)
        .filter(|_| !mock.revoked.load(Ordering::SeqCst));

    let rest = path.strip_prefix("/api/").unwrap_or(&path);
    match (method.as_str(), rest) {
        ("POST", "auth/login") => {
            let email = body["email"].as_str().unwrap_or_default();
            if body["password"] != PASSWORD {
                return fail(StatusCode::BAD_REQUEST, "Invalid credentials");
            }
            let role = role_for_email(email);
            ok(json!({ "user": user_json(role, email), "token": format!("tok-{role}") }))
        }
        ("POST", "auth/register") => {
            let role = body["role"].as_str().unwrap_or("attendee").to_string();
            let email = body["email"].as_str().unwrap_or_default();
            ok(json!({ "user": user_json(&role, email), "token": format!("tok-{role}") }))
        }
        ("POST", "auth/logout") => fail(StatusCode::INTERNAL_SERVER_ERROR, "Logout exploded"),
        ("POST", "auth/forgot-password") if body["email"] == "nobody@expo.test" => {
            fail(StatusCode::NOT_FOUND, "User not found")
        }
        ("POST", "auth/forgot-password") => ok(json!({ "message": "Reset email sent" })),
        ("POST", r) if r.starts_with("auth/reset-password/") => {
            if r.trim_start_matches("auth/reset-password/") != RESET_TOKEN {
                return fail(StatusCode::BAD_REQUEST, "Invalid or expired reset token");
            }
            ok(json!({ "user": user_json("attendee", "attendee@expo.test"), "token": "tok-attendee" }))
        }
        ("GET", "expos/public") => ok(json!([{ "_id": "e1", "title": "Spring Expo", "status": "published" }])),
        ("GET", r) if r.starts_with("expos/") && r != "expos/my" => {
            let id = r.trim_start_matches("expos/");
            ok(json!({ "_id": id, "title": "Detail" }))
        }
        _ => {
            let Some(role) = caller else {
                return fail(StatusCode::UNAUTHORIZED, "Token expired");
            };
            let organizers_only = (method == Method::POST && rest == "expos")
                || (method == Method::PUT && rest.starts_with("expos/"))
                || rest.ends_with("/approve")
                || rest.ends_with("/reject");
            if organizers_only && role != "organizer" && role != "admin" {
                return fail(StatusCode::FORBIDDEN, "Organizers only");
            }
            match (method.as_str(), rest) {
                ("GET", "auth/me") => ok(json!({ "user": user_json(&role, &format!("{role}@expo.test")) })),
                ("GET", "users") if role == "admin" => ok(json!([user_json("attendee", "attendee@expo.test")])),
                ("GET", "users") => fail(StatusCode::FORBIDDEN, "Admins only"),
                ("GET", "expos/my") => ok(json!([{ "_id": "e1", "title": "Spring Expo" }])),
                ("GET", "analytics/dashboard") => ok(json!({ "totalExpos": 3, "totalUsers": 12 })),
                ("GET", "feedback") => ok(json!([])),
                ("POST", "feedback") => ok(merged(json!({ "_id": "f1", "status": "open" }), &body)),
                ("PUT", "auth/profile") if body["company"] == "Taken Inc" => {
                    fail(StatusCode::CONFLICT, "Company name already taken")
                }
                ("PUT", "auth/profile") => {
                    let current = user_json(&role, &format!("{role}@expo.test"));
                    ok(json!({ "user": merged(merged(current, &json!({ "phone": "+1 555 0100" })), &body) }))
                }
                ("PUT", "auth/change-password") if body["currentPassword"] != PASSWORD => {
                    fail(StatusCode::BAD_REQUEST, "Current password is incorrect")
                }
                ("PUT", "auth/change-password") => ok(json!({ "message": "Password changed" })),
                ("POST", "expos") => ok(merged(json!({ "_id": "e-new", "status": "draft" }), &body)),
                ("PUT", r) if r.starts_with("expos/") => {
                    let id = r.trim_start_matches("expos/");
                    ok(merged(json!({ "_id": id }), &body))
                }
                ("POST", r) if r.starts_with("exhibitors/") => match r.trim_start_matches("exhibitors/").split_once('/') {
                    Some((id, "approve")) => ok(json!({ "_id": id, "companyName": "Acme", "status": "approved" })),
                    Some((id, "reject")) => ok(json!({ "_id": id, "companyName": "Acme", "status": "rejected" })),
                    _ => fail(StatusCode::NOT_FOUND, "Route not found"),
                },
                ("POST", r) if r.starts_with("expos/") && r.ends_with("/register") => {
                    let id = r.trim_start_matches("expos/").trim_end_matches("/register");
                    ok(json!({ "_id": "r1", "expo": id, "status": "registered" }))
                }
                ("POST", "sessions/full/book") => fail(StatusCode::BAD_REQUEST, "Session is full"),
                ("POST", r) if r.starts_with("sessions/") && r.ends_with("/book") => {
                    ok(json!({ "session": r.trim_start_matches("sessions/").trim_end_matches("/book"), "booked": true }))
                }
                ("DELETE", r) if r.starts_with("sessions/") && r.ends_with("/booking") => {
                    ok(json!({ "session": r.trim_start_matches("sessions/").trim_end_matches("/booking"), "booked": false }))
                }
                _ => fail(StatusCode::NOT_FOUND, "Route not found"),
            }
        }
    }
}
