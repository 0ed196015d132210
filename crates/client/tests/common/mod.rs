//! In-process mock of the fleet REST backend plus a client harness.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use fleetadmin_client::{App, ChannelNotifier, CredentialStore, FileCredentialStore, Notification};

pub const SECRET: &str = "mock-backend-secret";
/// Penalty lookups for this driver id answer slowly.
pub const SLOW_DRIVER: &str = "slow-driver";

pub const ADMIN: (&str, &str) = ("admin@fleet.test", "admin-pass");
pub const CLERK: (&str, &str) = ("clerk@fleet.test", "clerk-pass");
pub const APPROVER: (&str, &str) = ("approver@fleet.test", "approver-pass");
/// Sent in the clerk's login response; the clerk's token carries no name.
pub const CLERK_NAME: &str = "Casey Clerk";

struct Account {
    role: &'static str,
    email: &'static str,
    password: &'static str,
    claims: Value,
    name: Option<&'static str>,
}

#[derive(Clone)]
struct MockState {
    accounts: Arc<Vec<Account>>,
    reject_tokens: Arc<AtomicBool>,
    fail_drivers: Arc<AtomicBool>,
    approved: Arc<Mutex<Vec<String>>>,
    penalties: Arc<Mutex<Vec<Value>>>,
    audit_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn mint(claims: Value) -> String {
    let mut claims = claims;
    if claims.get("exp").is_none() {
        claims["exp"] = json!(jsonwebtoken::get_current_timestamp() + 3600);
    }
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn accounts() -> Vec<Account> {
    vec![
        Account {
            role: "admin",
            email: ADMIN.0,
            password: ADMIN.1,
            claims: json!({ "id": 1, "role": "admin", "name": "Ada Admin", "email": ADMIN.0 }),
            name: Some("Ada Admin"),
        },
        Account {
            role: "staff",
            email: CLERK.0,
            password: CLERK.1,
            claims: json!({ "id": 2, "role": "staff", "permissions": ["add_penalties"], "email": CLERK.0 }),
            name: Some(CLERK_NAME),
        },
        Account {
            role: "staff",
            email: APPROVER.0,
            password: APPROVER.1,
            claims: json!({
                "id": 3,
                "role": "staff",
                "permissions": ["approve_drivers"],
                "name": "Pat Approver",
                "email": APPROVER.0,
            }),
            name: Some("Pat Approver"),
        },
    ]
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = MockState {
            accounts: Arc::new(accounts()),
            reject_tokens: Arc::new(AtomicBool::new(false)),
            fail_drivers: Arc::new(AtomicBool::new(false)),
            approved: Arc::new(Mutex::new(Vec::new())),
            penalties: Arc::new(Mutex::new(Vec::new())),
            audit_queries: Arc::new(Mutex::new(Vec::new())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/auth/:role/login", post(login))
            .route("/auth/validate", get(validate))
            .route("/stats", get(stats))
            .route("/drivers", get(drivers))
            .route("/drivers/:id/approve", patch(approve_driver))
            .route("/staff", get(staff))
            .route("/permissions", get(permissions))
            .route("/penalties", post(create_penalty))
            .route("/penalties/driver/:id", get(driver_penalties))
            .route("/audit", get(audit))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    /// From now on every bearer token is rejected with 401.
    pub fn reject_all_tokens(&self) {
        self.state.reject_tokens.store(true, Ordering::SeqCst);
    }

    pub fn fail_driver_listing(&self, fail: bool) {
        self.state.fail_drivers.store(fail, Ordering::SeqCst);
    }

    pub fn approved_drivers(&self) -> Vec<String> {
        self.state.approved.lock().unwrap().clone()
    }

    /// Bodies posted to `/penalties`.
    pub fn recorded_penalties(&self) -> Vec<Value> {
        self.state.penalties.lock().unwrap().clone()
    }

    pub fn audit_queries(&self) -> Vec<HashMap<String, String>> {
        self.state.audit_queries.lock().unwrap().clone()
    }

    pub fn seen_auth_headers(&self) -> Vec<String> {
        self.state.auth_headers.lock().unwrap().clone()
    }
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid or expired token" })),
    )
        .into_response()
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    state.auth_headers.lock().unwrap().push(value.to_string());

    if state.reject_tokens.load(Ordering::SeqCst) {
        return false;
    }
    let Some(token) = value.strip_prefix("Bearer ") else {
        return false;
    };
    jsonwebtoken::decode::<Value>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .is_ok()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<MockState>,
    Path(role): Path<String>,
    Json(body): Json<LoginBody>,
) -> Response {
    let account = state
        .accounts
        .iter()
        .find(|a| a.role == role && a.email == body.email && a.password == body.password);

    match account {
        Some(a) => Json(json!({
            "token": mint(a.claims.clone()),
            "user": { "name": a.name, "email": a.email },
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response(),
    }
}

async fn validate(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!({ "valid": true })).into_response()
}

async fn stats(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!({
        "totalDrivers": 3,
        "activeStaff": 2,
        "pendingApprovals": 1,
        "todayRevenue": 250.5,
    }))
    .into_response()
}

async fn drivers(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_drivers.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
            .into_response();
    }
    let approved = state.approved.lock().unwrap().clone();
    let list: Vec<Value> = ["10", "11"]
        .iter()
        .map(|id| {
            json!({
                "_id": id,
                "name": format!("Driver {id}"),
                "phone": format!("02412345{id}"),
                "ghanaCard": format!("GHA-0000000{id}-0"),
                "isApproved": approved.iter().any(|a| a == id),
                "penalties": [],
            })
        })
        .collect();
    Json(Value::Array(list)).into_response()
}

async fn approve_driver(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.approved.lock().unwrap().push(id.clone());
    Json(json!({ "_id": id, "isApproved": true })).into_response()
}

async fn staff(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!([
        { "_id": "2", "name": CLERK_NAME, "email": CLERK.0, "phone": "0201111111", "role": "staff", "permissions": ["add_penalties"] },
        { "_id": "3", "name": "Pat Approver", "email": APPROVER.0, "role": "staff", "permissions": ["approve_drivers"] },
    ]))
    .into_response()
}

async fn permissions(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!([
        { "name": "approve_drivers", "label": "Approve drivers" },
        { "name": "add_penalties", "label": "Add penalties" },
    ]))
    .into_response()
}

async fn driver_penalties(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id == SLOW_DRIVER {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    Json(json!([
        { "_id": format!("{id}-p1"), "driver": id, "type": "Number of Trips", "reason": "Short of target", "amount": 100.0, "paid": false },
        { "_id": format!("{id}-p2"), "driver": id, "type": "Overspeeding", "reason": "Highway", "amount": 50.0, "isPaid": true },
    ]))
    .into_response()
}

async fn create_penalty(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.penalties.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn audit(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.audit_queries.lock().unwrap().push(query.clone());
    let entries = [
        json!({
            "_id": "a1",
            "action": "driver.approved",
            "performedByDetails": { "name": "Pat Approver", "email": APPROVER.0 },
            "target": "10",
            "createdAt": "2026-03-02T10:00:00Z",
        }),
        json!({
            "_id": "a2",
            "action": "penalty.created",
            "performedByDetails": { "name": CLERK_NAME, "email": CLERK.0 },
            "target": "11",
            "timestamp": "2026-03-03T08:30:00Z",
        }),
    ];
    let list: Vec<Value> = entries
        .into_iter()
        .filter(|e| query.get("action").is_none_or(|action| e["action"] == action.as_str()))
        // Dates compare as text; both sides are ISO 8601.
        .filter(|e| {
            query.get("startDate").is_none_or(|start| {
                let at = e["createdAt"].as_str().or(e["timestamp"].as_str()).unwrap_or("");
                at >= start.as_str()
            })
        })
        .collect();
    // Pretend older entries exist on later pages.
    let total = list.len() + 40;
    Json(json!({ "logs": list, "total": total })).into_response()
}

/// Client wired to a mock backend with a file-backed credential store.
pub struct Harness {
    pub backend: MockBackend,
    pub app: App,
    pub store: Arc<FileCredentialStore>,
    notes: UnboundedReceiver<Notification>,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let backend = MockBackend::spawn().await;
        let url = backend.base_url.clone();
        Self::build(backend, &url, None)
    }

    /// Harness whose credential file already holds `token`.
    pub async fn with_stored_token(token: &str) -> Self {
        let backend = MockBackend::spawn().await;
        let url = backend.base_url.clone();
        Self::build(backend, &url, Some(token))
    }

    /// Harness pointed at an address nothing listens on.
    pub async fn unreachable(token: Option<&str>) -> Self {
        let backend = MockBackend::spawn().await;
        let url = dead_url().await;
        Self::build(backend, &url, token)
    }

    fn build(backend: MockBackend, api_url: &str, token: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
        if let Some(token) = token {
            store.save(token).unwrap();
        }
        let (notifier, notes) = ChannelNotifier::new();
        let app = App::with_store(
            api_url,
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Arc::new(notifier),
        );
        Self {
            backend,
            app,
            store,
            notes,
            _dir: dir,
        }
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.load().unwrap()
    }

    /// Take every notification raised so far.
    pub fn notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notes.try_recv() {
            out.push(n);
        }
        out
    }

    pub async fn signed_in(role: &str, account: (&str, &str)) -> Self {
        let mut harness = Self::new().await;
        harness.app.start().await;
        harness
            .app
            .session
            .login(role.parse().unwrap(), account.0, account.1)
            .await
            .expect("login should succeed");
        harness.notifications();
        harness
    }
}
