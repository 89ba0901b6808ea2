#![allow(dead_code)]

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use jsonwebtoken::{encode, EncodingKey, Header};
use medicare_session::api_client::ApiClient;
use medicare_session::auth::{
    HttpAuthBackend, KeyValueStorage, MemoryStorage, SessionManager, TokenStore,
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use medicare_session::navigation::NavigationHistory;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshMode {
    /// Issue a new pair and revoke the presented refresh token
    Rotate,
    /// 200 with `success: false`
    Reject,
    /// 500 without a body
    Fail,
}

/// State of the mock REST API
pub struct MockApi {
    pub refresh_calls: AtomicUsize,
    pub employee_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub refresh_delay_ms: AtomicU64,
    pub always_unauthorized: AtomicBool,
    pub refresh_mode: Mutex<RefreshMode>,
    pub accepted_access: Mutex<String>,
    pub expected_refresh: Mutex<String>,
    pub user_role: Mutex<String>,
    generation: AtomicUsize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            employee_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            refresh_delay_ms: AtomicU64::new(0),
            always_unauthorized: AtomicBool::new(false),
            refresh_mode: Mutex::new(RefreshMode::Rotate),
            accepted_access: Mutex::new(String::new()),
            expected_refresh: Mutex::new("R0".to_string()),
            user_role: Mutex::new("admin".to_string()),
            generation: AtomicUsize::new(0),
        }
    }
}

impl MockApi {
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn employee_count(&self) -> usize {
        self.employee_calls.load(Ordering::SeqCst)
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_role(&self, role: &str) {
        *self.user_role.lock().unwrap() = role.to_string();
    }

    /// Make the server accept `token` as a valid bearer.
    pub fn accept(&self, token: &str) {
        *self.accepted_access.lock().unwrap() = token.to_string();
    }

    fn issue_pair(&self) -> (String, String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = mint_token(3600, generation);
        let refresh = format!("R{}", generation);
        *self.accepted_access.lock().unwrap() = access.clone();
        *self.expected_refresh.lock().unwrap() = refresh.clone();
        (access, refresh)
    }

    fn is_authorized(&self, req: &HttpRequest) -> bool {
        if self.always_unauthorized.load(Ordering::SeqCst) {
            return false;
        }
        let accepted = self.accepted_access.lock().unwrap().clone();
        let presented = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        !accepted.is_empty() && presented == Some(accepted.as_str())
    }
}

/// A signed JWT expiring `exp_offset` seconds from now.
pub fn mint_token(exp_offset: i64, generation: usize) -> String {
    let claims = json!({
        "sub": "1",
        "exp": chrono::Utc::now().timestamp() + exp_offset,
        "gen": generation,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"mock-api-secret-at-least-32-bytes"),
    )
    .expect("Failed to mint token")
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({"success": false, "message": "Token expired"}))
}

async fn login(state: web::Data<MockApi>, body: web::Json<Value>) -> HttpResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    let identifier = body["usernameOrEmail"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let role = match (identifier, password) {
        ("admin", "secret") => "admin",
        ("doctor", "secret") => "user",
        ("locked", _) => {
            return HttpResponse::Ok().json(json!({"success": false}));
        }
        _ => {
            return HttpResponse::Unauthorized()
                .json(json!({"success": false, "message": "Invalid credentials"}));
        }
    };

    state.set_role(role);
    let (access, refresh) = state.issue_pair();
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "accessToken": access,
            "refreshToken": refresh,
            "user": {"id": 1, "username": identifier, "role": role}
        }
    }))
}

async fn refresh(state: web::Data<MockApi>, body: web::Json<Value>) -> HttpResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let mode = *state.refresh_mode.lock().unwrap();
    match mode {
        RefreshMode::Reject => HttpResponse::Ok()
            .json(json!({"success": false, "message": "Invalid refresh token"})),
        RefreshMode::Fail => HttpResponse::InternalServerError().finish(),
        RefreshMode::Rotate => {
            let presented = body["refreshToken"].as_str().unwrap_or_default();
            let expected = state.expected_refresh.lock().unwrap().clone();
            if presented != expected {
                return HttpResponse::Unauthorized()
                    .json(json!({"success": false, "message": "Refresh token revoked"}));
            }
            let (access, refresh) = state.issue_pair();
            HttpResponse::Ok().json(json!({
                "success": true,
                "data": {"accessToken": access, "refreshToken": refresh}
            }))
        }
    }
}

async fn me(state: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if !state.is_authorized(&req) {
        return unauthorized();
    }
    let role = state.user_role.lock().unwrap().clone();
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "id": 1,
            "username": "lan.tran",
            "email": "lan@medicare.vn",
            "fullname": "Tran Thi Lan",
            "role": role
        }
    }))
}

async fn list_employees(state: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    state.employee_calls.fetch_add(1, Ordering::SeqCst);
    if !state.is_authorized(&req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(json!({
        "data": [
            {"id": 1, "name": "Nguyen Van An", "position": "doctor"},
            {"id": 2, "name": "Le Thi Binh", "position": "nurse"}
        ]
    }))
}

async fn create_employee(
    state: web::Data<MockApi>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    if !state.is_authorized(&req) {
        return unauthorized();
    }
    let mut employee = body.into_inner();
    employee["id"] = json!(3);
    HttpResponse::Created().json(json!({"success": true, "data": employee}))
}

async fn delete_employee(state: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    if !state.is_authorized(&req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(json!({"success": true}))
}

async fn list_departments(state: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    if !state.is_authorized(&req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(json!([
        {"id": 1, "name": "Cardiology"},
        {"id": 2, "name": "Pediatrics"},
        {"id": 3, "name": "Radiology"}
    ]))
}

async fn public_echo(req: HttpRequest) -> HttpResponse {
    let authorization = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    HttpResponse::Ok().json(json!({"authorization": authorization}))
}

async fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(json!({"success": false, "message": "Admins only"}))
}

async fn broken() -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(json!({"success": false, "message": "Database unavailable"}))
}

async fn slow() -> HttpResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    HttpResponse::Ok().json(json!({"success": true}))
}

pub struct TestApp {
    pub address: String,
    pub mock: web::Data<MockApi>,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<NavigationHistory>,
    pub session: Arc<SessionManager>,
    pub api: ApiClient,
}

impl TestApp {
    /// Put a token pair into storage as if a previous run had logged in.
    pub fn seed_tokens(&self, access: &str, refresh: &str) {
        self.storage
            .set_many(&[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)]);
    }

    pub fn stored_access(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn stored_refresh(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_timeout(Duration::from_secs(10)).await
}

pub async fn spawn_app_with_timeout(timeout: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mock = web::Data::new(MockApi::default());
    let server_state = mock.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .route("/api/auth/login", web::post().to(login))
            .route("/api/auth/refresh", web::post().to(refresh))
            .route("/api/auth/me", web::get().to(me))
            .route("/api/employees", web::get().to(list_employees))
            .route("/api/employees", web::post().to(create_employee))
            .route("/api/employees/{id}", web::delete().to(delete_employee))
            .route("/api/departments", web::get().to(list_departments))
            .route("/api/public/echo", web::get().to(public_echo))
            .route("/api/forbidden", web::get().to(forbidden))
            .route("/api/broken", web::get().to(broken))
            .route("/api/slow", web::get().to(slow))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to bind address")
    .run();
    let _ = tokio::spawn(server);

    let (storage, navigator, session, api) = client_for(&address, timeout);

    TestApp {
        address,
        mock,
        storage,
        navigator,
        session,
        api,
    }
}

/// Session stack pointed at `address`.
pub fn client_for(
    address: &str,
    timeout: Duration,
) -> (
    Arc<MemoryStorage>,
    Arc<NavigationHistory>,
    Arc<SessionManager>,
    ApiClient,
) {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client");

    let storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(NavigationHistory::new());
    let backend = Arc::new(HttpAuthBackend::new(address, http_client.clone()));
    let session = Arc::new(SessionManager::new(
        TokenStore::new(storage.clone()),
        backend,
        navigator.clone(),
    ));
    let api = ApiClient::new(address, http_client, session.clone());

    (storage, navigator, session, api)
}
