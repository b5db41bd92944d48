#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use anime_catalog_client::config::{ApiConfig, Endpoints};
use anime_catalog_client::models::{Banner, CatalogEntry, Comment, ContentType};
use anime_catalog_client::session::MemoryTokenStore;
use anime_catalog_client::CatalogSession;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const VIEWER_EMAIL: &str = "viewer@example.com";
pub const VIEWER_TOKEN: &str = "viewer-token";
pub const PASSWORD: &str = "password123";

/// One request as seen by the stub content API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub auth_token: Option<String>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// In-memory stand-in for the remote content API.
pub struct StubState {
    pub entries: Mutex<Vec<CatalogEntry>>,
    pub comments: Mutex<HashMap<i64, Vec<Comment>>>,
    pub ratings: Mutex<HashMap<i64, Vec<u8>>>,
    pub banners: Mutex<Vec<Banner>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    slow_searches: Mutex<HashMap<String, u64>>,
    next_id: AtomicI64,
}

fn entry(id: i64, title: &str, content_type: ContentType, genre: &str, year: i32, rating: f64, count: i64) -> CatalogEntry {
    CatalogEntry {
        id,
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        content_type,
        genre: genre.to_string(),
        year,
        episodes: if content_type == ContentType::Movie { 1 } else { 12 },
        rating,
        rating_count: count,
        thumbnail_url: Some(format!("https://cdn.example.com/{}.png", id)),
        video_url: None,
        music_url: None,
        created_at: Some("2024-01-01T00:00:00".to_string()),
        updated_at: None,
        comments: None,
    }
}

impl StubState {
    pub fn seeded() -> Self {
        let entries = vec![
            entry(1, "Space Pirate", ContentType::Series, "Adventure", 2024, 9.2, 5),
            entry(2, "Last Samurai", ContentType::Movie, "Action", 2024, 8.8, 3),
            entry(3, "Chronicles of Magic", ContentType::Series, "Fantasy", 2023, 9.5, 8),
            entry(42, "Hero Academy", ContentType::Series, "Action", 2022, 7.0, 2),
        ];

        let mut comments = HashMap::new();
        comments.insert(
            1,
            vec![Comment {
                id: 1,
                comment_text: "Great show".to_string(),
                email: VIEWER_EMAIL.to_string(),
                created_at: Some("2024-02-01T10:00:00".to_string()),
            }],
        );

        let mut ratings = HashMap::new();
        ratings.insert(42, vec![6, 8]);

        let banners = vec![
            Banner {
                id: 1,
                title: "Summer season".to_string(),
                image_url: "https://cdn.example.com/summer.png".to_string(),
                link_url: Some("https://example.com/summer".to_string()),
                display_order: 2,
                is_active: true,
            },
            Banner {
                id: 2,
                title: "Retired promo".to_string(),
                image_url: "https://cdn.example.com/old.png".to_string(),
                link_url: None,
                display_order: 0,
                is_active: false,
            },
            Banner {
                id: 3,
                title: "New releases".to_string(),
                image_url: "https://cdn.example.com/new.png".to_string(),
                link_url: None,
                display_order: 1,
                is_active: true,
            },
        ];

        Self {
            entries: Mutex::new(entries),
            comments: Mutex::new(comments),
            ratings: Mutex::new(ratings),
            banners: Mutex::new(banners),
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            slow_searches: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(100),
        }
    }

    /// Make an operation fail. Keys: `list`, `list:<search>`, `get:<id>`, `create`, `update`,
    /// `delete:<id>`, `rate`, `comment`, `login`, `register`, `password`,
    /// `upload`, `banners`.
    pub fn fail(&self, op: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op.to_string(), (status, message.to_string()));
    }

    pub fn clear_failure(&self, op: &str) {
        self.failures.lock().unwrap().remove(op);
    }

    /// Delay list responses whose `search` parameter equals `term`.
    pub fn slow_search(&self, term: &str, millis: u64) {
        self.slow_searches.lock().unwrap().insert(term.to_string(), millis);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests matching a method and path, oldest first.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Listing requests (GET /anime without an id).
    pub fn list_requests(&self) -> Vec<RecordedRequest> {
        self.requests_to("GET", "/anime")
            .into_iter()
            .filter(|r| !r.query.contains_key("id"))
            .collect()
    }

    pub fn entry(&self, id: i64) -> Option<CatalogEntry> {
        self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }

    fn record(&self, req: &HttpRequest, body: &[u8]) {
        let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
            .map(|q| q.into_inner())
            .unwrap_or_default();
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            query,
            auth_token: header("X-Auth-Token"),
            content_type: header("Content-Type"),
            file_name: header("X-File-Name"),
            body: body.to_vec(),
        });
    }

    fn injected(&self, op: &str) -> Option<HttpResponse> {
        self.failures.lock().unwrap().get(op).map(|(status, message)| {
            let status = actix_web::http::StatusCode::from_u16(*status)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(json!({ "error": message }))
        })
    }
}

fn token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn user_for(token: Option<&str>) -> Option<Value> {
    match token {
        Some(ADMIN_TOKEN) => Some(json!({ "id": 1, "email": ADMIN_EMAIL, "is_admin": true })),
        Some(VIEWER_TOKEN) => Some(json!({ "id": 2, "email": VIEWER_EMAIL, "is_admin": false })),
        _ => None,
    }
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(json!({ "error": "Admin access required" }))
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "error": "Authentication required" }))
}

async fn verify(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &[]);
    match user_for(token(&req).as_deref()) {
        Some(user) => HttpResponse::Ok().json(json!({ "user": user })),
        None => HttpResponse::Unauthorized().json(json!({ "error": "Invalid token" })),
    }
}

async fn authenticate(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let action = payload["action"].as_str().unwrap_or("");
    let email = payload["email"].as_str().unwrap_or("");
    let password = payload["password"].as_str().unwrap_or("");

    if let Some(resp) = state.injected(action) {
        return resp;
    }

    match action {
        "login" => {
            let token = match (email, password) {
                (ADMIN_EMAIL, PASSWORD) => ADMIN_TOKEN,
                (VIEWER_EMAIL, PASSWORD) => VIEWER_TOKEN,
                _ => {
                    return HttpResponse::Unauthorized()
                        .json(json!({ "error": "Invalid email or password" }))
                }
            };
            HttpResponse::Ok().json(json!({ "token": token, "user": user_for(Some(token)) }))
        }
        "register" => {
            if email == ADMIN_EMAIL || email == VIEWER_EMAIL {
                return HttpResponse::BadRequest().json(json!({ "error": "Email already registered" }));
            }
            HttpResponse::Ok().json(json!({
                "token": VIEWER_TOKEN,
                "user": { "id": 3, "email": email, "is_admin": false }
            }))
        }
        _ => HttpResponse::BadRequest().json(json!({ "error": "Unknown action" })),
    }
}

async fn get_anime(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<StubState>,
) -> HttpResponse {
    state.record(&req, &[]);

    if let Some(id) = query.get("id").and_then(|v| v.parse::<i64>().ok()) {
        if let Some(resp) = state.injected(&format!("get:{}", id)) {
            return resp;
        }
        return match state.entry(id) {
            Some(mut found) => {
                let comments = state.comments.lock().unwrap().get(&id).cloned().unwrap_or_default();
                found.comments = Some(comments);
                HttpResponse::Ok().json(found)
            }
            None => HttpResponse::NotFound().json(json!({ "error": "Anime not found" })),
        };
    }

    if let Some(search) = query.get("search") {
        let delay = state.slow_searches.lock().unwrap().get(search).copied();
        if let Some(millis) = delay {
            actix_web::rt::time::sleep(Duration::from_millis(millis)).await;
        }
        if let Some(resp) = state.injected(&format!("list:{}", search)) {
            return resp;
        }
    }

    if let Some(resp) = state.injected("list") {
        return resp;
    }

    // Parameters are applied literally, so a leaked sentinel matches nothing
    let entries: Vec<CatalogEntry> = state
        .entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| query.get("type").map_or(true, |t| e.content_type.as_str() == t.as_str()))
        .filter(|e| query.get("genre").map_or(true, |g| &e.genre == g))
        .filter(|e| query.get("year").map_or(true, |y| e.year.to_string() == *y))
        .filter(|e| {
            query
                .get("search")
                .map_or(true, |s| e.title.to_lowercase().contains(&s.to_lowercase()))
        })
        .cloned()
        .collect();
    HttpResponse::Ok().json(entries)
}

async fn create_anime(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    if token(&req).as_deref() != Some(ADMIN_TOKEN) {
        return forbidden();
    }
    if let Some(resp) = state.injected("create") {
        return resp;
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut fields = payload.clone();
    fields["id"] = json!(id);
    fields["rating"] = json!(0);
    fields["rating_count"] = json!(0);
    let created: CatalogEntry = match serde_json::from_value(fields) {
        Ok(created) => created,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };
    state.entries.lock().unwrap().push(created.clone());
    HttpResponse::Ok().json(created)
}

async fn update_anime(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    if token(&req).as_deref() != Some(ADMIN_TOKEN) {
        return forbidden();
    }
    if let Some(resp) = state.injected("update") {
        return resp;
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let id = match payload["id"].as_i64() {
        Some(id) => id,
        None => return HttpResponse::BadRequest().json(json!({ "error": "Anime ID required" })),
    };

    let mut entries = state.entries.lock().unwrap();
    let slot = match entries.iter_mut().find(|e| e.id == id) {
        Some(slot) => slot,
        None => return HttpResponse::NotFound().json(json!({ "error": "Anime not found" })),
    };
    let mut fields = payload.clone();
    fields["rating"] = json!(slot.rating);
    fields["rating_count"] = json!(slot.rating_count);
    fields["updated_at"] = json!("2024-06-01T12:00:00");
    match serde_json::from_value::<CatalogEntry>(fields) {
        Ok(updated) => {
            *slot = updated.clone();
            HttpResponse::Ok().json(updated)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    }
}

async fn delete_anime(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<StubState>,
) -> HttpResponse {
    state.record(&req, &[]);
    if token(&req).as_deref() != Some(ADMIN_TOKEN) {
        return forbidden();
    }
    let id = match query.get("id").and_then(|v| v.parse::<i64>().ok()) {
        Some(id) => id,
        None => return HttpResponse::BadRequest().json(json!({ "error": "Anime ID required" })),
    };
    if let Some(resp) = state.injected(&format!("delete:{}", id)) {
        return resp;
    }
    state.entries.lock().unwrap().retain(|e| e.id != id);
    HttpResponse::Ok().finish()
}

async fn rate(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    if user_for(token(&req).as_deref()).is_none() {
        return unauthorized();
    }
    if let Some(resp) = state.injected("rate") {
        return resp;
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let (id, value) = match (payload["anime_id"].as_i64(), payload["rating"].as_u64()) {
        (Some(id), Some(value)) if (1..=10).contains(&value) => (id, value as u8),
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "anime_id and rating (1-10) required" }))
        }
    };

    let (mean, count) = {
        let mut ratings = state.ratings.lock().unwrap();
        let scores = ratings.entry(id).or_default();
        scores.push(value);
        let sum: u32 = scores.iter().map(|&s| s as u32).sum();
        (sum as f64 / scores.len() as f64, scores.len() as i64)
    };
    if let Some(slot) = state.entries.lock().unwrap().iter_mut().find(|e| e.id == id) {
        slot.rating = mean;
        slot.rating_count = count;
    }
    // NUMERIC columns come back as strings from the real backend
    HttpResponse::Ok().json(json!({ "rating": format!("{:.2}", mean), "rating_count": count }))
}

async fn create_comment(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    let user = match user_for(token(&req).as_deref()) {
        Some(user) => user,
        None => return unauthorized(),
    };
    if let Some(resp) = state.injected("comment") {
        return resp;
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let (id, text) = match (payload["anime_id"].as_i64(), payload["comment_text"].as_str()) {
        (Some(id), Some(text)) => (id, text.to_string()),
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "anime_id and comment_text required" }))
        }
    };

    let mut comments = state.comments.lock().unwrap();
    let thread = comments.entry(id).or_default();
    let comment = Comment {
        id: thread.len() as i64 + 100,
        comment_text: text,
        email: user["email"].as_str().unwrap_or_default().to_string(),
        created_at: Some("2024-06-01T12:00:00".to_string()),
    };
    thread.push(comment.clone());
    HttpResponse::Ok().json(comment)
}

async fn list_comments(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<StubState>,
) -> HttpResponse {
    state.record(&req, &[]);
    let id = match query.get("anime_id").and_then(|v| v.parse::<i64>().ok()) {
        Some(id) => id,
        None => return HttpResponse::BadRequest().json(json!({ "error": "anime_id required" })),
    };
    let comments = state.comments.lock().unwrap().get(&id).cloned().unwrap_or_default();
    HttpResponse::Ok().json(comments)
}

async fn change_password(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    if user_for(token(&req).as_deref()).is_none() {
        return HttpResponse::Unauthorized().json(json!({ "error": "Invalid token" }));
    }
    if let Some(resp) = state.injected("password") {
        return resp;
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let old = payload["old_password"].as_str().unwrap_or("");
    let new = payload["new_password"].as_str().unwrap_or("");
    if old != PASSWORD {
        return HttpResponse::Unauthorized().json(json!({ "error": "Wrong old password" }));
    }
    if !new.chars().any(|c| c.is_ascii_digit()) {
        return HttpResponse::BadRequest().json(json!({ "error": "Password must contain a digit" }));
    }
    HttpResponse::Ok().json(json!({ "message": "Password changed" }))
}

async fn upload(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &body);
    if user_for(token(&req).as_deref()).is_none() {
        return unauthorized();
    }
    if let Some(resp) = state.injected("upload") {
        return resp;
    }
    let name = req
        .headers()
        .get("X-File-Name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("file");
    HttpResponse::Ok().json(json!({ "url": format!("https://cdn.example.com/uploads/{}", name) }))
}

async fn banners(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, &[]);
    if let Some(resp) = state.injected("banners") {
        return resp;
    }
    let banners = state.banners.lock().unwrap().clone();
    HttpResponse::Ok().json(banners)
}

fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/auth")
            .route(web::get().to(verify))
            .route(web::post().to(authenticate)),
    )
    .service(
        web::resource("/anime")
            .route(web::get().to(get_anime))
            .route(web::post().to(create_anime))
            .route(web::put().to(update_anime))
            .route(web::delete().to(delete_anime)),
    )
    .service(web::resource("/ratings").route(web::post().to(rate)))
    .service(
        web::resource("/comments")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment)),
    )
    .service(web::resource("/change-password").route(web::post().to(change_password)))
    .service(web::resource("/upload").route(web::post().to(upload)))
    .service(web::resource("/banners").route(web::get().to(banners)));
}

pub struct TestServer {
    pub state: web::Data<StubState>,
    pub base_url: String,
    handle: ServerHandle,
}

impl TestServer {
    pub fn config(&self) -> ApiConfig {
        ApiConfig::new(Endpoints::from_base(&self.base_url))
    }

    /// A session with no stored token.
    pub fn anonymous(&self) -> CatalogSession {
        CatalogSession::new(&self.config(), MemoryTokenStore::new()).expect("client builds")
    }

    /// A session whose store already holds `token`, started and verified.
    pub async fn signed_in(&self, token: &str) -> CatalogSession {
        let app = CatalogSession::new(&self.config(), MemoryTokenStore::with_token(token))
            .expect("client builds");
        app.start().await;
        app
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

/// Start the stub content API on a random local port.
pub async fn start_server() -> TestServer {
    let state = web::Data::new(StubState::seeded());
    let data = state.clone();

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test port");
    let port = listener.local_addr().expect("local addr").port();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    TestServer {
        state,
        base_url: format!("http://127.0.0.1:{}", port),
        handle,
    }
}
