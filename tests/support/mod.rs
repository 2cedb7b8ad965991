//! In-memory stand-in for the task backend, served by axum on an ephemeral port.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose, Engine};
use serde_json::{json, Value};

use todo_web_client::{BasicAuth, ClientConfig, MemoryStore, PageController, TaskApi};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct StoredTask {
    id: i64,
    content: String,
    completed: bool,
    owner: String,
}

impl StoredTask {
    fn to_json(&self, owner_id: i64) -> Value {
        json!({
            "id": self.id,
            "content": self.content,
            "completed": self.completed,
            "created_at": "2024-05-01T10:00:00",
            "owner_id": owner_id,
        })
    }
}

#[derive(Debug, Default)]
struct BackendState {
    users: HashMap<String, (i64, String)>,
    tasks: Vec<StoredTask>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    register_override: Option<(StatusCode, String)>,
    list_delay: Option<Duration>,
    list_failures: usize,
}

impl BackendState {
    fn record(
        &mut self,
        method: Method,
        path: String,
        headers: &HeaderMap,
        fields: Vec<(String, String)>,
    ) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests.push(RecordedRequest {
            method,
            path,
            authorization,
            fields,
        });
    }

    fn current_user(&self, headers: &HeaderMap) -> Result<(String, i64), Response> {
        let unauthorized = || {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Incorrect email or password"})),
            )
                .into_response()
        };
        let decoded = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
            .and_then(|token| general_purpose::STANDARD.decode(token).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(unauthorized)?;
        let (email, password) = decoded.split_once(':').ok_or_else(unauthorized)?;
        match self.users.get(email) {
            Some((id, stored)) if stored == password => Ok((email.to_string(), *id)),
            _ => Err(unauthorized()),
        }
    }

    fn next_task_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let app = Router::new()
            .route("/register", post(register))
            .route("/tasks", get(get_tasks).post(add_task))
            .route("/tasks/:id", put(update_task).delete(delete_task))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service());
        tokio::spawn(server);

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add_user(&self, email: &str, password: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.users.len() as i64 + 1;
        state.users.insert(email.to_string(), (id, password.to_string()));
    }

    pub fn seed_task(&self, owner: &str, content: &str, completed: bool) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_task_id();
        state.tasks.push(StoredTask {
            id,
            content: content.to_string(),
            completed,
            owner: owner.to_string(),
        });
        id
    }

    pub fn fail_register_with(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().register_override = Some((status, body.to_string()));
    }

    /// Holds every `GET /tasks` for `delay` before answering.
    pub fn delay_task_list(&self, delay: Duration) {
        self.state.lock().unwrap().list_delay = Some(delay);
    }

    /// Answers the next `count` `GET /tasks` with a 500.
    pub fn fail_task_list(&self, count: usize) {
        self.state.lock().unwrap().list_failures = count;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().unwrap()
    }

    pub fn controller(
        &self,
        store: Arc<MemoryStore>,
    ) -> PageController<BasicAuth<Arc<MemoryStore>>> {
        let config = ClientConfig::default().with_api_url(&self.url());
        PageController::new(TaskApi::new(&config.api_url), BasicAuth::new(store), &config)
    }
}

/// A base URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn read_fields(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap();
        fields.push((name, value));
    }
    fields
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = read_fields(multipart).await;
    let mut state = state.lock().unwrap();
    state.record(Method::POST, "/register".into(), &headers, fields.clone());

    if let Some((status, body)) = state.register_override.clone() {
        return (status, body).into_response();
    }

    let get = |name: &str| {
        fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    };
    let (Some(email), Some(password), Some(_), Some(_)) =
        (get("email"), get("password"), get("first_name"), get("last_name"))
    else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"loc": ["body"], "msg": "field required"}]})),
        )
            .into_response();
    };
    if state.users.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Email already registered"})),
        )
            .into_response();
    }
    let id = state.users.len() as i64 + 1;
    state.users.insert(email, (id, password));
    Json(json!({"message": "User registered successfully"})).into_response()
}

async fn get_tasks(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let delay = state.lock().unwrap().list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let mut state = state.lock().unwrap();
    state.record(Method::GET, "/tasks".into(), &headers, Vec::new());
    if state.list_failures > 0 {
        state.list_failures -= 1;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal Server Error"})),
        )
            .into_response();
    }
    let (email, owner_id) = match state.current_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let tasks: Vec<Value> = state
        .tasks
        .iter()
        .filter(|task| task.owner == email)
        .map(|task| task.to_json(owner_id))
        .collect();
    Json(json!({"tasks": tasks})).into_response()
}

async fn add_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = read_fields(multipart).await;
    let mut state = state.lock().unwrap();
    state.record(Method::POST, "/tasks".into(), &headers, fields.clone());
    let (email, owner_id) = match state.current_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some((_, content)) = fields.into_iter().find(|(name, _)| name == "content") else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    let id = state.next_task_id();
    let task = StoredTask {
        id,
        content,
        completed: false,
        owner: email,
    };
    let body = json!({"success": true, "task": task.to_json(owner_id)});
    state.tasks.push(task);
    Json(body).into_response()
}

async fn update_task(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = read_fields(multipart).await;
    let mut state = state.lock().unwrap();
    state.record(Method::PUT, format!("/tasks/{id}"), &headers, fields.clone());
    let (email, owner_id) = match state.current_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(task) = state
        .tasks
        .iter_mut()
        .find(|task| task.id == id && task.owner == email)
    else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))).into_response();
    };
    for (name, value) in fields {
        match name.as_str() {
            "content" => task.content = value,
            "completed" => task.completed = value == "true",
            _ => {}
        }
    }
    Json(json!({"success": true, "task": task.to_json(owner_id)})).into_response()
}

async fn delete_task(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.record(Method::DELETE, format!("/tasks/{id}"), &headers, Vec::new());
    let (email, _) = match state.current_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let before = state.tasks.len();
    state.tasks.retain(|task| !(task.id == id && task.owner == email));
    if state.tasks.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))).into_response();
    }
    Json(json!({"success": true})).into_response()
}
