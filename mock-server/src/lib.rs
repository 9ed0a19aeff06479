use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct List {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub done: bool,
    pub limit: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

#[derive(Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ListInput {
    pub title: String,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub limit: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub done: Option<bool>,
    /// `null` clears the deadline, a missing field keeps it.
    #[serde(default, deserialize_with = "present")]
    pub limit: Option<Option<DateTime<Utc>>>,
}

fn present<'de, D>(d: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(d).map(Some)
}

/// Error envelope returned for every failed call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "ErrorCode")]
    pub code: u16,
    #[serde(rename = "ErrorMessageEN")]
    pub message_en: String,
    #[serde(rename = "ErrorMessageJP")]
    pub message_jp: String,
}

#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: &'static str,
}

impl Failure {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            message_en: self.message.to_string(),
            message_jp: self.message.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

struct Account {
    user: User,
    password: String,
}

struct StoredList {
    owner: String,
    list: List,
}

struct StoredTask {
    list_id: String,
    task: Task,
}

#[derive(Default)]
pub struct Data {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    lists: Vec<StoredList>,
    tasks: Vec<StoredTask>,
}

impl Data {
    fn owns(&self, user_id: &str, list_id: &str) -> bool {
        self.lists
            .iter()
            .any(|stored| stored.owner == user_id && stored.list.id == list_id)
    }
}

pub type Db = Arc<RwLock<Data>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Data::default()));
    Router::new()
        .route("/signin", post(sign_in))
        .route("/users", get(current_user).post(sign_up))
        .route("/lists", get(list_lists).post(create_list))
        .route("/lists/{id}", put(update_list).delete(delete_list))
        .route("/lists/{list_id}/tasks", get(list_tasks).post(create_task))
        .route(
            "/lists/{list_id}/tasks/{task_id}",
            put(update_task).delete(delete_task),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn issue_token(data: &mut Data, user_id: &str) -> String {
    let token = Uuid::new_v4().to_string();
    data.tokens.insert(token.clone(), user_id.to_string());
    token
}

/// Resolve the bearer token to a user id.
fn authenticate(data: &Data, headers: &HeaderMap) -> Result<String, Failure> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(Failure::unauthorized)?;
    data.tokens
        .get(token)
        .cloned()
        .ok_or_else(Failure::unauthorized)
}

async fn sign_in(State(db): State<Db>, Json(input): Json<SignIn>) -> Result<Json<Token>, Failure> {
    let mut data = db.write().await;
    let user_id = data
        .accounts
        .iter()
        .find(|account| account.user.email == input.email && account.password == input.password)
        .map(|account| account.user.id.clone())
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Wrong email or password"))?;
    let token = issue_token(&mut data, &user_id);
    debug!(%user_id, "signed in");
    Ok(Json(Token { token }))
}

async fn sign_up(
    State(db): State<Db>,
    Json(input): Json<SignUp>,
) -> Result<(StatusCode, Json<Token>), Failure> {
    if !input.email.contains('@') || input.name.trim().is_empty() || input.password.is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Invalid sign-up input"));
    }
    let mut data = db.write().await;
    if data.accounts.iter().any(|account| account.user.email == input.email) {
        return Err(Failure::new(StatusCode::CONFLICT, "Email is already registered"));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        email: input.email,
    };
    let token = issue_token(&mut data, &user.id);
    info!(user_id = %user.id, "account created");
    data.accounts.push(Account {
        user,
        password: input.password,
    });
    Ok((StatusCode::CREATED, Json(Token { token })))
}

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    let data = db.read().await;
    let user_id = authenticate(&data, &headers)?;
    data.accounts
        .iter()
        .find(|account| account.user.id == user_id)
        .map(|account| Json(account.user.clone()))
        .ok_or_else(Failure::unauthorized)
}

async fn list_lists(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<List>>, Failure> {
    let data = db.read().await;
    let user_id = authenticate(&data, &headers)?;
    Ok(Json(
        data.lists
            .iter()
            .filter(|stored| stored.owner == user_id)
            .map(|stored| stored.list.clone())
            .collect(),
    ))
}

async fn create_list(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ListInput>,
) -> Result<(StatusCode, Json<List>), Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if input.title.trim().is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Title is required"));
    }
    let list = List {
        id: Uuid::new_v4().to_string(),
        title: input.title,
    };
    data.lists.push(StoredList {
        owner,
        list: list.clone(),
    });
    Ok((StatusCode::CREATED, Json(list)))
}

async fn update_list(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ListInput>,
) -> Result<Json<List>, Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if input.title.trim().is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Title is required"));
    }
    let stored = data
        .lists
        .iter_mut()
        .find(|stored| stored.owner == owner && stored.list.id == id)
        .ok_or_else(Failure::not_found)?;
    stored.list.title = input.title;
    Ok(Json(stored.list.clone()))
}

async fn delete_list(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if !data.owns(&owner, &id) {
        return Err(Failure::not_found());
    }
    data.lists.retain(|stored| stored.list.id != id);
    data.tasks.retain(|stored| stored.list_id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(list_id): Path<String>,
) -> Result<Json<Vec<Task>>, Failure> {
    let data = db.read().await;
    let owner = authenticate(&data, &headers)?;
    if !data.owns(&owner, &list_id) {
        return Err(Failure::not_found());
    }
    Ok(Json(
        data.tasks
            .iter()
            .filter(|stored| stored.list_id == list_id)
            .map(|stored| stored.task.clone())
            .collect(),
    ))
}

async fn create_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(list_id): Path<String>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if !data.owns(&owner, &list_id) {
        return Err(Failure::not_found());
    }
    if input.title.trim().is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Title is required"));
    }
    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        detail: input.detail,
        done: input.done,
        limit: input.limit,
    };
    data.tasks.push(StoredTask {
        list_id,
        task: task.clone(),
    });
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((list_id, task_id)): Path<(String, String)>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if !data.owns(&owner, &list_id) {
        return Err(Failure::not_found());
    }
    let stored = data
        .tasks
        .iter_mut()
        .find(|stored| stored.list_id == list_id && stored.task.id == task_id)
        .ok_or_else(Failure::not_found)?;
    let task = &mut stored.task;
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(detail) = input.detail {
        task.detail = detail;
    }
    if let Some(done) = input.done {
        task.done = done;
    }
    if let Some(limit) = input.limit {
        task.limit = limit;
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((list_id, task_id)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    let mut data = db.write().await;
    let owner = authenticate(&data, &headers)?;
    if !data.owns(&owner, &list_id) {
        return Err(Failure::not_found());
    }
    let before = data.tasks.len();
    data.tasks
        .retain(|stored| !(stored.list_id == list_id && stored.task.id == task_id));
    if data.tasks.len() == before {
        return Err(Failure::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
