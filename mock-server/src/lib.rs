use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SEED_USERNAME: &str = "testuser";
pub const SEED_PASSWORD: &str = "testpassword";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub subject: String,
    pub content: String,
    pub user: Option<User>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionList {
    pub total: usize,
    pub question_list: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct QuestionCreate {
    pub subject: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
    #[serde(default)]
    pub keyword: String,
}

fn default_page_size() -> i64 {
    10
}

#[derive(Default)]
pub struct Db {
    pub passwords: HashMap<String, String>,
    pub tokens: HashMap<String, String>,
    pub questions: Vec<Question>,
}

pub type SharedDb = Arc<RwLock<Db>>;

/// FastAPI-style error body: `{"detail": ...}`.
pub struct ApiError {
    status: StatusCode,
    detail: Value,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<Value>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Could not validate credentials")
    }

    fn invalid(field: &str, msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!([{ "loc": ["body", field], "msg": msg.into() }]),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

/// Seeded with one user and two questions.
pub fn seed() -> Db {
    let user = User {
        username: SEED_USERNAME.to_string(),
    };
    let mut db = Db::default();
    db.passwords
        .insert(SEED_USERNAME.to_string(), SEED_PASSWORD.to_string());
    db.questions = (1..=2)
        .map(|id| Question {
            id,
            subject: format!("Test question {id}"),
            content: format!("Test content {id}"),
            user: Some(user.clone()),
        })
        .collect();
    db
}

pub fn app() -> Router {
    let db: SharedDb = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/api/user/login", post(login))
        .route("/api/question/list", get(question_list))
        .route("/api/question/detail/{id}", get(question_detail))
        .route("/api/question/create", post(question_create))
        .route("/api/debug/echo", any(echo))
        .route("/api/debug/not-json", get(not_json))
        .route("/api/debug/fail", get(fail))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<SharedDb>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Form(input) = form?;
    let mut db = db.write().await;
    if db.passwords.get(&input.username) != Some(&input.password) {
        tracing::info!(username = %input.username, "login rejected");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Incorrect username or password",
        ));
    }
    let token = Uuid::new_v4().to_string();
    db.tokens.insert(token.clone(), input.username.clone());
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        username: input.username,
    }))
}

async fn question_list(
    State(db): State<SharedDb>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<QuestionList>, ApiError> {
    let Query(params) = params?;
    if params.page < 0 {
        return Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "page must be >= 0"));
    }
    if !(1..=100).contains(&params.size) {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "size must be between 1 and 100",
        ));
    }

    let size = params.size as usize;
    let skip = usize::try_from(params.page)
        .ok()
        .and_then(|page| page.checked_mul(size))
        .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "page out of range"))?;

    let keyword = params.keyword.to_lowercase();
    let db = db.read().await;
    let mut matches: Vec<&Question> = db
        .questions
        .iter()
        .filter(|q| {
            keyword.is_empty()
                || q.subject.to_lowercase().contains(&keyword)
                || q.content.to_lowercase().contains(&keyword)
        })
        .collect();
    matches.sort_by(|a, b| b.id.cmp(&a.id));

    let total = matches.len();
    let question_list = matches
        .into_iter()
        .skip(skip)
        .take(size)
        .cloned()
        .collect();
    Ok(Json(QuestionList {
        total,
        question_list,
    }))
}

async fn question_detail(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
) -> Result<Json<Question>, ApiError> {
    let db = db.read().await;
    db.questions
        .iter()
        .find(|q| q.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "question not found"))
}

async fn question_create(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    input: Result<Json<QuestionCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let username = current_user(&db, &headers).await?;
    let Json(input) = input?;
    if input.subject.trim().is_empty() {
        return Err(ApiError::invalid("subject", "empty values are not allowed"));
    }
    if input.content.trim().is_empty() {
        return Err(ApiError::invalid("content", "empty values are not allowed"));
    }

    let mut db = db.write().await;
    let id = db.questions.iter().map(|q| q.id).max().unwrap_or(0) + 1;
    db.questions.push(Question {
        id,
        subject: input.subject,
        content: input.content,
        user: Some(User { username }),
    });
    Ok((StatusCode::CREATED, Json(Value::Null)))
}

/// Resolve the bearer token in `headers` to a username.
async fn current_user(db: &SharedDb, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)?;
    db.read()
        .await
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(ApiError::unauthorized)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "content_type": header_str(header::CONTENT_TYPE),
        "accept": header_str(header::ACCEPT),
        "authorization": header_str(header::AUTHORIZATION),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn not_json() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html>not json</html>",
    )
}

async fn fail() -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_user_and_questions() {
        let db = seed();
        assert_eq!(db.passwords.get(SEED_USERNAME).map(String::as_str), Some(SEED_PASSWORD));
        assert_eq!(db.questions.len(), 2);
        assert!(db.tokens.is_empty());
    }

    #[test]
    fn list_params_have_defaults() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 0);
        assert_eq!(params.size, 10);
        assert_eq!(params.keyword, "");
    }

    #[test]
    fn question_create_rejects_missing_content() {
        let result: Result<QuestionCreate, _> = serde_json::from_str(r#"{"subject":"Hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn api_error_renders_detail_body() {
        let error = ApiError::invalid("subject", "empty values are not allowed");
        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.detail[0]["loc"][1], "subject");
    }
}
