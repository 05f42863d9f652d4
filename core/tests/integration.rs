//! End-to-end dispatch against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives the
//! dispatcher over real HTTP through `ReqwestTransport`. The echo route lets
//! tests see exactly what went over the wire.

use std::sync::Arc;

use dispatch_core::{
    to_params, ApiError, ClientConfig, Dispatcher, ErrorDetail, LoginResponse, MemorySession,
    Navigator, Outcome, Params, QuestionCreate, QuestionList, Rejection, RequestIntent,
    ReqwestTransport, SessionState, SessionStore,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

struct ChannelNavigator(mpsc::UnboundedSender<String>);

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: &str) {
        let _ = self.0.send(route.to_string());
    }
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn dispatcher(base_url: &str, session: Arc<MemorySession>) -> Dispatcher {
    Dispatcher::new(
        ClientConfig::new(base_url),
        Arc::new(ReqwestTransport::new()),
        session,
    )
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn success(outcome: Outcome) -> Value {
    match outcome {
        Outcome::Success(payload) => payload,
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn login_create_and_list_lifecycle() {
    let base = start_server().await;
    let session = Arc::new(MemorySession::new());
    let d = dispatcher(&base, session.clone());

    // Step 1: log in with the seeded user.
    let payload = success(
        d.send(
            RequestIntent::login("/api/user/login")
                .with_params(params(json!({"username": "testuser", "password": "testpassword"}))),
        )
        .await,
    );
    let login: LoginResponse = serde_json::from_value(payload).unwrap();
    session.sign_in(&login);
    assert!(session.snapshot().logged_in);

    // Step 2: create a question with the stored token.
    let payload = success(
        d.send(
            RequestIntent::post("/api/question/create").with_params(
                to_params(&QuestionCreate {
                    subject: "Integration".to_string(),
                    content: "From the dispatcher".to_string(),
                })
                .unwrap(),
            ),
        )
        .await,
    );
    assert_eq!(payload, Value::Null);

    // Step 3: list with a keyword filter.
    let payload = success(
        d.send(
            RequestIntent::get("/api/question/list")
                .with_params(params(json!({"page": 0, "size": 10, "keyword": "Integration"}))),
        )
        .await,
    );
    let list: QuestionList = serde_json::from_value(payload).unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.question_list[0].content, "From the dispatcher");
    assert_eq!(
        list.question_list[0].user.as_ref().map(|u| u.username.as_str()),
        Some("testuser")
    );
}

#[tokio::test]
async fn get_params_travel_as_query_without_authorization() {
    let base = start_server().await;
    let d = dispatcher(&base, Arc::new(MemorySession::new()));

    let echo = success(
        d.send(RequestIntent::get("/api/debug/echo").with_params(params(json!({"limit": 10}))))
            .await,
    );
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["query"], "limit=10");
    assert_eq!(echo["accept"], "application/json");
    assert_eq!(echo["content_type"], "application/json");
    assert_eq!(echo["authorization"], Value::Null);
    assert_eq!(echo["body"], "");
}

#[tokio::test]
async fn login_operation_sends_form_body() {
    let base = start_server().await;
    let d = dispatcher(&base, Arc::new(MemorySession::new()));
    let (tx, rx) = oneshot::channel();

    d.dispatch(
        "login",
        "/api/debug/echo",
        Some(params(json!({"username": "a", "password": "b"}))),
        Some(Box::new(move |payload: Value| {
            let _ = tx.send(payload);
        })),
        None,
    );

    let echo = rx.await.unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["content_type"], "application/x-www-form-urlencoded");
    assert_eq!(echo["body"], "username=a&password=b");
    assert_eq!(echo["query"], Value::Null);
}

#[tokio::test]
async fn put_sends_json_body_with_bearer_token() {
    let base = start_server().await;
    let session = Arc::new(MemorySession::with_state(SessionState {
        access_token: "tok-123".to_string(),
        username: "someone".to_string(),
        logged_in: true,
    }));
    let d = dispatcher(&base, session);

    let echo = success(
        d.send(
            RequestIntent::put("/api/debug/echo")
                .with_params(params(json!({"question_id": 1, "subject": "s", "content": "c"}))),
        )
        .await,
    );
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["authorization"], "Bearer tok-123");
    let body: Value = serde_json::from_str(echo["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({"question_id": 1, "subject": "s", "content": "c"}));
}

#[tokio::test]
async fn rejected_token_signs_out_and_skips_callbacks() {
    let base = start_server().await;
    let session = Arc::new(MemorySession::with_state(SessionState {
        access_token: "expired".to_string(),
        username: "testuser".to_string(),
        logged_in: true,
    }));
    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let d = dispatcher(&base, session.clone()).with_navigator(Arc::new(ChannelNavigator(nav_tx)));
    let (success_tx, success_rx) = oneshot::channel::<Value>();
    let (failure_tx, failure_rx) = oneshot::channel::<Rejection>();

    d.dispatch(
        "post",
        "/api/question/create",
        Some(params(json!({"subject": "Hi", "content": "There"}))),
        Some(Box::new(move |payload: Value| {
            let _ = success_tx.send(payload);
        })),
        Some(Box::new(move |rejection: Rejection| {
            let _ = failure_tx.send(rejection);
        })),
    );

    assert_eq!(nav_rx.recv().await.as_deref(), Some("/user-login"));
    assert!(success_rx.await.is_err());
    assert!(failure_rx.await.is_err());
    assert_eq!(session.snapshot(), SessionState::default());
}

#[tokio::test]
async fn validation_error_reaches_failure_callback() {
    let base = start_server().await;
    let session = Arc::new(MemorySession::new());
    let d = dispatcher(&base, session.clone());

    let login: LoginResponse = serde_json::from_value(success(
        d.send(
            RequestIntent::login("/api/user/login")
                .with_params(params(json!({"username": "testuser", "password": "testpassword"}))),
        )
        .await,
    ))
    .unwrap();
    session.sign_in(&login);

    let (tx, rx) = oneshot::channel();
    d.dispatch(
        "post",
        "/api/question/create",
        Some(params(json!({"subject": "", "content": "body"}))),
        None,
        Some(Box::new(move |rejection: Rejection| {
            let _ = tx.send(rejection);
        })),
    );

    let rejection = rx.await.unwrap();
    let detail: ErrorDetail = serde_json::from_value(rejection.payload().unwrap().clone()).unwrap();
    assert_eq!(detail.detail[0]["loc"][1], "subject");
    assert!(session.snapshot().logged_in);
}

#[tokio::test]
async fn non_json_success_body_is_replaced() {
    let base = start_server().await;
    let d = dispatcher(&base, Arc::new(MemorySession::new()));

    let outcome = d.send(RequestIntent::get("/api/debug/not-json")).await;
    assert!(outcome.is_success());
    assert_eq!(
        outcome,
        Outcome::Success(json!({"error": "parse failed", "status": 200}))
    );
}

#[tokio::test]
async fn other_statuses_are_failures() {
    let base = start_server().await;
    let d = dispatcher(&base, Arc::new(MemorySession::new()));

    let outcome = d.send(RequestIntent::get("/api/debug/fail")).await;
    assert_eq!(
        outcome,
        Outcome::Failure {
            status: 500,
            payload: json!({"detail": "internal error"})
        }
    );

    let outcome = d.send(RequestIntent::get("/api/question/detail/999")).await;
    assert!(matches!(outcome, Outcome::Failure { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Bind and immediately release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = Arc::new(MemorySession::with_state(SessionState {
        access_token: "keep-me".to_string(),
        username: "testuser".to_string(),
        logged_in: true,
    }));
    let d = dispatcher(&format!("http://{addr}"), session.clone());

    let (tx, rx) = oneshot::channel();
    d.dispatch(
        "get",
        "/api/question/list",
        None,
        None,
        Some(Box::new(move |rejection: Rejection| {
            let _ = tx.send(rejection);
        })),
    );

    let rejection = rx.await.unwrap();
    assert!(matches!(rejection, Rejection::Network(ApiError::Transport(_))));
    assert_eq!(session.access_token().as_deref(), Some("keep-me"));
}
