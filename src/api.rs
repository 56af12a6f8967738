//! HTTP surface for Rusty Roster.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Reachability marker.
//! - `POST /students` – Validate and store a student (`201`, `409` on duplicate id, `422` on
//!   invalid input).
//! - `GET /students` – List every stored student.
//! - `GET /students/{id}` – Fetch one student (`404` when absent).
//! - `PUT /students/{id}` – Partial update; empty strings and `0` keep stored values.
//! - `DELETE /students/{id}` – Remove a student (`204`).
//! - `GET /students/{id}/summary` – Natural-language summary; always `200` for known students.
//! - `GET /metrics` – Registry counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Every error leaves through [`AppError`], which renders the
//! `{"status":"error","message":...}` envelope. Unknown routes, unsupported methods, and handler
//! panics are mapped to the same envelope.

use crate::metrics::MetricsSnapshot;
use crate::roster::{
    FieldError, RosterApi, RosterError, Student, StudentId, StudentPayload, StudentSummary,
};
use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Build the HTTP router exposing the registry API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RosterApi + 'static,
{
    Router::new()
        .route("/", get(home).fallback(method_not_allowed))
        .route(
            "/students",
            get(list_students::<S>)
                .post(create_student::<S>)
                .fallback(method_not_allowed),
        )
        .route(
            "/students/:student_id",
            get(get_student::<S>)
                .put(update_student::<S>)
                .delete(delete_student::<S>)
                .fallback(method_not_allowed),
        )
        .route(
            "/students/:student_id/summary",
            get(student_summary::<S>).fallback(method_not_allowed),
        )
        .route(
            "/metrics",
            get(get_metrics::<S>).fallback(method_not_allowed),
        )
        .route("/commands", get(get_commands).fallback(method_not_allowed))
        .fallback(route_not_found)
        .with_state(service)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn home() -> Json<&'static str> {
    Json("Base route")
}

/// Create a student, assigning an id when the body carries none.
async fn create_student<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), AppError>
where
    S: RosterApi,
{
    let Json(payload) = payload?;
    let student = service.create_student(payload)?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn list_students<S>(State(service): State<Arc<S>>) -> Result<Json<Vec<Student>>, AppError>
where
    S: RosterApi,
{
    Ok(Json(service.list_students()?))
}

async fn get_student<S>(
    State(service): State<Arc<S>>,
    student_id: Result<Path<StudentId>, PathRejection>,
) -> Result<Json<Student>, AppError>
where
    S: RosterApi,
{
    let Path(student_id) = student_id?;
    Ok(Json(service.get_student(student_id)?))
}

/// Overwrite the provided fields of a student.
///
/// Fields sent as an empty string or `0` are treated as omitted and keep the stored value.
async fn update_student<S>(
    State(service): State<Arc<S>>,
    student_id: Result<Path<StudentId>, PathRejection>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<Json<Student>, AppError>
where
    S: RosterApi,
{
    let Path(student_id) = student_id?;
    let Json(payload) = payload?;
    Ok(Json(service.update_student(student_id, payload)?))
}

async fn delete_student<S>(
    State(service): State<Arc<S>>,
    student_id: Result<Path<StudentId>, PathRejection>,
) -> Result<StatusCode, AppError>
where
    S: RosterApi,
{
    let Path(student_id) = student_id?;
    service.delete_student(student_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Summarize a student. Backend failures come back as `200` with the reason in the text.
async fn student_summary<S>(
    State(service): State<Arc<S>>,
    student_id: Result<Path<StudentId>, PathRejection>,
) -> Result<Json<StudentSummary>, AppError>
where
    S: RosterApi,
{
    let Path(student_id) = student_id?;
    Ok(Json(service.summarize_student(student_id).await?))
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: RosterApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by clients and tools.
async fn get_commands() -> Json<CommandsResponse> {
    let student_example = json!({ "name": "Ann", "age": 30, "email": "ann@x.com" });
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "create_student",
                method: "POST",
                path: "/students",
                description: "Store a student. `id` is optional and assigned when omitted.",
                request_example: Some(student_example),
            },
            CommandDescriptor {
                name: "list_students",
                method: "GET",
                path: "/students",
                description: "Return every stored student.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_student",
                method: "GET",
                path: "/students/{id}",
                description: "Return one student by id.",
                request_example: None,
            },
            CommandDescriptor {
                name: "update_student",
                method: "PUT",
                path: "/students/{id}",
                description: "Overwrite the non-empty, non-zero fields provided in the body.",
                request_example: Some(json!({ "age": 31 })),
            },
            CommandDescriptor {
                name: "delete_student",
                method: "DELETE",
                path: "/students/{id}",
                description: "Remove a student.",
                request_example: None,
            },
            CommandDescriptor {
                name: "student_summary",
                method: "GET",
                path: "/students/{id}/summary",
                description: "Return { \"student_id\": number, \"summary\": string } written by the configured model.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return registry counters.",
                request_example: None,
            },
        ],
    })
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    tracing::debug!(%method, path = uri.path(), "Method not allowed");
    AppError::MethodNotAllowed
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Roster(RosterError::Internal(details)).into_response()
}

/// Error envelope returned by every failing route.
#[derive(Serialize)]
struct ErrorEnvelope {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<&'static str>,
}

impl ErrorEnvelope {
    fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            details: None,
            redirect_url: None,
        }
    }
}

/// Single translation point from failures to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure raised by the registry.
    Roster(RosterError),
    /// No route matched the requested path.
    RouteNotFound(String),
    /// The path exists but does not accept the request method.
    MethodNotAllowed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            Self::Roster(RosterError::InvalidInput(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorEnvelope {
                    details: Some(json!(errors)),
                    ..ErrorEnvelope::new("Invalid input data")
                },
            ),
            Self::Roster(RosterError::Conflict(message)) => {
                (StatusCode::CONFLICT, ErrorEnvelope::new(message))
            }
            Self::Roster(RosterError::NotFound(message)) => (
                StatusCode::NOT_FOUND,
                ErrorEnvelope {
                    redirect_url: Some("/"),
                    ..ErrorEnvelope::new(message)
                },
            ),
            Self::Roster(RosterError::BadRequest(message)) => {
                (StatusCode::BAD_REQUEST, ErrorEnvelope::new(message))
            }
            Self::Roster(RosterError::Internal(details)) => {
                tracing::error!(error = %details, "Unexpected error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorEnvelope {
                        details: Some(json!(details)),
                        ..ErrorEnvelope::new("Internal server error")
                    },
                )
            }
            Self::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                ErrorEnvelope {
                    redirect_url: Some("/"),
                    ..ErrorEnvelope::new(format!("Page '{path}' not found"))
                },
            ),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorEnvelope::new("Method Not Allowed"),
            ),
        };
        (status, Json(envelope)).into_response()
    }
}

impl From<RosterError> for AppError {
    fn from(inner: RosterError) -> Self {
        Self::Roster(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Roster(RosterError::InvalidInput(vec![FieldError::new(
            "body",
            rejection.body_text(),
        )]))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Roster(RosterError::InvalidInput(vec![FieldError::new(
            "student_id",
            rejection.body_text(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::metrics::MetricsSnapshot;
    use crate::roster::{
        RosterApi, RosterError, RosterService, Student, StudentId, StudentPayload, StudentSummary,
    };
    use crate::summarization::{SummarizationClient, SummarizationClientError};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubSummarizer {
        fail: bool,
    }

    #[async_trait]
    impl SummarizationClient for StubSummarizer {
        async fn summarize(&self, student: &Student) -> Result<String, SummarizationClientError> {
            if self.fail {
                Err(SummarizationClientError::ProviderUnavailable(
                    "connection refused".into(),
                ))
            } else {
                Ok(format!("{} is a {}-year-old student.", student.name, student.age))
            }
        }
    }

    fn app(fail_summaries: bool) -> Router {
        create_router(Arc::new(RosterService::new(Arc::new(StubSummarizer {
            fail: fail_summaries,
        }))))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    fn ann() -> Value {
        json!({"name": "Ann", "age": 30, "email": "ann@x.com"})
    }

    #[tokio::test]
    async fn home_route_is_reachable() {
        let (status, body) = send(&app(false), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Base route"));
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_without_reuse() {
        let app = app(false);
        let (status, a) = send(&app, Method::POST, "/students", Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(a["id"], 1);

        let (_, b) = send(&app, Method::POST, "/students", Some(ann())).await;
        assert_eq!(b["id"], 2);

        let (status, body) = send(&app, Method::DELETE, "/students/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, c) = send(&app, Method::POST, "/students", Some(ann())).await;
        assert_eq!(c["id"], 3);

        let (status, list) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = list
            .as_array()
            .expect("array")
            .iter()
            .map(|student| student["id"].as_i64().expect("id"))
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn duplicate_id_returns_conflict() {
        let app = app(false);
        let mut first = ann();
        first["id"] = json!(10);
        let (status, _) = send(&app, Method::POST, "/students", Some(first)).await;
        assert_eq!(status, StatusCode::CREATED);

        let other = json!({"id": 10, "name": "Bo", "age": 44, "email": "bo@y.org"});
        let (status, body) = send(&app, Method::POST, "/students", Some(other)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Student ID 10 already exists");
    }

    #[tokio::test]
    async fn invalid_age_is_unprocessable() {
        let app = app(false);
        for age in [0, 201] {
            let payload = json!({"name": "Ann", "age": age, "email": "ann@x.com"});
            let (status, body) = send(&app, Method::POST, "/students", Some(payload)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["message"], "Invalid input data");
            let details = body["details"].as_array().expect("details");
            assert!(details.iter().any(|detail| detail["field"] == "age"));
        }
    }

    #[tokio::test]
    async fn overlong_email_is_unprocessable() {
        let email = format!("{}@example.com", "x".repeat(100));
        let payload = json!({"name": "Ann", "age": 30, "email": email});
        let (status, body) = send(&app(false), Method::POST, "/students", Some(payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn malformed_body_is_unprocessable() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/students")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["details"][0]["field"], "body");
    }

    #[tokio::test]
    async fn non_numeric_id_is_unprocessable() {
        let (status, body) = send(&app(false), Method::GET, "/students/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "student_id");
    }

    #[tokio::test]
    async fn deleted_student_is_not_found() {
        let app = app(false);
        send(&app, Method::POST, "/students", Some(ann())).await;
        send(&app, Method::DELETE, "/students/1", None).await;

        let (status, body) = send(&app, Method::GET, "/students/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Student with id 1 not found");
        assert_eq!(body["redirect_url"], "/");

        let (status, body) = send(&app, Method::DELETE, "/students/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["redirect_url"], "/");
    }

    #[tokio::test]
    async fn update_ignores_falsy_fields_and_applies_others() {
        let app = app(false);
        send(&app, Method::POST, "/students", Some(ann())).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/students/1",
            Some(json!({"name": "", "age": 0, "email": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ann");
        assert_eq!(body["age"], 30);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/students/1",
            Some(json!({"name": "Annie"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Annie");
        assert_eq!(body["email"], "ann@x.com");

        let (status, _) = send(&app, Method::PUT, "/students/77", Some(json!({"age": 5}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_with_conflicting_body_id_is_bad_request() {
        let app = app(false);
        send(&app, Method::POST, "/students", Some(ann())).await;
        let (status, body) =
            send(&app, Method::PUT, "/students/1", Some(json!({"id": 2}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn summary_returns_generated_text() {
        let app = app(false);
        send(&app, Method::POST, "/students", Some(ann())).await;
        let (status, body) = send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"student_id": 1, "summary": "Ann is a 30-year-old student."})
        );
    }

    #[tokio::test]
    async fn summary_failure_is_still_ok() {
        let app = app(true);
        send(&app, Method::POST, "/students", Some(ann())).await;

        let (status, body) = send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        let summary = body["summary"].as_str().expect("summary");
        assert!(summary.starts_with("Error generating summary:"));
        assert!(summary.contains("connection refused"));

        let (status, _) = send(&app, Method::GET, "/students/9999/summary", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, metrics) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(metrics["summary_fallbacks"], 1);
        assert_eq!(metrics["students_created"], 1);
    }

    #[tokio::test]
    async fn unknown_route_points_home() {
        let (status, body) = send(&app(false), Method::GET, "/teachers", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Page '/teachers' not found");
        assert_eq!(body["redirect_url"], "/");
    }

    #[tokio::test]
    async fn wrong_method_renders_error_envelope() {
        let app = app(false);
        for (method, uri) in [
            (Method::PATCH, "/students/1"),
            (Method::DELETE, "/students"),
            (Method::POST, "/students/1/summary"),
        ] {
            let (status, body) = send(&app, method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert_eq!(body["status"], "error");
            assert_eq!(body["message"], "Method Not Allowed");
        }
    }

    #[tokio::test]
    async fn commands_catalog_lists_student_routes() {
        let commands = get_commands().await.0.commands;
        let create = commands
            .iter()
            .find(|cmd| cmd.name == "create_student")
            .expect("create command present");
        assert_eq!(create.method, "POST");
        assert_eq!(create.path, "/students");
        assert!(commands.iter().any(|cmd| cmd.path == "/students/{id}/summary"));
    }

    struct FaultyRoster;

    #[async_trait]
    impl RosterApi for FaultyRoster {
        fn create_student(&self, _payload: StudentPayload) -> Result<Student, RosterError> {
            Err(RosterError::Internal("store offline".into()))
        }

        fn list_students(&self) -> Result<Vec<Student>, RosterError> {
            panic!("registry exploded")
        }

        fn get_student(&self, id: StudentId) -> Result<Student, RosterError> {
            Err(RosterError::student_not_found(id))
        }

        fn update_student(
            &self,
            id: StudentId,
            _payload: StudentPayload,
        ) -> Result<Student, RosterError> {
            Err(RosterError::student_not_found(id))
        }

        fn delete_student(&self, id: StudentId) -> Result<(), RosterError> {
            Err(RosterError::student_not_found(id))
        }

        async fn summarize_student(&self, id: StudentId) -> Result<StudentSummary, RosterError> {
            Err(RosterError::student_not_found(id))
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }

    #[tokio::test]
    async fn internal_errors_and_panics_render_500_envelope() {
        let app = create_router(Arc::new(FaultyRoster));

        let (status, body) = send(&app, Method::POST, "/students", Some(ann())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["details"], "store offline");

        let (status, body) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["details"], "registry exploded");
    }
}
