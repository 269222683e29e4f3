use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::controller::{SubmitError, SubmitOutcome};
use super::domain::{CommissionAnswer, ExperienceType, FormField};
use super::service::{ApplicationIntakeService, EditOutcome};
use super::sessions::{SessionError, SessionId};
use super::sink::SubmissionSink;

#[derive(Debug, Deserialize)]
pub(crate) struct ToggleRequest {
    pub(crate) value: ExperienceType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommissionRequest {
    pub(crate) answer: CommissionAnswer,
}

/// Router builder exposing the application form over HTTP.
pub fn application_router<S>(service: Arc<ApplicationIntakeService<S>>) -> Router
where
    S: SubmissionSink + 'static,
{
    Router::new()
        .route("/api/v1/applications/options", get(options_handler::<S>))
        .route("/api/v1/applications", post(open_handler::<S>))
        .route(
            "/api/v1/applications/:session_id",
            get(view_handler::<S>).delete(close_handler::<S>),
        )
        .route(
            "/api/v1/applications/:session_id/fields",
            put(field_handler::<S>),
        )
        .route(
            "/api/v1/applications/:session_id/experience-types",
            post(toggle_handler::<S>),
        )
        .route(
            "/api/v1/applications/:session_id/commission-only",
            put(commission_handler::<S>),
        )
        .route(
            "/api/v1/applications/:session_id/submit",
            post(submit_handler::<S>),
        )
        .with_state(service)
}

fn session_error_response(error: SessionError) -> Response {
    let status = match error {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::AtCapacity { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn edit_response(result: Result<EditOutcome, SessionError>) -> Response {
    match result {
        Ok(EditOutcome {
            applied: true,
            view,
        }) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(EditOutcome { view, .. }) => {
            let payload = json!({
                "error": format!("application is {}", view.state.label()),
                "view": view,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn options_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    (StatusCode::OK, axum::Json(service.options().clone())).into_response()
}

pub(crate) async fn open_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.open() {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.view(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn close_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.close(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn field_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(field): axum::Json<FormField>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    edit_response(service.set_field(&SessionId(session_id), field))
}

pub(crate) async fn toggle_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<ToggleRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    edit_response(service.toggle_experience_type(&SessionId(session_id), request.value))
}

pub(crate) async fn commission_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<CommissionRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    edit_response(service.set_commission_only(&SessionId(session_id), request.answer))
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<ApplicationIntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    let attempt = match service.submit(&SessionId(session_id)).await {
        Ok(attempt) => attempt,
        Err(error) => return session_error_response(error),
    };

    match attempt.outcome {
        Ok(SubmitOutcome::Submitted(_))
        | Ok(SubmitOutcome::Blocked)
        | Ok(SubmitOutcome::Ignored) => (StatusCode::OK, axum::Json(attempt.view)).into_response(),
        Err(SubmitError::Validation(error)) => {
            let payload = json!({
                "error": error.user_message(),
                "reason": error.to_string(),
                "view": attempt.view,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(SubmitError::Send(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "view": attempt.view,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}
