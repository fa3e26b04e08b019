use crate::infra::{AppState, ProgramState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

use padrino::program::router::program_router;
use padrino::program::students::domain::StudentId;
use padrino::relay::RelayError;
use padrino::report::{financial_summary, write_balances_csv};
use padrino::store::StoreError;

pub(crate) fn with_program_routes(program: ProgramState) -> axum::Router {
    program_router(program.context.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reports/financial",
            axum::routing::get(financial_report_endpoint),
        )
        .route(
            "/api/v1/reports/balances.csv",
            axum::routing::get(balances_csv_endpoint),
        )
        .route(
            "/api/v1/students/:student_id/reminder",
            axum::routing::post(reminder_endpoint),
        )
        .layer(Extension(program))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn financial_report_endpoint(
    Extension(program): Extension<ProgramState>,
) -> impl IntoResponse {
    match program.context.students.list() {
        Ok(students) => {
            let summary = financial_summary(&students);
            (StatusCode::OK, Json(json!(summary))).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn balances_csv_endpoint(
    Extension(program): Extension<ProgramState>,
) -> impl IntoResponse {
    let students = match program.context.students.list() {
        Ok(students) => students,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    let mut buffer = Vec::new();
    if let Err(err) = write_balances_csv(&mut buffer, &students) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv")],
        buffer,
    )
        .into_response()
}

pub(crate) async fn reminder_endpoint(
    Extension(program): Extension<ProgramState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    match program
        .reminders
        .send_for_student(&StudentId(student_id))
    {
        Ok(response) => (StatusCode::OK, Json(json!(response))).into_response(),
        Err(RelayError::Store(StoreError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "student not found" })),
        )
            .into_response(),
        Err(err @ (RelayError::MissingSponsor | RelayError::InvalidEmail { .. })) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
