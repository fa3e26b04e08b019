use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::candidates::domain::{
    CandidateId, CandidatePatch, CandidateStatus, NewCandidate,
};
use super::candidates::registry::CandidateError;
use super::candidates::repository::CandidateStore;
use super::lifecycle::{LifecycleError, SponsorSelection};
use super::payments::domain::{NewPayment, PaymentId, PaymentPatch};
use super::payments::ledger::PaymentError;
use super::payments::repository::PaymentStore;
use super::sponsors::domain::{NewSponsor, SponsorId, SponsorPatch};
use super::sponsors::registry::SponsorError;
use super::sponsors::repository::SponsorStore;
use super::students::domain::{NewStudent, StudentId, StudentPatch, StudentStatus};
use super::students::registry::StudentError;
use super::students::repository::StudentStore;
use super::ProgramContext;
use crate::store::StoreError;

/// Router builder exposing the back-office JSON API. The timestamps every
/// operation needs are taken once here, at the HTTP boundary.
pub fn program_router<C, S, Z, P>(context: Arc<ProgramContext<C, S, Z, P>>) -> Router
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates",
            get(list_candidates::<C, S, Z, P>).post(create_candidate::<C, S, Z, P>),
        )
        .route("/api/v1/candidates/public", get(public_candidates::<C, S, Z, P>))
        .route(
            "/api/v1/candidates/:candidate_id",
            get(get_candidate::<C, S, Z, P>)
                .put(update_candidate::<C, S, Z, P>)
                .delete(delete_candidate::<C, S, Z, P>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/approve",
            post(approve_candidate::<C, S, Z, P>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/status",
            post(change_candidate_status::<C, S, Z, P>),
        )
        .route(
            "/api/v1/students",
            get(list_students::<C, S, Z, P>).post(create_student::<C, S, Z, P>),
        )
        .route(
            "/api/v1/students/:student_id",
            get(get_student::<C, S, Z, P>)
                .put(update_student::<C, S, Z, P>)
                .delete(delete_student::<C, S, Z, P>),
        )
        .route(
            "/api/v1/students/:student_id/payments",
            get(list_payments::<C, S, Z, P>).post(add_payment::<C, S, Z, P>),
        )
        .route(
            "/api/v1/students/:student_id/payments/:payment_id",
            put(update_payment::<C, S, Z, P>).delete(remove_payment::<C, S, Z, P>),
        )
        .route(
            "/api/v1/sponsors",
            get(list_sponsors::<C, S, Z, P>).post(create_sponsor::<C, S, Z, P>),
        )
        .route(
            "/api/v1/sponsors/:sponsor_id",
            get(get_sponsor::<C, S, Z, P>)
                .put(update_sponsor::<C, S, Z, P>)
                .delete(delete_sponsor::<C, S, Z, P>),
        )
        .with_state(context)
}

type Ctx<C, S, Z, P> = State<Arc<ProgramContext<C, S, Z, P>>>;

#[derive(Debug, Deserialize)]
struct CandidateListQuery {
    status: Option<CandidateStatus>,
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApproveRequest {
    #[serde(default)]
    sponsor: Option<SponsorSelection>,
}

#[derive(Debug, Deserialize)]
struct StatusChangeRequest {
    status: CandidateStatus,
    #[serde(default)]
    confirm_sponsor_release: bool,
}

#[derive(Debug, Deserialize)]
struct StudentListQuery {
    status: Option<StudentStatus>,
    academic_year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SponsorListQuery {
    q: Option<String>,
}

async fn create_candidate<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Json(intake): Json<NewCandidate>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.candidates.create(intake, Utc::now()) {
        Ok(candidate) => (StatusCode::CREATED, Json(candidate)).into_response(),
        Err(err) => candidate_error_response(err),
    }
}

async fn list_candidates<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Query(query): Query<CandidateListQuery>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    let result = match (query.status, query.period) {
        (Some(status), _) => context.candidates.list_by_status(status),
        (None, Some(period)) => context.candidates.list_by_period(&period),
        (None, None) => context.candidates.list(),
    };

    match result {
        Ok(candidates) => (StatusCode::OK, Json(candidates)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn public_candidates<C, S, Z, P>(State(context): Ctx<C, S, Z, P>) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.candidates.list_public() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_candidate<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.candidates.get(&CandidateId(candidate_id)) {
        Ok(candidate) => (StatusCode::OK, Json(candidate)).into_response(),
        Err(err) => candidate_error_response(err),
    }
}

async fn update_candidate<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(candidate_id): Path<String>,
    Json(patch): Json<CandidatePatch>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context
        .candidates
        .update(&CandidateId(candidate_id), patch, Utc::now())
    {
        Ok(candidate) => (StatusCode::OK, Json(candidate)).into_response(),
        Err(err) => candidate_error_response(err),
    }
}

async fn delete_candidate<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.candidates.delete(&CandidateId(candidate_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn approve_candidate<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(candidate_id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.lifecycle.approve_candidate(
        &CandidateId(candidate_id),
        request.sponsor,
        Utc::now(),
    ) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => lifecycle_error_response(err),
    }
}

async fn change_candidate_status<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(candidate_id): Path<String>,
    Json(request): Json<StatusChangeRequest>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.lifecycle.change_candidate_status(
        &CandidateId(candidate_id),
        request.status,
        request.confirm_sponsor_release,
        Utc::now(),
    ) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => lifecycle_error_response(err),
    }
}

async fn create_student<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Json(intake): Json<NewStudent>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.students.create(intake, Utc::now()) {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(err) => student_error_response(err),
    }
}

async fn list_students<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Query(query): Query<StudentListQuery>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    let result = match (query.status, query.academic_year) {
        (Some(status), _) => context.students.list_by_status(status),
        (None, Some(year)) => context.students.list_by_academic_year(&year),
        (None, None) => context.students.list(),
    };

    match result {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_student<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(student_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.students.get(&StudentId(student_id)) {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(err) => student_error_response(err),
    }
}

/// Student edits route through the lifecycle facade so the paired candidate
/// mirror stays in step; the response carries the composite outcome.
async fn update_student<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(student_id): Path<String>,
    Json(patch): Json<StudentPatch>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context
        .lifecycle
        .save_student(&StudentId(student_id), patch, Utc::now())
    {
        Ok(write) => (StatusCode::OK, Json(write)).into_response(),
        Err(err) => lifecycle_error_response(err),
    }
}

async fn delete_student<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(student_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.delete_student(&StudentId(student_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => student_error_response(err),
    }
}

async fn list_payments<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(student_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.ledger.list_for_student(&StudentId(student_id)) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn add_payment<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(student_id): Path<String>,
    Json(intake): Json<NewPayment>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context
        .ledger
        .add(&StudentId(student_id), intake, Utc::now())
    {
        Ok(write) => (StatusCode::CREATED, Json(write)).into_response(),
        Err(err) => payment_error_response(err),
    }
}

async fn update_payment<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path((student_id, payment_id)): Path<(String, String)>,
    Json(patch): Json<PaymentPatch>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.ledger.update(
        &StudentId(student_id),
        &PaymentId(payment_id),
        patch,
        Utc::now(),
    ) {
        Ok(write) => (StatusCode::OK, Json(write)).into_response(),
        Err(err) => payment_error_response(err),
    }
}

async fn remove_payment<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path((student_id, payment_id)): Path<(String, String)>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.ledger.remove(
        &StudentId(student_id),
        &PaymentId(payment_id),
        Utc::now(),
    ) {
        Ok(refresh) => (StatusCode::OK, Json(json!({ "refresh": refresh }))).into_response(),
        Err(err) => payment_error_response(err),
    }
}

async fn create_sponsor<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Json(intake): Json<NewSponsor>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.sponsors.create(intake, Utc::now()) {
        Ok(sponsor) => (StatusCode::CREATED, Json(sponsor)).into_response(),
        Err(err) => sponsor_error_response(err),
    }
}

async fn list_sponsors<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Query(query): Query<SponsorListQuery>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    let result = match query.q {
        Some(term) => context.sponsors.search(&term),
        None => context.sponsors.list(),
    };

    match result {
        Ok(sponsors) => (StatusCode::OK, Json(sponsors)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_sponsor<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(sponsor_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.sponsors.get(&SponsorId(sponsor_id)) {
        Ok(sponsor) => (StatusCode::OK, Json(sponsor)).into_response(),
        Err(err) => sponsor_error_response(err),
    }
}

async fn update_sponsor<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(sponsor_id): Path<String>,
    Json(patch): Json<SponsorPatch>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context
        .sponsors
        .update(&SponsorId(sponsor_id), patch, Utc::now())
    {
        Ok(sponsor) => (StatusCode::OK, Json(sponsor)).into_response(),
        Err(err) => sponsor_error_response(err),
    }
}

async fn delete_sponsor<C, S, Z, P>(
    State(context): Ctx<C, S, Z, P>,
    Path(sponsor_id): Path<String>,
) -> Response
where
    C: CandidateStore + 'static,
    S: StudentStore + 'static,
    Z: SponsorStore + 'static,
    P: PaymentStore + 'static,
{
    match context.sponsors.delete(&SponsorId(sponsor_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn store_error_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, err.to_string())
}

fn candidate_error_response(err: CandidateError) -> Response {
    match err {
        CandidateError::Store(store) => store_error_response(store),
        validation => error_body(StatusCode::UNPROCESSABLE_ENTITY, validation.to_string()),
    }
}

fn student_error_response(err: StudentError) -> Response {
    match err {
        StudentError::Store(store) => store_error_response(store),
        validation => error_body(StatusCode::UNPROCESSABLE_ENTITY, validation.to_string()),
    }
}

fn sponsor_error_response(err: SponsorError) -> Response {
    match err {
        SponsorError::Store(store) => store_error_response(store),
        validation => error_body(StatusCode::UNPROCESSABLE_ENTITY, validation.to_string()),
    }
}

fn payment_error_response(err: PaymentError) -> Response {
    match err {
        PaymentError::Store(store) => store_error_response(store),
        validation => error_body(StatusCode::UNPROCESSABLE_ENTITY, validation.to_string()),
    }
}

fn lifecycle_error_response(err: LifecycleError) -> Response {
    match err {
        LifecycleError::SponsorRequired => {
            error_body(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        LifecycleError::SponsorReleaseUnconfirmed => {
            error_body(StatusCode::CONFLICT, err.to_string())
        }
        LifecycleError::Candidate(inner) => candidate_error_response(inner),
        LifecycleError::Sponsor(inner) => sponsor_error_response(inner),
        LifecycleError::Student(inner) => student_error_response(inner),
        LifecycleError::Store(store) => store_error_response(store),
    }
}
