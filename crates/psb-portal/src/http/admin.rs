use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use super::access::AdminAccess;
use super::error::ApiError;
use super::extract::{JsonBody, QueryParams};
use super::{AppState, ApplicationQuery};
use crate::schema::{Application, Job, JobListing, JobPatch, NewJob, NewNotice, Notice, NoticePatch};
use crate::workflow::ReviewDecision;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/applications", get(applications))
        .route("/api/admin/applications/:id", put(review))
        .route("/api/admin/jobs", get(jobs).post(create_job))
        .route("/api/admin/jobs/:id", put(update_job))
        .route("/api/admin/notices", get(notices).post(create_notice))
        .route("/api/admin/notices/:id", put(update_notice))
}

async fn applications(
    State(state): State<AppState>,
    _access: AdminAccess,
    QueryParams(query): QueryParams<ApplicationQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    Ok(Json(state.workflow.list(query.into()).await?))
}

async fn review(
    State(state): State<AppState>,
    access: AdminAccess,
    Path(id): Path<i32>,
    JsonBody(decision): JsonBody<ReviewDecision>,
) -> Result<Json<Application>, ApiError> {
    Ok(Json(
        state.workflow.review(id, access.role(), decision).await?,
    ))
}

async fn jobs(
    State(state): State<AppState>,
    _access: AdminAccess,
) -> Result<Json<Vec<JobListing>>, ApiError> {
    Ok(Json(state.jobs.all_jobs().await?))
}

async fn create_job(
    State(state): State<AppState>,
    access: AdminAccess,
    JsonBody(job): JsonBody<NewJob>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.jobs.create(job, &access.user.id).await?))
}

async fn update_job(
    State(state): State<AppState>,
    _access: AdminAccess,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<JobPatch>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.jobs.update(id, patch).await?))
}

async fn notices(
    State(state): State<AppState>,
    _access: AdminAccess,
) -> Result<Json<Vec<Notice>>, ApiError> {
    Ok(Json(state.notices.all().await?))
}

async fn create_notice(
    State(state): State<AppState>,
    access: AdminAccess,
    JsonBody(notice): JsonBody<NewNotice>,
) -> Result<Json<Notice>, ApiError> {
    Ok(Json(state.notices.create(notice, &access.user.id).await?))
}

async fn update_notice(
    State(state): State<AppState>,
    _access: AdminAccess,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<NoticePatch>,
) -> Result<Json<Notice>, ApiError> {
    Ok(Json(state.notices.update(id, patch).await?))
}
