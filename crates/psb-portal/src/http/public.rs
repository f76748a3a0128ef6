use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::error::ApiError;
use super::extract::QueryParams;
use super::AppState;
use crate::schema::{Constituency, County, JobListing, Notice, ReferenceCatalog, Ward};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/public/jobs", get(list_jobs))
        .route("/api/public/jobs/:id", get(job))
        .route("/api/public/notices", get(notices))
        .route("/api/public/counties", get(counties))
        .route("/api/public/constituencies/:county_id", get(constituencies))
        .route("/api/public/wards/:constituency_id", get(wards))
        .route("/api/public/config", get(config))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobQuery {
    department_id: Option<i32>,
}

async fn list_jobs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<JobQuery>,
) -> Result<Json<Vec<JobListing>>, ApiError> {
    Ok(Json(state.jobs.open_jobs(query.department_id).await?))
}

async fn job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JobListing>, ApiError> {
    Ok(Json(state.jobs.public_job(id).await?))
}

async fn notices(State(state): State<AppState>) -> Result<Json<Vec<Notice>>, ApiError> {
    Ok(Json(state.notices.published().await?))
}

async fn counties(State(state): State<AppState>) -> Result<Json<Vec<County>>, ApiError> {
    Ok(Json(state.storage.counties().await?))
}

async fn constituencies(
    State(state): State<AppState>,
    Path(county_id): Path<i32>,
) -> Result<Json<Vec<Constituency>>, ApiError> {
    Ok(Json(state.storage.constituencies(county_id).await?))
}

async fn wards(
    State(state): State<AppState>,
    Path(constituency_id): Path<i32>,
) -> Result<Json<Vec<Ward>>, ApiError> {
    Ok(Json(state.storage.wards(constituency_id).await?))
}

async fn config(State(state): State<AppState>) -> Result<Json<ReferenceCatalog>, ApiError> {
    Ok(Json(state.storage.catalog().await?))
}
