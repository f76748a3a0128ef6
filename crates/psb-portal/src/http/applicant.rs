use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use super::access::ApplicantAccess;
use super::error::ApiError;
use super::extract::JsonBody;
use super::AppState;
use crate::profile::{ProfileError, ProfileSubmission};
use crate::schema::{Applicant, ApplicantDossier, Application};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/applicant/profile",
            get(profile).post(create_profile).put(update_profile),
        )
        .route("/api/applicant/verify-phone", post(verify_phone))
        .route("/api/applicant/applications", get(applications))
        .route("/api/applicant/apply", post(apply))
}

async fn profile(
    State(state): State<AppState>,
    access: ApplicantAccess,
) -> Result<Json<ApplicantDossier>, ApiError> {
    Ok(Json(state.profiles.dossier(&access.user.id).await?))
}

async fn create_profile(
    State(state): State<AppState>,
    access: ApplicantAccess,
    JsonBody(submission): JsonBody<ProfileSubmission>,
) -> Result<Json<ApplicantDossier>, ApiError> {
    Ok(Json(
        state.profiles.create(&access.user.id, submission).await?,
    ))
}

async fn update_profile(
    State(state): State<AppState>,
    access: ApplicantAccess,
    JsonBody(submission): JsonBody<ProfileSubmission>,
) -> Result<Json<ApplicantDossier>, ApiError> {
    Ok(Json(
        state.profiles.update(&access.user.id, submission).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPhoneRequest {
    phone_number: String,
}

async fn verify_phone(
    State(state): State<AppState>,
    access: ApplicantAccess,
    JsonBody(request): JsonBody<VerifyPhoneRequest>,
) -> Result<Json<Applicant>, ApiError> {
    Ok(Json(
        state
            .profiles
            .verify_phone(&access.user.id, &request.phone_number)
            .await?,
    ))
}

async fn applications(
    State(state): State<AppState>,
    access: ApplicantAccess,
) -> Result<Json<Vec<Application>>, ApiError> {
    let applicant = own_profile(&state, &access).await?;
    Ok(Json(state.workflow.for_applicant(applicant.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRequest {
    job_id: i32,
}

async fn apply(
    State(state): State<AppState>,
    access: ApplicantAccess,
    JsonBody(request): JsonBody<ApplyRequest>,
) -> Result<Json<Application>, ApiError> {
    let applicant = own_profile(&state, &access).await?;
    let today = Utc::now().date_naive();
    Ok(Json(
        state
            .workflow
            .apply(applicant.id, request.job_id, today)
            .await?,
    ))
}

async fn own_profile(state: &AppState, access: &ApplicantAccess) -> Result<Applicant, ApiError> {
    state
        .profiles
        .applicant_for_user(&access.user.id)
        .await?
        .ok_or_else(|| ProfileError::NotFound.into())
}
