use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use super::extract::JsonBody;
use super::session::CurrentUser;
use super::AppState;
use crate::profile::redirect_url;
use crate::schema::{Applicant, Role, User};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/user", get(session_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpRequest {
    #[serde(default)]
    phone_number: Option<String>,
}

async fn send_otp(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SendOtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let phone_number = request.phone_number.unwrap_or_default();
    state.otp.issue(&phone_number).await?;
    Ok(Json(json!({ "message": "OTP sent successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRequest {
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    otp: Option<String>,
}

async fn verify_otp(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    let (Some(phone_number), Some(code)) = (
        request.phone_number.filter(|value| !value.trim().is_empty()),
        request.otp.filter(|value| !value.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Phone number and OTP are required".to_string(),
        ));
    };

    let response = if state.otp.verify(phone_number.trim(), code.trim()).await? {
        (
            StatusCode::OK,
            Json(json!({ "message": "OTP verified successfully", "verified": true })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid or expired OTP", "verified": false })),
        )
    };
    Ok(response.into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUserView {
    #[serde(flatten)]
    user: User,
    applicant_profile: Option<Applicant>,
    redirect_url: &'static str,
}

async fn session_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionUserView>, ApiError> {
    let applicant_profile = match user.role {
        Role::Applicant => state.profiles.applicant_for_user(&user.id).await?,
        Role::Admin | Role::Board => None,
    };
    let redirect_url = redirect_url(user.role, applicant_profile.as_ref());
    Ok(Json(SessionUserView {
        user,
        applicant_profile,
        redirect_url,
    }))
}
