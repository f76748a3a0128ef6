//! JSON API.
//!
//! `/api/public` is open, `/api/auth` handles OTP and the session user, and the applicant,
//! admin and board groups each require one role through their access extractor.

pub mod access;
mod admin;
mod applicant;
mod auth;
mod board;
pub mod error;
pub mod extract;
mod public;
pub mod session;
mod upload;

use std::sync::Arc;

use axum::Router;
use serde::Deserialize;

use crate::jobs::JobService;
use crate::notices::NoticeService;
use crate::otp::{OtpPolicy, OtpService, SmsGateway};
use crate::profile::ProfileService;
use crate::schema::ApplicationStatus;
use crate::storage::{ApplicationFilter, Storage};
use crate::uploads::UploadService;
use crate::workflow::ApplicationWorkflow;

pub use access::{AdminAccess, ApplicantAccess, BoardAccess, Capability};
pub use error::ApiError;
pub use session::{CurrentUser, SessionClaims, SessionKeys};

/// Shared handles for every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub workflow: ApplicationWorkflow<dyn Storage>,
    pub profiles: ProfileService<dyn Storage>,
    pub jobs: JobService<dyn Storage>,
    pub notices: NoticeService<dyn Storage>,
    pub otp: OtpService<dyn Storage>,
    pub uploads: UploadService,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        sms: Arc<dyn SmsGateway>,
        otp_policy: OtpPolicy,
        uploads: UploadService,
        sessions: SessionKeys,
    ) -> Self {
        Self {
            workflow: ApplicationWorkflow::new(Arc::clone(&storage)),
            profiles: ProfileService::new(Arc::clone(&storage)),
            jobs: JobService::new(Arc::clone(&storage)),
            notices: NoticeService::new(Arc::clone(&storage)),
            otp: OtpService::new(Arc::clone(&storage), sms, otp_policy),
            storage,
            uploads,
            sessions,
        }
    }

    /// Swap the OTP service, e.g. for one with a fixed code generator.
    pub fn with_otp(mut self, otp: OtpService<dyn Storage>) -> Self {
        self.otp = otp;
        self
    }
}

/// Every `/api` route plus the upload download route.
pub fn api_router(state: AppState) -> Router {
    let upload_limit = state.uploads.max_bytes();
    Router::new()
        .merge(public::routes())
        .merge(auth::routes())
        .merge(applicant::routes())
        .merge(admin::routes())
        .merge(board::routes())
        .merge(upload::routes(upload_limit))
        .with_state(state)
}

/// `?jobId=&status=` on the review listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationQuery {
    job_id: Option<i32>,
    status: Option<ApplicationStatus>,
}

impl From<ApplicationQuery> for ApplicationFilter {
    fn from(query: ApplicationQuery) -> Self {
        ApplicationFilter {
            job_id: query.job_id,
            status: query.status,
        }
    }
}
