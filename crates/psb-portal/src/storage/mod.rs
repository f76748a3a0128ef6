//! Storage access layer.
//!
//! One trait per entity family, all implemented by [`MemoryStorage`] and [`PgStorage`].
//! Services take `Arc<S>` for any `S` implementing the traits they need, so the HTTP layer
//! can hand them `Arc<dyn Storage>` while tests plug in narrow doubles.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::schema::{
    Applicant, ApplicantPatch, Application, ApplicationStatus, Constituency, County, Document,
    EducationRecord, EmploymentRecord, Job, JobListing, JobPatch, NewApplication, NewDocument,
    NewEducationRecord, NewEmploymentRecord, NewJob, NewNotice, NewOtp, NewReferee, Notice,
    NoticePatch, OtpVerification, Referee, ReferenceCatalog, ReviewChanges, Role, UpsertUser,
    User, Ward,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Insert on first login, refresh identity fields afterwards. Never touches `role`.
    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError>;

    async fn set_user_role(&self, id: &str, role: Role) -> Result<User, StoreError>;
}

#[async_trait]
pub trait ApplicantStore: Send + Sync {
    async fn applicant_for_user(&self, user_id: &str) -> Result<Option<Applicant>, StoreError>;

    /// Fails with `Conflict` when the user already owns a profile.
    async fn create_applicant(
        &self,
        user_id: &str,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError>;

    async fn update_applicant(
        &self,
        applicant_id: i32,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError>;

    async fn mark_phone_verified(
        &self,
        applicant_id: i32,
        phone_number: &str,
        at: DateTime<Utc>,
    ) -> Result<Applicant, StoreError>;

    async fn education_records(&self, applicant_id: i32)
        -> Result<Vec<EducationRecord>, StoreError>;
    async fn employment_history(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<EmploymentRecord>, StoreError>;
    async fn referees(&self, applicant_id: i32) -> Result<Vec<Referee>, StoreError>;
    async fn documents(&self, applicant_id: i32) -> Result<Vec<Document>, StoreError>;

    async fn replace_education_records(
        &self,
        applicant_id: i32,
        records: Vec<NewEducationRecord>,
    ) -> Result<Vec<EducationRecord>, StoreError>;
    async fn replace_employment_history(
        &self,
        applicant_id: i32,
        records: Vec<NewEmploymentRecord>,
    ) -> Result<Vec<EmploymentRecord>, StoreError>;
    async fn replace_referees(
        &self,
        applicant_id: i32,
        referees: Vec<NewReferee>,
    ) -> Result<Vec<Referee>, StoreError>;
    async fn replace_documents(
        &self,
        applicant_id: i32,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<Document>, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub department_id: Option<i32>,
    pub active_only: bool,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn job(&self, id: i32) -> Result<Option<Job>, StoreError>;
    async fn job_listing(&self, id: i32) -> Result<Option<JobListing>, StoreError>;
    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<JobListing>, StoreError>;
    async fn create_job(&self, job: NewJob, created_by: &str) -> Result<Job, StoreError>;
    async fn update_job(&self, id: i32, patch: JobPatch) -> Result<Job, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub job_id: Option<i32>,
    pub status: Option<ApplicationStatus>,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Atomic check-and-insert: a second row for the same applicant and job is a `Conflict`.
    async fn insert_application(&self, application: NewApplication)
        -> Result<Application, StoreError>;

    async fn application(&self, id: i32) -> Result<Option<Application>, StoreError>;

    async fn applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError>;

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError>;

    /// Compare-and-set: writes only if the row still has `expected` status, otherwise `Conflict`.
    async fn review_application(
        &self,
        id: i32,
        expected: ApplicationStatus,
        changes: ReviewChanges,
    ) -> Result<Application, StoreError>;
}

#[async_trait]
pub trait NoticeStore: Send + Sync {
    async fn notice(&self, id: i32) -> Result<Option<Notice>, StoreError>;
    async fn list_notices(&self, published_only: bool) -> Result<Vec<Notice>, StoreError>;

    /// `published_at` is stamped with `now` the first time a notice is published.
    async fn create_notice(
        &self,
        notice: NewNotice,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError>;
    async fn update_notice(
        &self,
        id: i32,
        patch: NoticePatch,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Delete every earlier row for the phone and insert the new challenge.
    async fn replace_otp(&self, otp: NewOtp) -> Result<OtpVerification, StoreError>;
    async fn latest_unverified_otp(
        &self,
        phone_number: &str,
    ) -> Result<Option<OtpVerification>, StoreError>;
    async fn record_failed_attempt(&self, id: i32) -> Result<(), StoreError>;
    async fn mark_otp_verified(&self, id: i32) -> Result<(), StoreError>;
    async fn has_verified_otp(&self, phone_number: &str) -> Result<bool, StoreError>;
    async fn delete_expired_otps(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn counties(&self) -> Result<Vec<County>, StoreError>;
    async fn constituencies(&self, county_id: i32) -> Result<Vec<Constituency>, StoreError>;
    async fn wards(&self, constituency_id: i32) -> Result<Vec<Ward>, StoreError>;
    async fn constituency(&self, id: i32) -> Result<Option<Constituency>, StoreError>;
    async fn ward(&self, id: i32) -> Result<Option<Ward>, StoreError>;
    async fn catalog(&self) -> Result<ReferenceCatalog, StoreError>;

    async fn upsert_county(&self, code: &str, name: &str) -> Result<County, StoreError>;
    async fn upsert_constituency(
        &self,
        code: &str,
        name: &str,
        county_id: i32,
    ) -> Result<Constituency, StoreError>;
    async fn upsert_ward(
        &self,
        code: &str,
        name: &str,
        constituency_id: i32,
    ) -> Result<Ward, StoreError>;
}

/// Everything the portal persists, behind one object-safe handle.
#[async_trait]
pub trait Storage:
    UserStore + ApplicantStore + JobStore + ApplicationStore + NoticeStore + OtpStore + ReferenceStore
{
    /// Cheap liveness probe used by the readiness route.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests;
