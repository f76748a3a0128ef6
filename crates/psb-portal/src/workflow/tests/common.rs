use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::schema::{
    Application, ApplicationStatus, Department, Designation, Job, JobListing, JobPatch,
    NewApplication, NewJob, ReferenceCatalog, ReviewChanges,
};
use crate::storage::{
    ApplicationFilter, ApplicationStore, JobFilter, JobStore, MemoryStorage, StoreError,
};
use crate::workflow::ApplicationWorkflow;

pub(super) const APPLICANT: i32 = 41;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

pub(super) fn catalog() -> ReferenceCatalog {
    ReferenceCatalog {
        departments: vec![Department {
            id: 1,
            name: "Health Services".to_string(),
        }],
        designations: vec![Designation {
            id: 2,
            name: "Clinical Officer".to_string(),
            job_group: "CPSB 08".to_string(),
        }],
        ..ReferenceCatalog::default()
    }
}

pub(super) fn vacancy(deadline: Option<NaiveDate>) -> NewJob {
    NewJob {
        title: "Clinical Officer II".to_string(),
        description: Some("County referral hospital".to_string()),
        department_id: 1,
        designation_id: 2,
        requirements: None,
        application_deadline: deadline,
        is_active: true,
    }
}

pub(super) async fn workflow_with_job(
    deadline: Option<NaiveDate>,
) -> (Arc<MemoryStorage>, ApplicationWorkflow<MemoryStorage>, Job) {
    let store = Arc::new(MemoryStorage::with_catalog(catalog()));
    let job = store
        .create_job(vacancy(deadline), "admin-1")
        .await
        .expect("job created");
    (Arc::clone(&store), ApplicationWorkflow::new(store), job)
}

/// Applies and walks the application forward to `status` through legal board actions.
pub(super) async fn application_in(
    workflow: &ApplicationWorkflow<MemoryStorage>,
    job: &Job,
    status: ApplicationStatus,
) -> Application {
    use crate::workflow::InterviewScore;
    use crate::schema::Role;

    let application = workflow
        .apply(APPLICANT, job.id, today())
        .await
        .expect("applied");
    let id = application.id;
    match status {
        ApplicationStatus::Submitted => application,
        ApplicationStatus::Shortlisted => workflow
            .shortlist(id, Role::Board, None, None)
            .await
            .expect("shortlisted"),
        ApplicationStatus::Interviewed => {
            workflow
                .shortlist(id, Role::Board, None, None)
                .await
                .expect("shortlisted");
            workflow
                .record_interview(id, Role::Board, InterviewScore::Total(70), None)
                .await
                .expect("interviewed")
        }
        ApplicationStatus::Hired => {
            workflow
                .shortlist(id, Role::Board, None, None)
                .await
                .expect("shortlisted");
            workflow
                .record_interview(id, Role::Board, InterviewScore::Total(70), None)
                .await
                .expect("interviewed");
            workflow
                .hire(id, Role::Admin, None)
                .await
                .expect("hired")
        }
        ApplicationStatus::Rejected => workflow
            .reject(id, Role::Board, "Did not meet requirements")
            .await
            .expect("rejected"),
        ApplicationStatus::Draft => panic!("applications are never created as drafts"),
    }
}

/// Store whose every call fails, for error-mapping checks.
pub(super) struct UnavailableStore;

fn offline() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl JobStore for UnavailableStore {
    async fn job(&self, _id: i32) -> Result<Option<Job>, StoreError> {
        Err(offline())
    }

    async fn job_listing(&self, _id: i32) -> Result<Option<JobListing>, StoreError> {
        Err(offline())
    }

    async fn list_jobs(&self, _filter: JobFilter) -> Result<Vec<JobListing>, StoreError> {
        Err(offline())
    }

    async fn create_job(&self, _job: NewJob, _created_by: &str) -> Result<Job, StoreError> {
        Err(offline())
    }

    async fn update_job(&self, _id: i32, _patch: JobPatch) -> Result<Job, StoreError> {
        Err(offline())
    }
}

#[async_trait]
impl ApplicationStore for UnavailableStore {
    async fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, StoreError> {
        Err(offline())
    }

    async fn application(&self, _id: i32) -> Result<Option<Application>, StoreError> {
        Err(offline())
    }

    async fn applications_for_applicant(
        &self,
        _applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError> {
        Err(offline())
    }

    async fn list_applications(
        &self,
        _filter: ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        Err(offline())
    }

    async fn review_application(
        &self,
        _id: i32,
        _expected: ApplicationStatus,
        _changes: ReviewChanges,
    ) -> Result<Application, StoreError> {
        Err(offline())
    }
}
