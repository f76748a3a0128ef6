//! Job postings: public listings plus admin create, edit and activation toggle.

use std::sync::Arc;

use tracing::info;

use crate::schema::{Job, JobListing, JobPatch, NewJob, ReferenceCatalog};
use crate::storage::{JobFilter, JobStore, ReferenceStore, StoreError};
use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Job not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldErrors> for JobError {
    fn from(errors: FieldErrors) -> Self {
        JobError::Validation(errors)
    }
}

pub struct JobService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for JobService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> JobService<S>
where
    S: JobStore + ReferenceStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Active postings, newest first.
    pub async fn open_jobs(&self, department_id: Option<i32>) -> Result<Vec<JobListing>, JobError> {
        Ok(self
            .store
            .list_jobs(JobFilter {
                department_id,
                active_only: true,
            })
            .await?)
    }

    /// Inactive postings are hidden from the public.
    pub async fn public_job(&self, id: i32) -> Result<JobListing, JobError> {
        match self.store.job_listing(id).await? {
            Some(listing) if listing.job.is_active => Ok(listing),
            _ => Err(JobError::NotFound),
        }
    }

    pub async fn all_jobs(&self) -> Result<Vec<JobListing>, JobError> {
        Ok(self.store.list_jobs(JobFilter::default()).await?)
    }

    pub async fn create(&self, job: NewJob, created_by: &str) -> Result<Job, JobError> {
        FieldErrors::check(&job)?;
        let catalog = self.store.catalog().await?;
        check_references(&catalog, Some(job.department_id), Some(job.designation_id))?;

        let job = self.store.create_job(job, created_by).await?;
        info!(job_id = job.id, created_by, title = %job.title, "job posted");
        Ok(job)
    }

    pub async fn update(&self, id: i32, patch: JobPatch) -> Result<Job, JobError> {
        FieldErrors::check(&patch)?;
        if patch.department_id.is_some() || patch.designation_id.is_some() {
            let catalog = self.store.catalog().await?;
            check_references(&catalog, patch.department_id, patch.designation_id)?;
        }

        let job = self
            .store
            .update_job(id, patch)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => JobError::NotFound,
                other => JobError::Store(other),
            })?;
        info!(job_id = job.id, is_active = job.is_active, "job updated");
        Ok(job)
    }

    /// Flip only `isActive`. Existing applications keep their status.
    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Job, JobError> {
        self.update(
            id,
            JobPatch {
                is_active: Some(is_active),
                ..JobPatch::default()
            },
        )
        .await
    }
}

fn check_references(
    catalog: &ReferenceCatalog,
    department_id: Option<i32>,
    designation_id: Option<i32>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(id) = department_id {
        if !catalog.departments.iter().any(|row| row.id == id) {
            errors.add("departmentId", "Department not found");
        }
    }
    if let Some(id) = designation_id {
        if !catalog.designations.iter().any(|row| row.id == id) {
            errors.add("designationId", "Designation not found");
        }
    }
    errors.into_result()
}
