use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::scorecard::{InterviewScore, ScoreError};
use super::transitions::{next_status, transition_to, ReviewAction, TransitionError};
use crate::schema::{Application, ApplicationStatus, NewApplication, ReviewChanges, Role};
use crate::storage::{ApplicationFilter, ApplicationStore, JobStore, StoreError};

/// Reviewer payload for `PUT .../applications/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub interview_score: Option<InterviewScore>,
}

impl ReviewDecision {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            remarks: None,
            interview_date: None,
            interview_score: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Job not found")]
    JobNotFound,
    #[error("Application not found")]
    ApplicationNotFound,
    #[error("This job is no longer accepting applications")]
    JobClosed,
    #[error("You have already applied for this job")]
    DuplicateApplication,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("Remarks are required when rejecting an application")]
    RemarksRequired,
    #[error("An interview score is required to record an interview")]
    ScoreRequired,
    #[error("An interview score can only be given when recording the interview")]
    UnexpectedScore,
    #[error("{0}")]
    ConcurrentUpdate(String),
    #[error(transparent)]
    Store(StoreError),
}

/// Applies the status table to stored applications.
pub struct ApplicationWorkflow<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ApplicationWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ApplicationWorkflow<S>
where
    S: JobStore + ApplicationStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit an application for an open job. One application per applicant and job.
    pub async fn apply(
        &self,
        applicant_id: i32,
        job_id: i32,
        today: NaiveDate,
    ) -> Result<Application, WorkflowError> {
        let job = self
            .store
            .job(job_id)
            .await
            .map_err(WorkflowError::Store)?
            .ok_or(WorkflowError::JobNotFound)?;
        if !job.is_open_on(today) {
            return Err(WorkflowError::JobClosed);
        }

        let status = next_status(ApplicationStatus::Draft, ReviewAction::Submit, Role::Applicant)?;
        let application = self
            .store
            .insert_application(NewApplication {
                job_id,
                applicant_id,
                status,
                submitted_on: Some(today),
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => WorkflowError::DuplicateApplication,
                other => WorkflowError::Store(other),
            })?;

        info!(
            application_id = application.id,
            job_id, applicant_id, "application submitted"
        );
        Ok(application)
    }

    /// Move an application to `decision.status` on behalf of `actor`.
    pub async fn review(
        &self,
        application_id: i32,
        actor: Role,
        decision: ReviewDecision,
    ) -> Result<Application, WorkflowError> {
        let current = self
            .store
            .application(application_id)
            .await
            .map_err(WorkflowError::Store)?
            .ok_or(WorkflowError::ApplicationNotFound)?;

        let (action, next) = transition_to(current.status, decision.status, actor)?;

        let remarks = decision
            .remarks
            .map(|remarks| remarks.trim().to_string())
            .filter(|remarks| !remarks.is_empty());

        let interview_score = match (action, decision.interview_score) {
            (ReviewAction::RecordInterview, Some(score)) => Some(i32::from(score.total()?)),
            (ReviewAction::RecordInterview, None) => return Err(WorkflowError::ScoreRequired),
            (_, Some(_)) => return Err(WorkflowError::UnexpectedScore),
            (_, None) => None,
        };

        if action == ReviewAction::Reject && remarks.is_none() {
            return Err(WorkflowError::RemarksRequired);
        }

        let updated = self
            .store
            .review_application(
                application_id,
                current.status,
                ReviewChanges {
                    status: next,
                    remarks,
                    interview_date: decision.interview_date,
                    interview_score,
                },
            )
            .await
            .map_err(|err| match err {
                StoreError::Conflict(message) => WorkflowError::ConcurrentUpdate(message),
                StoreError::NotFound(_) => WorkflowError::ApplicationNotFound,
                other => WorkflowError::Store(other),
            })?;

        info!(
            application_id,
            from = %current.status,
            to = %updated.status,
            actor = %actor,
            "application reviewed"
        );
        Ok(updated)
    }

    pub async fn shortlist(
        &self,
        application_id: i32,
        actor: Role,
        interview_date: Option<NaiveDate>,
        remarks: Option<String>,
    ) -> Result<Application, WorkflowError> {
        let decision = ReviewDecision {
            interview_date,
            remarks,
            ..ReviewDecision::to(ApplicationStatus::Shortlisted)
        };
        self.review(application_id, actor, decision).await
    }

    pub async fn record_interview(
        &self,
        application_id: i32,
        actor: Role,
        score: InterviewScore,
        comments: Option<String>,
    ) -> Result<Application, WorkflowError> {
        let decision = ReviewDecision {
            interview_score: Some(score),
            remarks: comments,
            ..ReviewDecision::to(ApplicationStatus::Interviewed)
        };
        self.review(application_id, actor, decision).await
    }

    pub async fn reject(
        &self,
        application_id: i32,
        actor: Role,
        remarks: impl Into<String>,
    ) -> Result<Application, WorkflowError> {
        let decision = ReviewDecision::to(ApplicationStatus::Rejected).with_remarks(remarks);
        self.review(application_id, actor, decision).await
    }

    pub async fn hire(
        &self,
        application_id: i32,
        actor: Role,
        remarks: Option<String>,
    ) -> Result<Application, WorkflowError> {
        let decision = ReviewDecision {
            remarks,
            ..ReviewDecision::to(ApplicationStatus::Hired)
        };
        self.review(application_id, actor, decision).await
    }

    pub async fn list(&self, filter: ApplicationFilter) -> Result<Vec<Application>, WorkflowError> {
        self.store
            .list_applications(filter)
            .await
            .map_err(WorkflowError::Store)
    }

    pub async fn for_applicant(&self, applicant_id: i32) -> Result<Vec<Application>, WorkflowError> {
        self.store
            .applications_for_applicant(applicant_id)
            .await
            .map_err(WorkflowError::Store)
    }
}
