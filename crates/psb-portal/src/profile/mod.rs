//! Applicant profile wizard.
//!
//! Each wizard step posts a [`ProfileSubmission`]: the scalar fields it touches plus any child
//! collections it carries, which replace the stored ones wholesale. Completion is recomputed
//! after every save and never goes down.

mod completion;

pub use completion::{completion_percentage, redirect_url, ProfileSection};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::schema::{
    Applicant, ApplicantDossier, ApplicantPatch, NewDocument, NewEducationRecord,
    NewEmploymentRecord, NewReferee, ReferenceCatalog,
};
use crate::storage::{ApplicantStore, OtpStore, ReferenceStore, StoreError};
use crate::validation::FieldErrors;

/// Body of `POST`/`PUT /api/applicant/profile`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSubmission {
    #[serde(flatten)]
    pub details: ApplicantPatch,
    #[serde(default)]
    pub education_records: Option<Vec<NewEducationRecord>>,
    #[serde(default)]
    pub employment_history: Option<Vec<NewEmploymentRecord>>,
    #[serde(default)]
    pub referees: Option<Vec<NewReferee>>,
    #[serde(default)]
    pub documents: Option<Vec<NewDocument>>,
}

impl ProfileSubmission {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(failures) = self.details.validate() {
            errors.absorb("", &failures);
        }
        absorb_each(&mut errors, "educationRecords", self.education_records.as_deref());
        absorb_each(&mut errors, "employmentHistory", self.employment_history.as_deref());
        absorb_each(&mut errors, "referees", self.referees.as_deref());
        absorb_each(&mut errors, "documents", self.documents.as_deref());
        errors.into_result()
    }
}

fn absorb_each<T: Validate>(errors: &mut FieldErrors, field: &str, items: Option<&[T]>) {
    for (index, item) in items.unwrap_or_default().iter().enumerate() {
        if let Err(failures) = item.validate() {
            errors.absorb(&format!("{field}[{index}]"), &failures);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Profile already exists")]
    AlreadyExists,
    #[error("Applicant profile not found")]
    NotFound,
    #[error("Phone number has not been verified")]
    PhoneNotVerified,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldErrors> for ProfileError {
    fn from(errors: FieldErrors) -> Self {
        ProfileError::Validation(errors)
    }
}

pub struct ProfileService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ProfileService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ProfileService<S>
where
    S: ApplicantStore + ReferenceStore + OtpStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn applicant_for_user(&self, user_id: &str) -> Result<Option<Applicant>, ProfileError> {
        Ok(self.store.applicant_for_user(user_id).await?)
    }

    /// First wizard save. A user owns at most one profile.
    pub async fn create(
        &self,
        user_id: &str,
        submission: ProfileSubmission,
    ) -> Result<ApplicantDossier, ProfileError> {
        submission.validate()?;
        if self.store.applicant_for_user(user_id).await?.is_some() {
            return Err(ProfileError::AlreadyExists);
        }
        self.check_references(None, &submission).await?;

        let ProfileSubmission {
            details,
            education_records,
            employment_history,
            referees,
            documents,
        } = submission;
        let applicant = self
            .store
            .create_applicant(user_id, details, 0)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ProfileError::AlreadyExists,
                other => ProfileError::Store(other),
            })?;
        info!(applicant_id = applicant.id, user_id, "applicant profile created");

        self.replace_children(
            applicant.id,
            education_records,
            employment_history,
            referees,
            documents,
        )
        .await?;
        self.refresh_completion(applicant).await
    }

    /// Later wizard saves. Absent fields and collections keep their stored values.
    pub async fn update(
        &self,
        user_id: &str,
        submission: ProfileSubmission,
    ) -> Result<ApplicantDossier, ProfileError> {
        submission.validate()?;
        let existing = self
            .store
            .applicant_for_user(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        self.check_references(Some(&existing), &submission)
            .await?;

        let ProfileSubmission {
            details,
            education_records,
            employment_history,
            referees,
            documents,
        } = submission;
        let applicant = self
            .store
            .update_applicant(existing.id, details, existing.profile_completion_percentage)
            .await?;
        self.replace_children(
            applicant.id,
            education_records,
            employment_history,
            referees,
            documents,
        )
        .await?;
        self.refresh_completion(applicant).await
    }

    pub async fn dossier(&self, user_id: &str) -> Result<ApplicantDossier, ProfileError> {
        let applicant = self
            .store
            .applicant_for_user(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        self.load_dossier(applicant).await
    }

    pub async fn verify_phone(
        &self,
        user_id: &str,
        phone_number: &str,
    ) -> Result<Applicant, ProfileError> {
        self.verify_phone_at(user_id, phone_number, Utc::now()).await
    }

    /// Record the profile phone as verified. Requires a verified OTP for that number.
    pub async fn verify_phone_at(
        &self,
        user_id: &str,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Applicant, ProfileError> {
        let phone_number = phone_number.trim();
        let applicant = self
            .store
            .applicant_for_user(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        if phone_number.is_empty() || !self.store.has_verified_otp(phone_number).await? {
            return Err(ProfileError::PhoneNotVerified);
        }
        let verified = self
            .store
            .mark_phone_verified(applicant.id, phone_number, now)
            .await?;
        info!(applicant_id = verified.id, "applicant phone verified");
        Ok(verified)
    }

    /// Every referenced lookup id must exist. The constituency must sit in the county and the
    /// ward in the constituency, taking unchanged values from the stored profile.
    async fn check_references(
        &self,
        existing: Option<&Applicant>,
        submission: &ProfileSubmission,
    ) -> Result<(), ProfileError> {
        let patch = &submission.details;
        let county_id = patch.county_id.or(existing.and_then(|a| a.county_id));
        let constituency_id = patch
            .constituency_id
            .or(existing.and_then(|a| a.constituency_id));
        let ward_id = patch.ward_id.or(existing.and_then(|a| a.ward_id));
        let mut errors = FieldErrors::new();

        if let Some(county_id) = patch.county_id {
            let counties = self.store.counties().await?;
            if !counties.iter().any(|county| county.id == county_id) {
                errors.add("countyId", "County not found");
            }
        }
        if let Some(constituency_id) = constituency_id {
            match self.store.constituency(constituency_id).await? {
                None => errors.add("constituencyId", "Constituency not found"),
                Some(constituency) if county_id.is_some_and(|id| id != constituency.county_id) => {
                    errors.add(
                        "constituencyId",
                        "Constituency does not belong to the selected county",
                    )
                }
                Some(_) => {}
            }
        }
        if let Some(ward_id) = ward_id {
            match (self.store.ward(ward_id).await?, constituency_id) {
                (None, _) => errors.add("wardId", "Ward not found"),
                (Some(_), None) => {
                    errors.add("constituencyId", "Select a constituency for the ward")
                }
                (Some(ward), Some(id)) if id != ward.constituency_id => {
                    errors.add("wardId", "Ward does not belong to the selected constituency")
                }
                (Some(_), Some(_)) => {}
            }
        }

        let needs_catalog = patch.profession_id.is_some()
            || submission
                .education_records
                .as_deref()
                .is_some_and(|records| !records.is_empty());
        if needs_catalog {
            let catalog = self.store.catalog().await?;
            check_catalog_ids(&mut errors, &catalog, submission);
        }
        Ok(errors.into_result()?)
    }

    async fn replace_children(
        &self,
        applicant_id: i32,
        education_records: Option<Vec<NewEducationRecord>>,
        employment_history: Option<Vec<NewEmploymentRecord>>,
        referees: Option<Vec<NewReferee>>,
        documents: Option<Vec<NewDocument>>,
    ) -> Result<(), ProfileError> {
        if let Some(records) = education_records {
            self.store
                .replace_education_records(applicant_id, records)
                .await?;
        }
        if let Some(records) = employment_history {
            self.store
                .replace_employment_history(applicant_id, records)
                .await?;
        }
        if let Some(referees) = referees {
            self.store.replace_referees(applicant_id, referees).await?;
        }
        if let Some(documents) = documents {
            self.store.replace_documents(applicant_id, documents).await?;
        }
        Ok(())
    }

    async fn refresh_completion(
        &self,
        applicant: Applicant,
    ) -> Result<ApplicantDossier, ProfileError> {
        let mut dossier = self.load_dossier(applicant).await?;
        let computed = completion_percentage(&dossier);
        let stored = dossier.applicant.profile_completion_percentage;
        if computed > stored {
            debug!(
                applicant_id = dossier.applicant.id,
                from = stored,
                to = computed,
                "profile completion raised"
            );
            dossier.applicant = self
                .store
                .update_applicant(dossier.applicant.id, ApplicantPatch::default(), computed)
                .await?;
        }
        Ok(dossier)
    }

    async fn load_dossier(&self, applicant: Applicant) -> Result<ApplicantDossier, ProfileError> {
        let id = applicant.id;
        Ok(ApplicantDossier {
            education_records: self.store.education_records(id).await?,
            employment_history: self.store.employment_history(id).await?,
            referees: self.store.referees(id).await?,
            documents: self.store.documents(id).await?,
            applicant,
        })
    }
}

fn check_catalog_ids(
    errors: &mut FieldErrors,
    catalog: &ReferenceCatalog,
    submission: &ProfileSubmission,
) {
    if let Some(id) = submission.details.profession_id {
        if !catalog.professions.iter().any(|row| row.id == id) {
            errors.add("professionId", "Profession not found");
        }
    }
    for (index, record) in submission
        .education_records
        .as_deref()
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        let field = |name: &str| format!("educationRecords[{index}].{name}");
        if !catalog
            .institutions
            .iter()
            .any(|row| row.id == record.institution_id)
        {
            errors.add(field("institutionId"), "Institution not found");
        }
        if !catalog.awards.iter().any(|row| row.id == record.award_id) {
            errors.add(field("awardId"), "Award not found");
        }
        if let Some(course_id) = record.course_id {
            if !catalog.courses.iter().any(|row| row.id == course_id) {
                errors.add(field("courseId"), "Course not found");
            }
        }
    }
}

#[cfg(test)]
mod tests;
