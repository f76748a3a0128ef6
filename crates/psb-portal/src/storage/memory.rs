use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    ApplicantStore, ApplicationFilter, ApplicationStore, JobFilter, JobStore, NoticeStore,
    OtpStore, ReferenceStore, Storage, StoreError, UserStore,
};
use crate::schema::{
    Applicant, ApplicantPatch, Application, ApplicationStatus, Constituency, County, Document,
    EducationRecord, EmploymentRecord, Job, JobListing, JobPatch, NewApplication, NewDocument,
    NewEducationRecord, NewEmploymentRecord, NewJob, NewNotice, NewOtp, NewReferee, Notice,
    NoticePatch, OtpVerification, Referee, ReferenceCatalog, ReviewChanges, Role, UpsertUser,
    User, Ward,
};

#[derive(Default)]
struct Tables {
    sequence: i32,
    users: BTreeMap<String, User>,
    applicants: BTreeMap<i32, Applicant>,
    education: Vec<EducationRecord>,
    employment: Vec<EmploymentRecord>,
    referees: Vec<Referee>,
    documents: Vec<Document>,
    jobs: BTreeMap<i32, Job>,
    applications: BTreeMap<i32, Application>,
    notices: BTreeMap<i32, Notice>,
    otps: BTreeMap<i32, OtpVerification>,
    counties: BTreeMap<i32, County>,
    constituencies: BTreeMap<i32, Constituency>,
    wards: BTreeMap<i32, Ward>,
    catalog: ReferenceCatalog,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }

    fn listing(&self, job: &Job) -> Option<JobListing> {
        let department = self
            .catalog
            .departments
            .iter()
            .find(|department| department.id == job.department_id)?;
        let designation = self
            .catalog
            .designations
            .iter()
            .find(|designation| designation.id == job.designation_id)?;
        Some(JobListing {
            job: job.clone(),
            department_name: department.name.clone(),
            designation_name: designation.name.clone(),
            job_group: designation.job_group.clone(),
        })
    }
}

/// Process-local store used by tests, the demo, and `serve --memory`.
///
/// A single mutex guards every table, so each trait call is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a fixed set of lookup lists (departments, designations, awards, ...).
    pub fn with_catalog(catalog: ReferenceCatalog) -> Self {
        let sequence = catalog_max_id(&catalog);
        Self {
            tables: Mutex::new(Tables {
                sequence,
                catalog,
                ..Tables::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

fn catalog_max_id(catalog: &ReferenceCatalog) -> i32 {
    let ids = catalog
        .departments
        .iter()
        .map(|row| row.id)
        .chain(catalog.designations.iter().map(|row| row.id))
        .chain(catalog.awards.iter().map(|row| row.id))
        .chain(catalog.courses.iter().map(|row| row.id))
        .chain(catalog.institutions.iter().map(|row| row.id))
        .chain(catalog.professions.iter().map(|row| row.id))
        .chain(catalog.specializations.iter().map(|row| row.id));
    ids.max().unwrap_or(0)
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn apply_patch(applicant: &mut Applicant, patch: ApplicantPatch) {
    merge(&mut applicant.salutation, patch.salutation);
    merge(&mut applicant.first_name, patch.first_name);
    merge(&mut applicant.surname, patch.surname);
    merge(&mut applicant.other_name, patch.other_name);
    merge(&mut applicant.phone_number, patch.phone_number);
    merge(&mut applicant.alt_phone_number, patch.alt_phone_number);
    merge(&mut applicant.national_id, patch.national_id);
    merge(&mut applicant.id_passport_number, patch.id_passport_number);
    merge(&mut applicant.id_passport_type, patch.id_passport_type);
    merge(&mut applicant.date_of_birth, patch.date_of_birth);
    merge(&mut applicant.gender, patch.gender);
    merge(&mut applicant.nationality, patch.nationality);
    merge(&mut applicant.county_id, patch.county_id);
    merge(&mut applicant.constituency_id, patch.constituency_id);
    merge(&mut applicant.ward_id, patch.ward_id);
    merge(&mut applicant.address, patch.address);
    merge(&mut applicant.ethnicity, patch.ethnicity);
    merge(&mut applicant.religion, patch.religion);
    merge(&mut applicant.is_pwd, patch.is_pwd);
    merge(&mut applicant.pwd_number, patch.pwd_number);
    merge(&mut applicant.is_employee, patch.is_employee);
    merge(&mut applicant.kra_pin, patch.kra_pin);
    merge(&mut applicant.profession_id, patch.profession_id);
}

fn blank_applicant(id: i32, user_id: &str, now: DateTime<Utc>) -> Applicant {
    Applicant {
        id,
        user_id: user_id.to_string(),
        salutation: None,
        first_name: None,
        surname: None,
        other_name: None,
        phone_number: None,
        phone_verified: false,
        phone_verified_at: None,
        alt_phone_number: None,
        national_id: None,
        id_passport_number: None,
        id_passport_type: None,
        date_of_birth: None,
        gender: None,
        nationality: None,
        county_id: None,
        constituency_id: None,
        ward_id: None,
        address: None,
        ethnicity: None,
        religion: None,
        is_pwd: None,
        pwd_number: None,
        is_employee: None,
        kra_pin: None,
        profession_id: None,
        profile_completion_percentage: 0,
        created_at: now,
        updated_at: now,
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i32)) {
    rows.sort_by(|left, right| key(right).cmp(&key(left)));
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        let stored = tables
            .users
            .entry(user.id.clone())
            .and_modify(|existing| {
                existing.email = user.email.clone();
                existing.first_name = user.first_name.clone();
                existing.last_name = user.last_name.clone();
                existing.profile_image_url = user.profile_image_url.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| User {
                id: user.id.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                profile_image_url: user.profile_image_url.clone(),
                role: Role::Applicant,
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn set_user_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        let user = tables.users.get_mut(id).ok_or(StoreError::NotFound("User"))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ApplicantStore for MemoryStorage {
    async fn applicant_for_user(&self, user_id: &str) -> Result<Option<Applicant>, StoreError> {
        Ok(self
            .lock()?
            .applicants
            .values()
            .find(|applicant| applicant.user_id == user_id)
            .cloned())
    }

    async fn create_applicant(
        &self,
        user_id: &str,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .applicants
            .values()
            .any(|applicant| applicant.user_id == user_id)
        {
            return Err(StoreError::Conflict(
                "Applicant profile already exists".to_string(),
            ));
        }
        let id = tables.next_id();
        let mut applicant = blank_applicant(id, user_id, Utc::now());
        apply_patch(&mut applicant, patch);
        applicant.profile_completion_percentage = completion;
        tables.applicants.insert(id, applicant.clone());
        Ok(applicant)
    }

    async fn update_applicant(
        &self,
        applicant_id: i32,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError> {
        let mut tables = self.lock()?;
        let applicant = tables
            .applicants
            .get_mut(&applicant_id)
            .ok_or(StoreError::NotFound("Applicant"))?;
        apply_patch(applicant, patch);
        applicant.profile_completion_percentage = completion;
        applicant.updated_at = Utc::now();
        Ok(applicant.clone())
    }

    async fn mark_phone_verified(
        &self,
        applicant_id: i32,
        phone_number: &str,
        at: DateTime<Utc>,
    ) -> Result<Applicant, StoreError> {
        let mut tables = self.lock()?;
        let applicant = tables
            .applicants
            .get_mut(&applicant_id)
            .ok_or(StoreError::NotFound("Applicant"))?;
        applicant.phone_number = Some(phone_number.to_string());
        applicant.phone_verified = true;
        applicant.phone_verified_at = Some(at);
        applicant.updated_at = at;
        Ok(applicant.clone())
    }

    async fn education_records(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<EducationRecord>, StoreError> {
        Ok(self
            .lock()?
            .education
            .iter()
            .filter(|row| row.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn employment_history(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<EmploymentRecord>, StoreError> {
        Ok(self
            .lock()?
            .employment
            .iter()
            .filter(|row| row.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn referees(&self, applicant_id: i32) -> Result<Vec<Referee>, StoreError> {
        Ok(self
            .lock()?
            .referees
            .iter()
            .filter(|row| row.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn documents(&self, applicant_id: i32) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()?
            .documents
            .iter()
            .filter(|row| row.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn replace_education_records(
        &self,
        applicant_id: i32,
        records: Vec<NewEducationRecord>,
    ) -> Result<Vec<EducationRecord>, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        tables.education.retain(|row| row.applicant_id != applicant_id);
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let row = EducationRecord {
                id: tables.next_id(),
                applicant_id,
                institution_id: record.institution_id,
                course_id: record.course_id,
                award_id: record.award_id,
                year_completed: record.year_completed,
                grade: record.grade,
                created_at: now,
            };
            tables.education.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn replace_employment_history(
        &self,
        applicant_id: i32,
        records: Vec<NewEmploymentRecord>,
    ) -> Result<Vec<EmploymentRecord>, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        tables.employment.retain(|row| row.applicant_id != applicant_id);
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let row = EmploymentRecord {
                id: tables.next_id(),
                applicant_id,
                employer: record.employer,
                position: record.position,
                start_date: record.start_date,
                end_date: record.end_date,
                is_current: record.is_current,
                duties: record.duties,
                created_at: now,
            };
            tables.employment.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn replace_referees(
        &self,
        applicant_id: i32,
        referees: Vec<NewReferee>,
    ) -> Result<Vec<Referee>, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        tables.referees.retain(|row| row.applicant_id != applicant_id);
        let mut stored = Vec::with_capacity(referees.len());
        for referee in referees {
            let row = Referee {
                id: tables.next_id(),
                applicant_id,
                name: referee.name,
                position: referee.position,
                organization: referee.organization,
                email: referee.email,
                phone_number: referee.phone_number,
                relationship: referee.relationship,
                created_at: now,
            };
            tables.referees.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn replace_documents(
        &self,
        applicant_id: i32,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<Document>, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        tables.documents.retain(|row| row.applicant_id != applicant_id);
        let mut stored = Vec::with_capacity(documents.len());
        for document in documents {
            let row = Document {
                id: tables.next_id(),
                applicant_id,
                doc_type: document.doc_type,
                file_name: document.file_name,
                file_path: document.file_path,
                file_size: document.file_size,
                mime_type: document.mime_type,
                created_at: now,
            };
            tables.documents.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }
}

#[async_trait]
impl JobStore for MemoryStorage {
    async fn job(&self, id: i32) -> Result<Option<Job>, StoreError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    async fn job_listing(&self, id: i32) -> Result<Option<JobListing>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.jobs.get(&id).and_then(|job| tables.listing(job)))
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<JobListing>, StoreError> {
        let tables = self.lock()?;
        let mut listings: Vec<JobListing> = tables
            .jobs
            .values()
            .filter(|job| !filter.active_only || job.is_active)
            .filter(|job| {
                filter
                    .department_id
                    .map_or(true, |department| job.department_id == department)
            })
            .filter_map(|job| tables.listing(job))
            .collect();
        newest_first(&mut listings, |listing| {
            (listing.job.created_at, listing.job.id)
        });
        Ok(listings)
    }

    async fn create_job(&self, job: NewJob, created_by: &str) -> Result<Job, StoreError> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let stored = Job {
            id,
            title: job.title,
            description: job.description,
            department_id: job.department_id,
            designation_id: job.designation_id,
            requirements: job.requirements,
            application_deadline: job.application_deadline,
            is_active: job.is_active,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.jobs.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_job(&self, id: i32, patch: JobPatch) -> Result<Job, StoreError> {
        let mut tables = self.lock()?;
        let job = tables.jobs.get_mut(&id).ok_or(StoreError::NotFound("Job"))?;
        if let Some(title) = patch.title {
            job.title = title;
        }
        merge(&mut job.description, patch.description);
        if let Some(department_id) = patch.department_id {
            job.department_id = department_id;
        }
        if let Some(designation_id) = patch.designation_id {
            job.designation_id = designation_id;
        }
        merge(&mut job.requirements, patch.requirements);
        merge(&mut job.application_deadline, patch.application_deadline);
        if let Some(is_active) = patch.is_active {
            job.is_active = is_active;
        }
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStorage {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, StoreError> {
        let mut tables = self.lock()?;
        let duplicate = tables.applications.values().any(|existing| {
            existing.applicant_id == application.applicant_id
                && existing.job_id == application.job_id
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }
        let now = Utc::now();
        let id = tables.next_id();
        let stored = Application {
            id,
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            status: application.status,
            submitted_on: application.submitted_on,
            remarks: None,
            interview_date: None,
            interview_score: None,
            created_at: now,
            updated_at: now,
        };
        tables.applications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn application(&self, id: i32) -> Result<Option<Application>, StoreError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    async fn applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError> {
        let mut rows: Vec<Application> = self
            .lock()?
            .applications
            .values()
            .filter(|row| row.applicant_id == applicant_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        let mut rows: Vec<Application> = self
            .lock()?
            .applications
            .values()
            .filter(|row| filter.job_id.map_or(true, |job_id| row.job_id == job_id))
            .filter(|row| filter.status.map_or(true, |status| row.status == status))
            .cloned()
            .collect();
        newest_first(&mut rows, |row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn review_application(
        &self,
        id: i32,
        expected: ApplicationStatus,
        changes: ReviewChanges,
    ) -> Result<Application, StoreError> {
        let mut tables = self.lock()?;
        let row = tables
            .applications
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Application"))?;
        if row.status != expected {
            return Err(StoreError::Conflict(format!(
                "Application status changed to {} while it was being reviewed",
                row.status
            )));
        }
        row.status = changes.status;
        merge(&mut row.remarks, changes.remarks);
        merge(&mut row.interview_date, changes.interview_date);
        merge(&mut row.interview_score, changes.interview_score);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[async_trait]
impl NoticeStore for MemoryStorage {
    async fn notice(&self, id: i32) -> Result<Option<Notice>, StoreError> {
        Ok(self.lock()?.notices.get(&id).cloned())
    }

    async fn list_notices(&self, published_only: bool) -> Result<Vec<Notice>, StoreError> {
        let mut rows: Vec<Notice> = self
            .lock()?
            .notices
            .values()
            .filter(|notice| !published_only || notice.is_published)
            .cloned()
            .collect();
        newest_first(&mut rows, |row| (row.created_at, row.id));
        Ok(rows)
    }

    async fn create_notice(
        &self,
        notice: NewNotice,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let stored = Notice {
            id,
            title: notice.title,
            content: notice.content,
            notice_type: notice.notice_type,
            is_published: notice.is_published,
            published_at: notice.is_published.then_some(now),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.notices.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_notice(
        &self,
        id: i32,
        patch: NoticePatch,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError> {
        let mut tables = self.lock()?;
        let notice = tables
            .notices
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Notice"))?;
        if let Some(title) = patch.title {
            notice.title = title;
        }
        if let Some(content) = patch.content {
            notice.content = content;
        }
        if let Some(notice_type) = patch.notice_type {
            notice.notice_type = notice_type;
        }
        if let Some(is_published) = patch.is_published {
            notice.is_published = is_published;
        }
        if notice.is_published && notice.published_at.is_none() {
            notice.published_at = Some(now);
        }
        notice.updated_at = now;
        Ok(notice.clone())
    }
}

#[async_trait]
impl OtpStore for MemoryStorage {
    async fn replace_otp(&self, otp: NewOtp) -> Result<OtpVerification, StoreError> {
        let mut tables = self.lock()?;
        tables
            .otps
            .retain(|_, row| row.phone_number != otp.phone_number);
        let id = tables.next_id();
        let stored = OtpVerification {
            id,
            phone_number: otp.phone_number,
            otp: otp.otp,
            expires_at: otp.expires_at,
            verified: false,
            attempts: 0,
            created_at: Utc::now(),
        };
        tables.otps.insert(id, stored.clone());
        Ok(stored)
    }

    async fn latest_unverified_otp(
        &self,
        phone_number: &str,
    ) -> Result<Option<OtpVerification>, StoreError> {
        Ok(self
            .lock()?
            .otps
            .values()
            .filter(|row| row.phone_number == phone_number && !row.verified)
            .max_by_key(|row| (row.created_at, row.id))
            .cloned())
    }

    async fn record_failed_attempt(&self, id: i32) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables.otps.get_mut(&id).ok_or(StoreError::NotFound("OTP"))?;
        row.attempts += 1;
        Ok(())
    }

    async fn mark_otp_verified(&self, id: i32) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables.otps.get_mut(&id).ok_or(StoreError::NotFound("OTP"))?;
        row.verified = true;
        Ok(())
    }

    async fn has_verified_otp(&self, phone_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .otps
            .values()
            .any(|row| row.phone_number == phone_number && row.verified))
    }

    async fn delete_expired_otps(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let before = tables.otps.len();
        tables.otps.retain(|_, row| row.expires_at >= now);
        Ok((before - tables.otps.len()) as u64)
    }
}

#[async_trait]
impl ReferenceStore for MemoryStorage {
    async fn counties(&self) -> Result<Vec<County>, StoreError> {
        let mut rows: Vec<County> = self.lock()?.counties.values().cloned().collect();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    async fn constituencies(&self, county_id: i32) -> Result<Vec<Constituency>, StoreError> {
        let mut rows: Vec<Constituency> = self
            .lock()?
            .constituencies
            .values()
            .filter(|row| row.county_id == county_id)
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    async fn wards(&self, constituency_id: i32) -> Result<Vec<Ward>, StoreError> {
        let mut rows: Vec<Ward> = self
            .lock()?
            .wards
            .values()
            .filter(|row| row.constituency_id == constituency_id)
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    async fn constituency(&self, id: i32) -> Result<Option<Constituency>, StoreError> {
        Ok(self.lock()?.constituencies.get(&id).cloned())
    }

    async fn ward(&self, id: i32) -> Result<Option<Ward>, StoreError> {
        Ok(self.lock()?.wards.get(&id).cloned())
    }

    async fn catalog(&self) -> Result<ReferenceCatalog, StoreError> {
        Ok(self.lock()?.catalog.clone())
    }

    async fn upsert_county(&self, code: &str, name: &str) -> Result<County, StoreError> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.counties.values_mut().find(|row| row.code == code) {
            existing.name = name.to_string();
            return Ok(existing.clone());
        }
        let county = County {
            id: tables.next_id(),
            code: code.to_string(),
            name: name.to_string(),
        };
        tables.counties.insert(county.id, county.clone());
        Ok(county)
    }

    async fn upsert_constituency(
        &self,
        code: &str,
        name: &str,
        county_id: i32,
    ) -> Result<Constituency, StoreError> {
        let mut tables = self.lock()?;
        if !tables.counties.contains_key(&county_id) {
            return Err(StoreError::NotFound("County"));
        }
        if let Some(existing) = tables
            .constituencies
            .values_mut()
            .find(|row| row.code == code)
        {
            existing.name = name.to_string();
            existing.county_id = county_id;
            return Ok(existing.clone());
        }
        let constituency = Constituency {
            id: tables.next_id(),
            code: code.to_string(),
            name: name.to_string(),
            county_id,
        };
        tables
            .constituencies
            .insert(constituency.id, constituency.clone());
        Ok(constituency)
    }

    async fn upsert_ward(
        &self,
        code: &str,
        name: &str,
        constituency_id: i32,
    ) -> Result<Ward, StoreError> {
        let mut tables = self.lock()?;
        if !tables.constituencies.contains_key(&constituency_id) {
            return Err(StoreError::NotFound("Constituency"));
        }
        if let Some(existing) = tables.wards.values_mut().find(|row| row.code == code) {
            existing.name = name.to_string();
            existing.constituency_id = constituency_id;
            return Ok(existing.clone());
        }
        let ward = Ward {
            id: tables.next_id(),
            code: code.to_string(),
            name: name.to_string(),
            constituency_id,
        };
        tables.wards.insert(ward.id, ward.clone());
        Ok(ward)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
