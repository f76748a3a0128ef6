use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use super::{
    ApplicantStore, ApplicationFilter, ApplicationStore, JobFilter, JobStore, NoticeStore,
    OtpStore, ReferenceStore, Storage, StoreError, UserStore,
};
use crate::schema::{
    Applicant, ApplicantPatch, Application, ApplicationStatus, Award, Constituency, County,
    CourseOffered, Department, Designation, Document, EducationRecord, EmploymentRecord,
    Institution, Job, JobListing, JobPatch, NewApplication, NewDocument, NewEducationRecord,
    NewEmploymentRecord, NewJob, NewNotice, NewOtp, NewReferee, Notice, NoticePatch,
    OtpVerification, Profession, Referee, ReferenceCatalog, ReviewChanges, Role, Specialization,
    UpsertUser, User, Ward, SCHEMA_SQL,
};

const JOB_LISTING_SELECT: &str = r#"
    SELECT j.*, d.name AS department_name, g.name AS designation_name, g.job_group
    FROM jobs j
    JOIN departments d ON d.id = j.department_id
    JOIN designations g ON g.id = j.designation_id
"#;

/// Postgres-backed store. Queries are checked at runtime, so no database is needed to build.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(Some(Duration::from_secs(300)))
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&pool)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create any missing tables, constraints and indexes.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

type ApplicantQuery<'q> = QueryAs<'q, Postgres, Applicant, PgArguments>;

/// Binds the 23 patch columns in declaration order, starting at `$2`.
fn bind_patch(query: ApplicantQuery<'_>, patch: ApplicantPatch) -> ApplicantQuery<'_> {
    query
        .bind(patch.salutation)
        .bind(patch.first_name)
        .bind(patch.surname)
        .bind(patch.other_name)
        .bind(patch.phone_number)
        .bind(patch.alt_phone_number)
        .bind(patch.national_id)
        .bind(patch.id_passport_number)
        .bind(patch.id_passport_type.map(|kind| kind.label()))
        .bind(patch.date_of_birth)
        .bind(patch.gender)
        .bind(patch.nationality)
        .bind(patch.county_id)
        .bind(patch.constituency_id)
        .bind(patch.ward_id)
        .bind(patch.address)
        .bind(patch.ethnicity)
        .bind(patch.religion)
        .bind(patch.is_pwd)
        .bind(patch.pwd_number)
        .bind(patch.is_employee)
        .bind(patch.kra_pin)
        .bind(patch.profession_id)
}

#[async_trait]
impl UserStore for PgStorage {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User, StoreError> {
        let stored = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, profile_image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                profile_image_url = EXCLUDED.profile_image_url,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.profile_image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn set_user_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role.label())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("User"))
    }
}

#[async_trait]
impl ApplicantStore for PgStorage {
    async fn applicant_for_user(&self, user_id: &str) -> Result<Option<Applicant>, StoreError> {
        let applicant = sqlx::query_as::<_, Applicant>("SELECT * FROM applicants WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(applicant)
    }

    async fn create_applicant(
        &self,
        user_id: &str,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError> {
        let query = sqlx::query_as::<_, Applicant>(
            r#"
            INSERT INTO applicants (
                user_id, salutation, first_name, surname, other_name, phone_number,
                alt_phone_number, national_id, id_passport_number, id_passport_type,
                date_of_birth, gender, nationality, county_id, constituency_id, ward_id,
                address, ethnicity, religion, is_pwd, pwd_number, is_employee, kra_pin,
                profession_id, profile_completion_percentage
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id.to_string());

        bind_patch(query, patch)
            .bind(completion)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::Conflict("Applicant profile already exists".to_string()))
    }

    async fn update_applicant(
        &self,
        applicant_id: i32,
        patch: ApplicantPatch,
        completion: i32,
    ) -> Result<Applicant, StoreError> {
        let query = sqlx::query_as::<_, Applicant>(
            r#"
            UPDATE applicants SET
                salutation = COALESCE($2, salutation),
                first_name = COALESCE($3, first_name),
                surname = COALESCE($4, surname),
                other_name = COALESCE($5, other_name),
                phone_number = COALESCE($6, phone_number),
                alt_phone_number = COALESCE($7, alt_phone_number),
                national_id = COALESCE($8, national_id),
                id_passport_number = COALESCE($9, id_passport_number),
                id_passport_type = COALESCE($10, id_passport_type),
                date_of_birth = COALESCE($11, date_of_birth),
                gender = COALESCE($12, gender),
                nationality = COALESCE($13, nationality),
                county_id = COALESCE($14, county_id),
                constituency_id = COALESCE($15, constituency_id),
                ward_id = COALESCE($16, ward_id),
                address = COALESCE($17, address),
                ethnicity = COALESCE($18, ethnicity),
                religion = COALESCE($19, religion),
                is_pwd = COALESCE($20, is_pwd),
                pwd_number = COALESCE($21, pwd_number),
                is_employee = COALESCE($22, is_employee),
                kra_pin = COALESCE($23, kra_pin),
                profession_id = COALESCE($24, profession_id),
                profile_completion_percentage = $25,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(applicant_id);

        bind_patch(query, patch)
            .bind(completion)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Applicant"))
    }

    async fn mark_phone_verified(
        &self,
        applicant_id: i32,
        phone_number: &str,
        at: DateTime<Utc>,
    ) -> Result<Applicant, StoreError> {
        sqlx::query_as::<_, Applicant>(
            r#"
            UPDATE applicants
            SET phone_number = $2, phone_verified = true, phone_verified_at = $3, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(applicant_id)
        .bind(phone_number)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Applicant"))
    }

    async fn education_records(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<EducationRecord>, StoreError> {
        let rows = sqlx::query_as::<_, EducationRecord>(
            "SELECT * FROM education_records WHERE applicant_id = $1 ORDER BY id",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn employment_history(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<EmploymentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, EmploymentRecord>(
            "SELECT * FROM employment_history WHERE applicant_id = $1 ORDER BY id",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn referees(&self, applicant_id: i32) -> Result<Vec<Referee>, StoreError> {
        let rows =
            sqlx::query_as::<_, Referee>("SELECT * FROM referees WHERE applicant_id = $1 ORDER BY id")
                .bind(applicant_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn documents(&self, applicant_id: i32) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE applicant_id = $1 ORDER BY id",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_education_records(
        &self,
        applicant_id: i32,
        records: Vec<NewEducationRecord>,
    ) -> Result<Vec<EducationRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM education_records WHERE applicant_id = $1")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, EducationRecord>(
                r#"
                INSERT INTO education_records
                    (applicant_id, institution_id, course_id, award_id, year_completed, grade)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(applicant_id)
            .bind(record.institution_id)
            .bind(record.course_id)
            .bind(record.award_id)
            .bind(record.year_completed)
            .bind(record.grade)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn replace_employment_history(
        &self,
        applicant_id: i32,
        records: Vec<NewEmploymentRecord>,
    ) -> Result<Vec<EmploymentRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM employment_history WHERE applicant_id = $1")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, EmploymentRecord>(
                r#"
                INSERT INTO employment_history
                    (applicant_id, employer, position, start_date, end_date, is_current, duties)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(applicant_id)
            .bind(record.employer)
            .bind(record.position)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(record.is_current)
            .bind(record.duties)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn replace_referees(
        &self,
        applicant_id: i32,
        referees: Vec<NewReferee>,
    ) -> Result<Vec<Referee>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM referees WHERE applicant_id = $1")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(referees.len());
        for referee in referees {
            let row = sqlx::query_as::<_, Referee>(
                r#"
                INSERT INTO referees
                    (applicant_id, name, position, organization, email, phone_number, relationship)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(applicant_id)
            .bind(referee.name)
            .bind(referee.position)
            .bind(referee.organization)
            .bind(referee.email)
            .bind(referee.phone_number)
            .bind(referee.relationship)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn replace_documents(
        &self,
        applicant_id: i32,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE applicant_id = $1")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(documents.len());
        for document in documents {
            let row = sqlx::query_as::<_, Document>(
                r#"
                INSERT INTO documents
                    (applicant_id, doc_type, file_name, file_path, file_size, mime_type)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(applicant_id)
            .bind(document.doc_type)
            .bind(document.file_name)
            .bind(document.file_path)
            .bind(document.file_size)
            .bind(document.mime_type)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }
}

#[async_trait]
impl JobStore for PgStorage {
    async fn job(&self, id: i32) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn job_listing(&self, id: i32) -> Result<Option<JobListing>, StoreError> {
        let sql = format!("{JOB_LISTING_SELECT} WHERE j.id = $1");
        let listing = sqlx::query_as::<_, JobListing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<JobListing>, StoreError> {
        let sql = format!(
            "{JOB_LISTING_SELECT}
            WHERE ($1::int IS NULL OR j.department_id = $1)
              AND (NOT $2 OR j.is_active)
            ORDER BY j.created_at DESC, j.id DESC"
        );
        let listings = sqlx::query_as::<_, JobListing>(&sql)
            .bind(filter.department_id)
            .bind(filter.active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(listings)
    }

    async fn create_job(&self, job: NewJob, created_by: &str) -> Result<Job, StoreError> {
        let stored = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (
                title, description, department_id, designation_id, requirements,
                application_deadline, is_active, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(job.title)
        .bind(job.description)
        .bind(job.department_id)
        .bind(job.designation_id)
        .bind(job.requirements)
        .bind(job.application_deadline)
        .bind(job.is_active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update_job(&self, id: i32, patch: JobPatch) -> Result<Job, StoreError> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                department_id = COALESCE($4, department_id),
                designation_id = COALESCE($5, designation_id),
                requirements = COALESCE($6, requirements),
                application_deadline = COALESCE($7, application_deadline),
                is_active = COALESCE($8, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.department_id)
        .bind(patch.designation_id)
        .bind(patch.requirements)
        .bind(patch.application_deadline)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Job"))
    }
}

#[async_trait]
impl ApplicationStore for PgStorage {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, StoreError> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (job_id, applicant_id, status, submitted_on)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT applications_applicant_job_unique DO NOTHING
            RETURNING *
            "#,
        )
        .bind(application.job_id)
        .bind(application.applicant_id)
        .bind(application.status.label())
        .bind(application.submitted_on)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Conflict("You have already applied for this job".to_string()))
    }

    async fn application(&self, id: i32) -> Result<Option<Application>, StoreError> {
        let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError> {
        let rows = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        let rows = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE ($1::int IS NULL OR job_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.job_id)
        .bind(filter.status.map(ApplicationStatus::label))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn review_application(
        &self,
        id: i32,
        expected: ApplicationStatus,
        changes: ReviewChanges,
    ) -> Result<Application, StoreError> {
        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications SET
                status = $3,
                remarks = COALESCE($4, remarks),
                interview_date = COALESCE($5, interview_date),
                interview_score = COALESCE($6, interview_score),
                updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.label())
        .bind(changes.status.label())
        .bind(changes.remarks)
        .bind(changes.interview_date)
        .bind(changes.interview_score)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(application) = updated {
            return Ok(application);
        }

        let current = sqlx::query_scalar::<_, String>("SELECT status FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Err(StoreError::NotFound("Application")),
            Some(status) => Err(StoreError::Conflict(format!(
                "Application status changed to {status} while it was being reviewed"
            ))),
        }
    }
}

#[async_trait]
impl NoticeStore for PgStorage {
    async fn notice(&self, id: i32) -> Result<Option<Notice>, StoreError> {
        let notice = sqlx::query_as::<_, Notice>("SELECT * FROM notices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notice)
    }

    async fn list_notices(&self, published_only: bool) -> Result<Vec<Notice>, StoreError> {
        let rows = sqlx::query_as::<_, Notice>(
            "SELECT * FROM notices WHERE (NOT $1 OR is_published) ORDER BY created_at DESC, id DESC",
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_notice(
        &self,
        notice: NewNotice,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError> {
        let stored = sqlx::query_as::<_, Notice>(
            r#"
            INSERT INTO notices
                (title, content, notice_type, is_published, published_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, CASE WHEN $4 THEN $6 END, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(notice.title)
        .bind(notice.content)
        .bind(notice.notice_type.label())
        .bind(notice.is_published)
        .bind(created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update_notice(
        &self,
        id: i32,
        patch: NoticePatch,
        now: DateTime<Utc>,
    ) -> Result<Notice, StoreError> {
        sqlx::query_as::<_, Notice>(
            r#"
            UPDATE notices SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                notice_type = COALESCE($4, notice_type),
                is_published = COALESCE($5, is_published),
                published_at = CASE
                    WHEN COALESCE($5, is_published) AND published_at IS NULL THEN $6
                    ELSE published_at
                END,
                updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.notice_type.map(|kind| kind.label()))
        .bind(patch.is_published)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Notice"))
    }
}

#[async_trait]
impl OtpStore for PgStorage {
    async fn replace_otp(&self, otp: NewOtp) -> Result<OtpVerification, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM otp_verifications WHERE phone_number = $1")
            .bind(&otp.phone_number)
            .execute(&mut *tx)
            .await?;
        let stored = sqlx::query_as::<_, OtpVerification>(
            r#"
            INSERT INTO otp_verifications (phone_number, otp, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(otp.phone_number)
        .bind(otp.otp)
        .bind(otp.expires_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn latest_unverified_otp(
        &self,
        phone_number: &str,
    ) -> Result<Option<OtpVerification>, StoreError> {
        let row = sqlx::query_as::<_, OtpVerification>(
            r#"
            SELECT * FROM otp_verifications
            WHERE phone_number = $1 AND NOT verified
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn record_failed_attempt(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE otp_verifications SET attempts = attempts + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("OTP"));
        }
        Ok(())
    }

    async fn mark_otp_verified(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE otp_verifications SET verified = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("OTP"));
        }
        Ok(())
    }

    async fn has_verified_otp(&self, phone_number: &str) -> Result<bool, StoreError> {
        let verified = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM otp_verifications WHERE phone_number = $1 AND verified)",
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(verified)
    }

    async fn delete_expired_otps(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM otp_verifications WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReferenceStore for PgStorage {
    async fn counties(&self) -> Result<Vec<County>, StoreError> {
        let rows = sqlx::query_as::<_, County>("SELECT * FROM counties ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn constituencies(&self, county_id: i32) -> Result<Vec<Constituency>, StoreError> {
        let rows = sqlx::query_as::<_, Constituency>(
            "SELECT * FROM constituencies WHERE county_id = $1 ORDER BY name",
        )
        .bind(county_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn wards(&self, constituency_id: i32) -> Result<Vec<Ward>, StoreError> {
        let rows = sqlx::query_as::<_, Ward>(
            "SELECT * FROM wards WHERE constituency_id = $1 ORDER BY name",
        )
        .bind(constituency_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn constituency(&self, id: i32) -> Result<Option<Constituency>, StoreError> {
        let row = sqlx::query_as::<_, Constituency>("SELECT * FROM constituencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn ward(&self, id: i32) -> Result<Option<Ward>, StoreError> {
        let row = sqlx::query_as::<_, Ward>("SELECT * FROM wards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn catalog(&self) -> Result<ReferenceCatalog, StoreError> {
        let departments = sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let designations =
            sqlx::query_as::<_, Designation>("SELECT * FROM designations ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        let awards = sqlx::query_as::<_, Award>("SELECT * FROM awards ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let courses = sqlx::query_as::<_, CourseOffered>("SELECT * FROM courses_offered ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let institutions =
            sqlx::query_as::<_, Institution>("SELECT * FROM institutions ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        let professions = sqlx::query_as::<_, Profession>("SELECT * FROM professions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let specializations =
            sqlx::query_as::<_, Specialization>("SELECT * FROM specializations ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(ReferenceCatalog {
            departments,
            designations,
            awards,
            courses,
            institutions,
            professions,
            specializations,
        })
    }

    async fn upsert_county(&self, code: &str, name: &str) -> Result<County, StoreError> {
        let county = sqlx::query_as::<_, County>(
            r#"
            INSERT INTO counties (code, name) VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(county)
    }

    async fn upsert_constituency(
        &self,
        code: &str,
        name: &str,
        county_id: i32,
    ) -> Result<Constituency, StoreError> {
        let constituency = sqlx::query_as::<_, Constituency>(
            r#"
            INSERT INTO constituencies (code, name, county_id) VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, county_id = EXCLUDED.county_id
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(county_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(constituency)
    }

    async fn upsert_ward(
        &self,
        code: &str,
        name: &str,
        constituency_id: i32,
    ) -> Result<Ward, StoreError> {
        let ward = sqlx::query_as::<_, Ward>(
            r#"
            INSERT INTO wards (code, name, constituency_id) VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE
                SET name = EXCLUDED.name, constituency_id = EXCLUDED.constituency_id
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(constituency_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(ward)
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
