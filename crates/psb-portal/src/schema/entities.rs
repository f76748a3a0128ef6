use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{ApplicationStatus, IdDocumentType, NoticeType, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity-provider claims used to create or refresh a user on login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: i32,
    pub user_id: String,
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub other_name: Option<String>,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub alt_phone_number: Option<String>,
    pub national_id: Option<String>,
    pub id_passport_number: Option<String>,
    pub id_passport_type: Option<IdDocumentType>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub county_id: Option<i32>,
    pub constituency_id: Option<i32>,
    pub ward_id: Option<i32>,
    pub address: Option<String>,
    pub ethnicity: Option<String>,
    pub religion: Option<String>,
    pub is_pwd: Option<bool>,
    pub pwd_number: Option<String>,
    pub is_employee: Option<bool>,
    pub kra_pin: Option<String>,
    pub profession_id: Option<i32>,
    pub profile_completion_percentage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Applicant profile together with every owned child collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantDossier {
    #[serde(flatten)]
    pub applicant: Applicant,
    pub education_records: Vec<EducationRecord>,
    pub employment_history: Vec<EmploymentRecord>,
    pub referees: Vec<Referee>,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub department_id: i32,
    pub designation_id: i32,
    pub requirements: Option<serde_json::Value>,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A job accepts applications while active and on or before its deadline.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.is_active
            && self
                .application_deadline
                .map_or(true, |deadline| today <= deadline)
    }
}

/// Job joined with its department name and the designation's job group.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub department_name: String,
    pub designation_name: String,
    pub job_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i32,
    pub job_id: i32,
    pub applicant_id: i32,
    pub status: ApplicationStatus,
    pub submitted_on: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub interview_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i32,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phone verification challenge. Never serialized to clients.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OtpVerification {
    pub id: i32,
    pub phone_number: String,
    pub otp: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EducationRecord {
    pub id: i32,
    pub applicant_id: i32,
    pub institution_id: i32,
    pub course_id: Option<i32>,
    pub award_id: i32,
    pub year_completed: Option<i32>,
    pub grade: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEducationRecord {
    #[validate(range(min = 1, message = "Institution is required"))]
    pub institution_id: i32,
    #[serde(default)]
    pub course_id: Option<i32>,
    #[validate(range(min = 1, message = "Award is required"))]
    pub award_id: i32,
    #[validate(range(min = 1950, max = 2100, message = "Year completed is out of range"))]
    pub year_completed: Option<i32>,
    #[validate(length(max = 10, message = "Grade must be at most 10 characters"))]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentRecord {
    pub id: i32,
    pub applicant_id: i32,
    pub employer: String,
    pub position: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub duties: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEmploymentRecord {
    #[validate(length(min = 1, max = 200, message = "Employer is required"))]
    pub employer: String,
    #[validate(length(min = 1, max = 150, message = "Position is required"))]
    pub position: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub duties: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Referee {
    pub id: i32,
    pub applicant_id: i32,
    pub name: String,
    pub position: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub relationship: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReferee {
    #[validate(length(min = 1, max = 150, message = "Referee name is required"))]
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[validate(email(message = "Referee email is invalid"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i32,
    pub applicant_id: i32,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: Option<i32>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "Document type is required"))]
    pub doc_type: String,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, max = 500, message = "File path is required"))]
    pub file_path: String,
    #[serde(default)]
    pub file_size: Option<i32>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(is_active: bool, deadline: Option<NaiveDate>) -> Job {
        let stamp = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        Job {
            id: 1,
            title: "Clinical Officer".to_string(),
            description: None,
            department_id: 1,
            designation_id: 1,
            requirements: None,
            application_deadline: deadline,
            is_active,
            created_by: "admin-1".to_string(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn job_open_until_deadline_inclusive() {
        let deadline = NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid");
        let job = job(true, Some(deadline));
        assert!(job.is_open_on(deadline));
        assert!(!job.is_open_on(deadline.succ_opt().expect("valid")));
    }

    #[test]
    fn inactive_job_is_closed_regardless_of_deadline() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).expect("valid");
        assert!(!job(false, None).is_open_on(today));
        assert!(job(true, None).is_open_on(today));
    }

    #[test]
    fn notice_serializes_type_field() {
        let stamp = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let notice = Notice {
            id: 3,
            title: "Shortlist published".to_string(),
            content: "See the attached list".to_string(),
            notice_type: NoticeType::Announcement,
            is_published: true,
            published_at: Some(stamp),
            created_by: "admin-1".to_string(),
            created_at: stamp,
            updated_at: stamp,
        };
        let json = serde_json::to_value(&notice).expect("serializes");
        assert_eq!(json["type"], "announcement");
        assert_eq!(json["isPublished"], true);
    }
}
