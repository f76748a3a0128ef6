//! Write models: what callers send to the stores, as opposed to the rows they get back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApplicationStatus, IdDocumentType, NoticeType};

/// Partial update of the applicant profile. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantPatch {
    #[validate(length(max = 10, message = "Salutation must be at most 10 characters"))]
    pub salutation: Option<String>,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Surname is required"))]
    pub surname: Option<String>,
    #[validate(length(max = 100, message = "Other name must be at most 100 characters"))]
    pub other_name: Option<String>,
    #[validate(length(min = 10, max = 20, message = "Phone number must be 10-20 characters"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 20, message = "Alternative phone must be at most 20 characters"))]
    pub alt_phone_number: Option<String>,
    #[validate(length(min = 6, max = 20, message = "National ID must be 6-20 characters"))]
    pub national_id: Option<String>,
    #[validate(length(max = 20, message = "Document number must be at most 20 characters"))]
    pub id_passport_number: Option<String>,
    pub id_passport_type: Option<IdDocumentType>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 10, message = "Gender must be at most 10 characters"))]
    pub gender: Option<String>,
    #[validate(length(max = 50, message = "Nationality must be at most 50 characters"))]
    pub nationality: Option<String>,
    pub county_id: Option<i32>,
    pub constituency_id: Option<i32>,
    pub ward_id: Option<i32>,
    pub address: Option<String>,
    #[validate(length(max = 50, message = "Ethnicity must be at most 50 characters"))]
    pub ethnicity: Option<String>,
    #[validate(length(max = 50, message = "Religion must be at most 50 characters"))]
    pub religion: Option<String>,
    pub is_pwd: Option<bool>,
    #[validate(length(max = 50, message = "PWD number must be at most 50 characters"))]
    pub pwd_number: Option<String>,
    pub is_employee: Option<bool>,
    #[validate(length(equal = 11, message = "KRA PIN must be 11 characters"))]
    pub kra_pin: Option<String>,
    pub profession_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Department is required"))]
    pub department_id: i32,
    #[validate(range(min = 1, message = "Designation is required"))]
    pub designation_id: i32,
    pub requirements: Option<serde_json::Value>,
    pub application_deadline: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[validate(length(min = 1, max = 200, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub department_id: Option<i32>,
    pub designation_id: Option<i32>,
    pub requirements: Option<serde_json::Value>,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotice {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(rename = "type", default)]
    pub notice_type: NoticeType,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NoticePatch {
    #[validate(length(min = 1, max = 200, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub notice_type: Option<NoticeType>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub job_id: i32,
    pub applicant_id: i32,
    pub status: ApplicationStatus,
    pub submitted_on: Option<NaiveDate>,
}

/// Fields written alongside a status transition. `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewChanges {
    pub status: ApplicationStatus,
    pub remarks: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub interview_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOtp {
    pub phone_number: String,
    pub otp: String,
    pub expires_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
