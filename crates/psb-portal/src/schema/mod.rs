//! Relational entities shared by every layer of the portal.
//!
//! Row types derive `sqlx::FromRow` for the Postgres store and serialize in camelCase.

mod changes;
mod entities;
mod reference;

pub use changes::{
    ApplicantPatch, JobPatch, NewApplication, NewJob, NewNotice, NewOtp, NoticePatch,
    ReviewChanges,
};
pub use entities::{
    Applicant, ApplicantDossier, Application, Document, EducationRecord, EmploymentRecord, Job,
    JobListing, NewDocument, NewEducationRecord, NewEmploymentRecord, NewReferee, Notice,
    OtpVerification, Referee, UpsertUser, User,
};
pub use reference::{
    Award, Constituency, County, CourseOffered, Department, Designation, Institution, Profession,
    ReferenceCatalog, Specialization, Ward,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DDL for every table the portal owns. Statements are idempotent.
pub const SCHEMA_SQL: &str = include_str!("portal.sql");

/// Closed set of portal roles. Assigned out-of-band; never self-elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Admin,
    Board,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Admin => "admin",
            Role::Board => "board",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(Role::Applicant),
            "admin" => Ok(Role::Admin),
            "board" => Ok(Role::Board),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Shortlisted,
    Interviewed,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    /// Hired and rejected applications never move again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or(UnknownVariant {
                kind: "application status",
                value: normalized,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IdDocumentType {
    NationalId,
    Passport,
    AlienId,
}

impl IdDocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            IdDocumentType::NationalId => "national_id",
            IdDocumentType::Passport => "passport",
            IdDocumentType::AlienId => "alien_id",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeType {
    #[default]
    General,
    Announcement,
    Update,
}

impl NoticeType {
    pub const fn label(self) -> &'static str {
        match self {
            NoticeType::General => "general",
            NoticeType::Announcement => "announcement",
            NoticeType::Update => "update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "Shortlisted".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Shortlisted)
        );
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn only_rejected_and_hired_are_terminal() {
        let terminal: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![ApplicationStatus::Rejected, ApplicationStatus::Hired]
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Role::Board).expect("serializes");
        assert_eq!(json, "\"board\"");
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
    }
}
