use serde::Serialize;

use crate::schema::{Applicant, ApplicantDossier, Role};

/// The six wizard sections that make up a complete applicant profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileSection {
    Personal,
    Address,
    Education,
    Employment,
    Referees,
    Documents,
}

impl ProfileSection {
    pub const ALL: [ProfileSection; 6] = [
        ProfileSection::Personal,
        ProfileSection::Address,
        ProfileSection::Education,
        ProfileSection::Employment,
        ProfileSection::Referees,
        ProfileSection::Documents,
    ];

    pub fn is_complete(self, dossier: &ApplicantDossier) -> bool {
        let applicant = &dossier.applicant;
        match self {
            ProfileSection::Personal => personal_details_complete(applicant),
            ProfileSection::Address => {
                applicant.county_id.is_some()
                    && applicant.constituency_id.is_some()
                    && applicant.ward_id.is_some()
            }
            ProfileSection::Education => !dossier.education_records.is_empty(),
            ProfileSection::Employment => !dossier.employment_history.is_empty(),
            ProfileSection::Referees => !dossier.referees.is_empty(),
            ProfileSection::Documents => !dossier.documents.is_empty(),
        }
    }
}

fn personal_details_complete(applicant: &Applicant) -> bool {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    filled(&applicant.first_name)
        && filled(&applicant.surname)
        && filled(&applicant.phone_number)
        && filled(&applicant.gender)
        && applicant.date_of_birth.is_some()
        && (filled(&applicant.national_id) || filled(&applicant.id_passport_number))
}

/// Share of completed sections, 0-100.
pub fn completion_percentage(dossier: &ApplicantDossier) -> i32 {
    let done = ProfileSection::ALL
        .into_iter()
        .filter(|section| section.is_complete(dossier))
        .count();
    (done * 100 / ProfileSection::ALL.len()) as i32
}

/// Where the client should land after login.
pub fn redirect_url(role: Role, applicant: Option<&Applicant>) -> &'static str {
    match (role, applicant) {
        (Role::Applicant, None) => "/profile?step=1&reason=complete_profile",
        (Role::Applicant, Some(profile)) if profile.profile_completion_percentage < 100 => {
            "/profile?step=2&reason=incomplete_profile"
        }
        (Role::Applicant, Some(_)) => "/dashboard",
        (Role::Admin, _) => "/admin",
        (Role::Board, _) => "/board",
    }
}
