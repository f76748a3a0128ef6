//! Small fixed dataset for `serve --memory` and the demo command.

use crate::schema::{
    Award, CourseOffered, Department, Designation, Institution, Profession, ReferenceCatalog,
    Specialization,
};
use crate::storage::{ReferenceStore, StoreError};

pub fn development_catalog() -> ReferenceCatalog {
    ReferenceCatalog {
        departments: vec![
            Department {
                id: 1,
                name: "Health Services".to_string(),
            },
            Department {
                id: 2,
                name: "Finance and Economic Planning".to_string(),
            },
            Department {
                id: 3,
                name: "Education and Vocational Training".to_string(),
            },
        ],
        designations: vec![
            Designation {
                id: 4,
                name: "Clinical Officer II".to_string(),
                job_group: "CPSB 08".to_string(),
            },
            Designation {
                id: 5,
                name: "Accountant II".to_string(),
                job_group: "CPSB 09".to_string(),
            },
            Designation {
                id: 6,
                name: "ECDE Teacher".to_string(),
                job_group: "CPSB 07".to_string(),
            },
        ],
        awards: vec![
            Award {
                id: 7,
                name: "Diploma".to_string(),
            },
            Award {
                id: 8,
                name: "Bachelor's Degree".to_string(),
            },
        ],
        specializations: vec![
            Specialization {
                id: 9,
                name: "Clinical Medicine".to_string(),
            },
            Specialization {
                id: 10,
                name: "Accounting".to_string(),
            },
        ],
        courses: vec![
            CourseOffered {
                id: 11,
                name: "Diploma in Clinical Medicine and Surgery".to_string(),
                specialization_id: 9,
                award_id: 7,
            },
            CourseOffered {
                id: 12,
                name: "Bachelor of Commerce (Accounting)".to_string(),
                specialization_id: 10,
                award_id: 8,
            },
        ],
        institutions: vec![
            Institution {
                id: 13,
                name: "Kenya Medical Training College".to_string(),
            },
            Institution {
                id: 14,
                name: "University of Nairobi".to_string(),
            },
        ],
        professions: vec![
            Profession {
                id: 15,
                name: "Clinical Officer".to_string(),
            },
            Profession {
                id: 16,
                name: "Accountant".to_string(),
            },
        ],
    }
}

/// Two counties with one constituency and ward each.
pub async fn seed_locations<S>(store: &S) -> Result<(), StoreError>
where
    S: ReferenceStore + ?Sized,
{
    let nairobi = store.upsert_county("047", "Nairobi").await?;
    let westlands = store
        .upsert_constituency("274", "Westlands", nairobi.id)
        .await?;
    store
        .upsert_ward("1373", "Parklands/Highridge", westlands.id)
        .await?;

    let kisumu = store.upsert_county("042", "Kisumu").await?;
    let kisumu_central = store
        .upsert_constituency("241", "Kisumu Central", kisumu.id)
        .await?;
    store
        .upsert_ward("1209", "Milimani", kisumu_central.id)
        .await?;
    Ok(())
}
