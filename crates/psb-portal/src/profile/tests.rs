use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::{ProfileError, ProfileService, ProfileSubmission};
use crate::reference::seed::development_catalog;
use crate::schema::{
    ApplicantPatch, NewDocument, NewEducationRecord, NewEmploymentRecord, NewOtp, NewReferee,
};
use crate::storage::{ApplicantStore, MemoryStorage, OtpStore, ReferenceStore};

const USER: &str = "user-amina";

struct Locations {
    nairobi: i32,
    westlands: i32,
    parklands: i32,
    mombasa: i32,
    nyali: i32,
}

async fn service_with_locations() -> (Arc<MemoryStorage>, ProfileService<MemoryStorage>, Locations) {
    let store = Arc::new(MemoryStorage::with_catalog(development_catalog()));
    let nairobi = store.upsert_county("047", "Nairobi").await.expect("county");
    let mombasa = store.upsert_county("001", "Mombasa").await.expect("county");
    let westlands = store
        .upsert_constituency("274", "Westlands", nairobi.id)
        .await
        .expect("constituency");
    let nyali = store
        .upsert_constituency("001", "Nyali", mombasa.id)
        .await
        .expect("constituency");
    let parklands = store
        .upsert_ward("1373", "Parklands/Highridge", westlands.id)
        .await
        .expect("ward");
    let locations = Locations {
        nairobi: nairobi.id,
        westlands: westlands.id,
        parklands: parklands.id,
        mombasa: mombasa.id,
        nyali: nyali.id,
    };
    (Arc::clone(&store), ProfileService::new(store), locations)
}

fn personal_step() -> ProfileSubmission {
    ProfileSubmission {
        details: ApplicantPatch {
            first_name: Some("Amina".to_string()),
            surname: Some("Wanjiru".to_string()),
            phone_number: Some("0711000000".to_string()),
            national_id: Some("28765432".to_string()),
            gender: Some("female".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1993, 4, 18),
            ..ApplicantPatch::default()
        },
        ..ProfileSubmission::default()
    }
}

fn referee() -> NewReferee {
    NewReferee {
        name: "Dr. Otieno".to_string(),
        position: Some("Medical Superintendent".to_string()),
        organization: Some("Kenyatta National Hospital".to_string()),
        email: Some("otieno@knh.go.ke".to_string()),
        phone_number: Some("0722000111".to_string()),
        relationship: Some("Supervisor".to_string()),
    }
}

#[tokio::test]
async fn first_save_creates_profile_and_scores_completion() {
    let (_, service, _) = service_with_locations().await;
    let dossier = service
        .create(USER, personal_step())
        .await
        .expect("created");

    assert_eq!(dossier.applicant.user_id, USER);
    assert_eq!(dossier.applicant.first_name.as_deref(), Some("Amina"));
    assert_eq!(dossier.applicant.profile_completion_percentage, 16);
    assert!(!dossier.applicant.phone_verified);
}

#[tokio::test]
async fn second_create_is_refused() {
    let (_, service, _) = service_with_locations().await;
    service
        .create(USER, personal_step())
        .await
        .expect("created");

    let err = service
        .create(USER, personal_step())
        .await
        .expect_err("one profile per user");
    assert!(matches!(err, ProfileError::AlreadyExists));
    assert_eq!(err.to_string(), "Profile already exists");
}

#[tokio::test]
async fn update_without_profile_is_not_found() {
    let (_, service, _) = service_with_locations().await;
    let err = service
        .update(USER, personal_step())
        .await
        .expect_err("no profile yet");
    assert!(matches!(err, ProfileError::NotFound));
}

#[tokio::test]
async fn completion_never_decreases_across_saves() {
    let (_, service, places) = service_with_locations().await;
    service
        .create(USER, personal_step())
        .await
        .expect("created");

    let address = ProfileSubmission {
        details: ApplicantPatch {
            county_id: Some(places.nairobi),
            constituency_id: Some(places.westlands),
            ward_id: Some(places.parklands),
            ..ApplicantPatch::default()
        },
        referees: Some(vec![referee()]),
        ..ProfileSubmission::default()
    };
    let with_address = service.update(USER, address).await.expect("address saved");
    assert_eq!(with_address.applicant.profile_completion_percentage, 50);

    let cleared = ProfileSubmission {
        referees: Some(Vec::new()),
        ..ProfileSubmission::default()
    };
    let after = service.update(USER, cleared).await.expect("referees cleared");
    assert!(after.referees.is_empty());
    assert_eq!(after.applicant.profile_completion_percentage, 50);
}

#[tokio::test]
async fn full_wizard_reaches_one_hundred() {
    let (_, service, places) = service_with_locations().await;
    service
        .create(USER, personal_step())
        .await
        .expect("created");

    let rest = ProfileSubmission {
        details: ApplicantPatch {
            county_id: Some(places.nairobi),
            constituency_id: Some(places.westlands),
            ward_id: Some(places.parklands),
            ..ApplicantPatch::default()
        },
        education_records: Some(vec![NewEducationRecord {
            institution_id: 13,
            course_id: Some(11),
            award_id: 7,
            year_completed: Some(2016),
            grade: Some("Credit".to_string()),
        }]),
        employment_history: Some(vec![NewEmploymentRecord {
            employer: "Ministry of Health".to_string(),
            position: "Clinical Officer Intern".to_string(),
            start_date: NaiveDate::from_ymd_opt(2017, 1, 9),
            end_date: NaiveDate::from_ymd_opt(2018, 1, 8),
            is_current: false,
            duties: None,
        }]),
        referees: Some(vec![referee()]),
        documents: Some(vec![NewDocument {
            doc_type: "national_id".to_string(),
            file_name: "id-front.pdf".to_string(),
            file_path: "/uploads/3f1c.pdf".to_string(),
            file_size: Some(182_044),
            mime_type: Some("application/pdf".to_string()),
        }]),
    };
    let dossier = service.update(USER, rest).await.expect("saved");
    assert_eq!(dossier.applicant.profile_completion_percentage, 100);

    let reloaded = service.dossier(USER).await.expect("dossier");
    assert_eq!(reloaded.education_records.len(), 1);
    assert_eq!(reloaded.employment_history.len(), 1);
    assert_eq!(reloaded.documents[0].file_name, "id-front.pdf");
}

#[tokio::test]
async fn constituency_must_belong_to_county() {
    let (_, service, places) = service_with_locations().await;
    let mut submission = personal_step();
    submission.details.county_id = Some(places.mombasa);
    submission.details.constituency_id = Some(places.westlands);

    let err = service
        .create(USER, submission)
        .await
        .expect_err("mismatched hierarchy");
    let errors = match err {
        ProfileError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(
        errors.get("constituencyId"),
        Some(&["Constituency does not belong to the selected county".to_string()][..])
    );
}

#[tokio::test]
async fn ward_is_checked_against_stored_constituency() {
    let (_, service, places) = service_with_locations().await;
    let mut submission = personal_step();
    submission.details.county_id = Some(places.mombasa);
    submission.details.constituency_id = Some(places.nyali);
    service.create(USER, submission).await.expect("created");

    let ward_only = ProfileSubmission {
        details: ApplicantPatch {
            ward_id: Some(places.parklands),
            ..ApplicantPatch::default()
        },
        ..ProfileSubmission::default()
    };
    let err = service
        .update(USER, ward_only)
        .await
        .expect_err("ward in another constituency");
    assert!(matches!(err, ProfileError::Validation(ref errors) if errors.get("wardId").is_some()));
}

#[tokio::test]
async fn unknown_county_is_a_field_error() {
    let (store, service, _) = service_with_locations().await;
    let mut submission = personal_step();
    submission.details.county_id = Some(9999);

    let err = service
        .create(USER, submission)
        .await
        .expect_err("county does not exist");
    let errors = match err {
        ProfileError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(
        errors.get("countyId"),
        Some(&["County not found".to_string()][..])
    );
    assert!(store.applicant_for_user(USER).await.expect("read").is_none());
}

#[tokio::test]
async fn ward_needs_a_constituency() {
    let (_, service, places) = service_with_locations().await;
    let mut submission = personal_step();
    submission.details.ward_id = Some(places.parklands);

    let err = service
        .create(USER, submission)
        .await
        .expect_err("ward without constituency");
    assert!(
        matches!(err, ProfileError::Validation(ref errors) if errors.get("constituencyId").is_some())
    );
}

#[tokio::test]
async fn unknown_catalog_ids_are_field_errors() {
    let (_, service, _) = service_with_locations().await;
    service
        .create(USER, personal_step())
        .await
        .expect("created");

    let submission = ProfileSubmission {
        details: ApplicantPatch {
            profession_id: Some(404),
            ..ApplicantPatch::default()
        },
        education_records: Some(vec![NewEducationRecord {
            institution_id: 13,
            course_id: Some(500),
            award_id: 600,
            year_completed: Some(2016),
            grade: None,
        }]),
        ..ProfileSubmission::default()
    };
    let err = service
        .update(USER, submission)
        .await
        .expect_err("dangling lookup ids");
    let errors = match err {
        ProfileError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert!(errors.get("professionId").is_some());
    assert!(errors.get("educationRecords[0].awardId").is_some());
    assert!(errors.get("educationRecords[0].courseId").is_some());
    assert!(errors.get("educationRecords[0].institutionId").is_none());

    let dossier = service.dossier(USER).await.expect("dossier");
    assert!(dossier.education_records.is_empty());
    assert_eq!(dossier.applicant.profession_id, None);
}

#[tokio::test]
async fn nested_validation_reports_indexed_paths() {
    let (_, service, _) = service_with_locations().await;
    let mut bad_referee = referee();
    bad_referee.email = Some("otieno-at-knh".to_string());
    let submission = ProfileSubmission {
        details: ApplicantPatch {
            kra_pin: Some("A00".to_string()),
            ..ApplicantPatch::default()
        },
        referees: Some(vec![referee(), bad_referee]),
        ..ProfileSubmission::default()
    };

    let err = service.create(USER, submission).await.expect_err("invalid");
    let errors = match err {
        ProfileError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert!(errors.get("kraPin").is_some());
    assert!(errors.get("referees[1].email").is_some());
    assert!(errors.get("referees[0].email").is_none());
}

#[tokio::test]
async fn phone_verification_requires_verified_otp() {
    let (store, service, _) = service_with_locations().await;
    service
        .create(USER, personal_step())
        .await
        .expect("created");
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

    let err = service
        .verify_phone_at(USER, "0711000000", now)
        .await
        .expect_err("no otp yet");
    assert!(matches!(err, ProfileError::PhoneNotVerified));

    let otp = store
        .replace_otp(NewOtp {
            phone_number: "0711000000".to_string(),
            otp: "123456".to_string(),
            expires_at: now + Duration::minutes(5),
        })
        .await
        .expect("otp stored");
    store.mark_otp_verified(otp.id).await.expect("verified");

    let applicant = service
        .verify_phone_at(USER, " 0711000000 ", now)
        .await
        .expect("phone verified");
    assert!(applicant.phone_verified);
    assert_eq!(applicant.phone_verified_at, Some(now));
    assert_eq!(applicant.phone_number.as_deref(), Some("0711000000"));
}
