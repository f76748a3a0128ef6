use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::*;
use crate::schema::{Department, Designation, NoticeType};

fn catalog() -> ReferenceCatalog {
    ReferenceCatalog {
        departments: vec![Department {
            id: 1,
            name: "Health Services".to_string(),
        }],
        designations: vec![Designation {
            id: 2,
            name: "Clinical Officer".to_string(),
            job_group: "CPSB 08".to_string(),
        }],
        ..ReferenceCatalog::default()
    }
}

fn new_job(title: &str) -> NewJob {
    NewJob {
        title: title.to_string(),
        description: None,
        department_id: 1,
        designation_id: 2,
        requirements: None,
        application_deadline: None,
        is_active: true,
    }
}

fn submitted(job_id: i32, applicant_id: i32) -> NewApplication {
    NewApplication {
        job_id,
        applicant_id,
        status: ApplicationStatus::Submitted,
        submitted_on: NaiveDate::from_ymd_opt(2025, 3, 3),
    }
}

#[tokio::test]
async fn upsert_keeps_assigned_role() {
    let store = MemoryStorage::new();
    let claims = UpsertUser {
        id: "user-1".to_string(),
        email: Some("wanjiku@example.com".to_string()),
        ..UpsertUser::default()
    };
    let created = store.upsert_user(claims.clone()).await.expect("insert");
    assert_eq!(created.role, Role::Applicant);

    store
        .set_user_role("user-1", Role::Board)
        .await
        .expect("role assigned");
    let refreshed = store
        .upsert_user(UpsertUser {
            first_name: Some("Wanjiku".to_string()),
            ..claims
        })
        .await
        .expect("refresh");

    assert_eq!(refreshed.role, Role::Board);
    assert_eq!(refreshed.first_name.as_deref(), Some("Wanjiku"));
}

#[tokio::test]
async fn second_application_for_same_job_conflicts() {
    let store = MemoryStorage::with_catalog(catalog());
    let job = store.create_job(new_job("Nurse"), "admin-1").await.expect("job");

    store
        .insert_application(submitted(job.id, 7))
        .await
        .expect("first application");
    let err = store
        .insert_application(submitted(job.id, 7))
        .await
        .expect_err("duplicate rejected");
    assert!(matches!(err, StoreError::Conflict(_)));

    let other_applicant = store
        .insert_application(submitted(job.id, 8))
        .await
        .expect("different applicant may apply");
    assert_eq!(other_applicant.status, ApplicationStatus::Submitted);
}

#[tokio::test]
async fn review_is_compare_and_set() {
    let store = MemoryStorage::with_catalog(catalog());
    let job = store.create_job(new_job("Nurse"), "admin-1").await.expect("job");
    let application = store
        .insert_application(submitted(job.id, 7))
        .await
        .expect("application");

    let shortlisted = store
        .review_application(
            application.id,
            ApplicationStatus::Submitted,
            ReviewChanges {
                status: ApplicationStatus::Shortlisted,
                remarks: Some("Meets minimum requirements".to_string()),
                interview_date: NaiveDate::from_ymd_opt(2025, 4, 1),
                interview_score: None,
            },
        )
        .await
        .expect("shortlisted");
    assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);

    let stale = store
        .review_application(
            application.id,
            ApplicationStatus::Submitted,
            ReviewChanges {
                status: ApplicationStatus::Rejected,
                remarks: Some("late".to_string()),
                interview_date: None,
                interview_score: None,
            },
        )
        .await
        .expect_err("stale expectation refused");
    assert!(matches!(stale, StoreError::Conflict(_)));

    let current = store
        .application(application.id)
        .await
        .expect("read")
        .expect("exists");
    assert_eq!(current.status, ApplicationStatus::Shortlisted);
    assert_eq!(current.remarks.as_deref(), Some("Meets minimum requirements"));
}

#[tokio::test]
async fn listing_joins_department_and_job_group() {
    let store = MemoryStorage::with_catalog(catalog());
    let open = store.create_job(new_job("Nurse"), "admin-1").await.expect("job");
    let closed = store
        .create_job(
            NewJob {
                is_active: false,
                ..new_job("Pharmacist")
            },
            "admin-1",
        )
        .await
        .expect("job");

    let active = store
        .list_jobs(JobFilter {
            department_id: Some(1),
            active_only: true,
        })
        .await
        .expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].job.id, open.id);
    assert_eq!(active[0].job_group, "CPSB 08");
    assert_eq!(active[0].department_name, "Health Services");

    let everything = store.list_jobs(JobFilter::default()).await.expect("list");
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[0].job.id, closed.id);
}

#[tokio::test]
async fn new_otp_supersedes_previous_for_same_phone() {
    let store = MemoryStorage::new();
    let expires_at = Utc.with_ymd_and_hms(2025, 5, 1, 9, 5, 0).unwrap();
    let first = store
        .replace_otp(NewOtp {
            phone_number: "0711000000".to_string(),
            otp: "111111".to_string(),
            expires_at,
        })
        .await
        .expect("first");
    let second = store
        .replace_otp(NewOtp {
            phone_number: "0711000000".to_string(),
            otp: "222222".to_string(),
            expires_at,
        })
        .await
        .expect("second");

    let live = store
        .latest_unverified_otp("0711000000")
        .await
        .expect("read")
        .expect("live record");
    assert_eq!(live.id, second.id);
    assert_ne!(live.id, first.id);
    assert_eq!(live.otp, "222222");
}

#[tokio::test]
async fn expired_otps_are_swept() {
    let store = MemoryStorage::new();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    for (phone, offset) in [("0711000001", -60), ("0711000002", 240)] {
        store
            .replace_otp(NewOtp {
                phone_number: phone.to_string(),
                otp: "123456".to_string(),
                expires_at: now + Duration::seconds(offset),
            })
            .await
            .expect("issue");
    }

    let removed = store.delete_expired_otps(now).await.expect("sweep");
    assert_eq!(removed, 1);
    assert!(store
        .latest_unverified_otp("0711000002")
        .await
        .expect("read")
        .is_some());
}

#[tokio::test]
async fn notice_published_at_is_stamped_once() {
    let store = MemoryStorage::new();
    let drafted = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    let notice = store
        .create_notice(
            NewNotice {
                title: "Interview schedule".to_string(),
                content: "Interviews start on Monday".to_string(),
                notice_type: NoticeType::Announcement,
                is_published: false,
            },
            "admin-1",
            drafted,
        )
        .await
        .expect("created");
    assert!(notice.published_at.is_none());

    let first_publish = drafted + Duration::days(1);
    let published = store
        .update_notice(
            notice.id,
            NoticePatch {
                is_published: Some(true),
                ..NoticePatch::default()
            },
            first_publish,
        )
        .await
        .expect("published");
    assert_eq!(published.published_at, Some(first_publish));

    let edited = store
        .update_notice(
            notice.id,
            NoticePatch {
                title: Some("Revised interview schedule".to_string()),
                ..NoticePatch::default()
            },
            first_publish + Duration::days(2),
        )
        .await
        .expect("edited");
    assert_eq!(edited.published_at, Some(first_publish));
    assert_eq!(
        store.list_notices(true).await.expect("published list").len(),
        1
    );
}

#[tokio::test]
async fn child_collections_are_replaced_on_save() {
    let store = MemoryStorage::new();
    let applicant = store
        .create_applicant("user-1", ApplicantPatch::default(), 0)
        .await
        .expect("applicant");
    let referee = |name: &str| NewReferee {
        name: name.to_string(),
        position: None,
        organization: None,
        email: None,
        phone_number: None,
        relationship: None,
    };

    store
        .replace_referees(applicant.id, vec![referee("Achieng"), referee("Kiprono")])
        .await
        .expect("first save");
    store
        .replace_referees(applicant.id, vec![referee("Muthoni")])
        .await
        .expect("second save");

    let stored = store.referees(applicant.id).await.expect("read");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Muthoni");
}

#[tokio::test]
async fn constituency_requires_known_county() {
    let store = MemoryStorage::new();
    let err = store
        .upsert_constituency("290", "Westlands", 99)
        .await
        .expect_err("orphan refused");
    assert!(matches!(err, StoreError::NotFound("County")));

    let county = store.upsert_county("047", "Nairobi").await.expect("county");
    let renamed = store
        .upsert_county("047", "Nairobi City")
        .await
        .expect("upsert by code");
    assert_eq!(renamed.id, county.id);
    assert_eq!(store.counties().await.expect("list").len(), 1);
}
