use std::sync::Arc;

use chrono::NaiveDate;
use psb_portal::jobs::JobService;
use psb_portal::otp::{CodeGenerator, LogSmsGateway, OtpPolicy, OtpService};
use psb_portal::profile::{ProfileError, ProfileService, ProfileSubmission};
use psb_portal::reference::seed::development_catalog;
use psb_portal::reference::{LocationKind, ReferenceImporter};
use psb_portal::schema::{ApplicantPatch, ApplicationStatus, NewJob, NewReferee, Role};
use psb_portal::storage::{ApplicationFilter, MemoryStorage, ReferenceStore};
use psb_portal::workflow::{ApplicationWorkflow, InterviewScore, InterviewScorecard, WorkflowError};

const USER: &str = "user-achieng";

struct FixedCode(&'static str);

impl CodeGenerator for FixedCode {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
}

async fn import_locations(store: &MemoryStorage) -> (i32, i32, i32) {
    let counties = "code,name\n042,Kisumu\n047,Nairobi\n";
    let constituencies = "code,name,county_code\n241,Kisumu Central,042\n999,Nowhere,000\n";
    let wards = "code,name,constituency_code\n1209,Milimani,241\n";

    ReferenceImporter::from_reader(store, LocationKind::Counties, counties.as_bytes())
        .await
        .expect("counties");
    let summary =
        ReferenceImporter::from_reader(store, LocationKind::Constituencies, constituencies.as_bytes())
            .await
            .expect("constituencies");
    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.skipped_lines, vec![3]);
    ReferenceImporter::from_reader(store, LocationKind::Wards, wards.as_bytes())
        .await
        .expect("wards");

    let kisumu = store
        .counties()
        .await
        .expect("counties")
        .into_iter()
        .find(|county| county.name == "Kisumu")
        .expect("kisumu imported");
    let central = store
        .constituencies(kisumu.id)
        .await
        .expect("constituencies")
        .remove(0);
    let milimani = store.wards(central.id).await.expect("wards").remove(0);
    (kisumu.id, central.id, milimani.id)
}

#[tokio::test]
async fn applicant_is_hired_after_board_interview() {
    let store = Arc::new(MemoryStorage::with_catalog(development_catalog()));
    let (county, constituency, ward) = import_locations(&store).await;

    let profiles = ProfileService::new(Arc::clone(&store));
    let jobs = JobService::new(Arc::clone(&store));
    let workflow = ApplicationWorkflow::new(Arc::clone(&store));
    let otp = OtpService::with_codes(
        Arc::clone(&store),
        Arc::new(LogSmsGateway),
        Arc::new(FixedCode("531246")),
        OtpPolicy::default(),
    );

    let job = jobs
        .create(
            NewJob {
                title: "Clinical Officer II".to_string(),
                description: Some("County referral hospital".to_string()),
                department_id: 1,
                designation_id: 4,
                requirements: None,
                application_deadline: Some(march(31)),
                is_active: true,
            },
            "admin-1",
        )
        .await
        .expect("job posted");

    let personal = ProfileSubmission {
        details: ApplicantPatch {
            first_name: Some("Achieng".to_string()),
            surname: Some("Odhiambo".to_string()),
            phone_number: Some("0722333444".to_string()),
            national_id: Some("31234567".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 7, 2),
            gender: Some("female".to_string()),
            ..ApplicantPatch::default()
        },
        ..ProfileSubmission::default()
    };
    let first = profiles.create(USER, personal).await.expect("profile created");

    let address = ProfileSubmission {
        details: ApplicantPatch {
            county_id: Some(county),
            constituency_id: Some(constituency),
            ward_id: Some(ward),
            address: Some("P.O. Box 120, Kisumu".to_string()),
            ..ApplicantPatch::default()
        },
        referees: Some(vec![NewReferee {
            name: "Mr. Ouma".to_string(),
            position: Some("Nursing Officer".to_string()),
            organization: Some("JOOTRH".to_string()),
            email: None,
            phone_number: Some("0733000111".to_string()),
            relationship: Some("Supervisor".to_string()),
        }]),
        ..ProfileSubmission::default()
    };
    let second = profiles.update(USER, address).await.expect("profile updated");
    assert!(
        second.applicant.profile_completion_percentage
            > first.applicant.profile_completion_percentage
    );
    assert_eq!(second.referees.len(), 1);

    let err = profiles
        .verify_phone(USER, "0722333444")
        .await
        .expect_err("no otp yet");
    assert!(matches!(err, ProfileError::PhoneNotVerified));
    otp.issue("0722333444").await.expect("otp sent");
    assert!(otp.verify("0722333444", "531246").await.expect("verify"));
    let verified = profiles
        .verify_phone(USER, "0722333444")
        .await
        .expect("phone verified");
    assert!(verified.phone_verified);

    let applicant_id = verified.id;
    let err = workflow
        .apply(applicant_id, job.id, march(31).succ_opt().expect("april"))
        .await
        .expect_err("deadline passed");
    assert!(matches!(err, WorkflowError::JobClosed));

    let application = workflow
        .apply(applicant_id, job.id, march(10))
        .await
        .expect("applied");
    assert_eq!(application.status, ApplicationStatus::Submitted);

    workflow
        .shortlist(application.id, Role::Board, Some(march(20)), None)
        .await
        .expect("shortlisted");
    let interviewed = workflow
        .record_interview(
            application.id,
            Role::Board,
            InterviewScore::Breakdown(InterviewScorecard {
                technical_knowledge: 26,
                communication: 20,
                problem_solving: 19,
                leadership: 15,
            }),
            Some("Strong clinical answers".to_string()),
        )
        .await
        .expect("interviewed");
    assert_eq!(interviewed.interview_score, Some(80));

    let hired = workflow
        .hire(application.id, Role::Admin, Some("Offer accepted".to_string()))
        .await
        .expect("hired");
    assert_eq!(hired.status, ApplicationStatus::Hired);

    let err = workflow
        .reject(application.id, Role::Admin, "Changed our minds")
        .await
        .expect_err("hired is final");
    assert!(matches!(err, WorkflowError::Transition(_)));

    let hired_list = workflow
        .list(ApplicationFilter {
            job_id: Some(job.id),
            status: Some(ApplicationStatus::Hired),
        })
        .await
        .expect("listing");
    assert_eq!(hired_list.len(), 1);
}

#[tokio::test]
async fn address_must_nest_inside_the_chosen_county() {
    let store = Arc::new(MemoryStorage::with_catalog(development_catalog()));
    let (_, constituency, _) = import_locations(&store).await;
    let nairobi = store
        .counties()
        .await
        .expect("counties")
        .into_iter()
        .find(|county| county.name == "Nairobi")
        .expect("nairobi imported");

    let profiles = ProfileService::new(Arc::clone(&store));
    let submission = ProfileSubmission {
        details: ApplicantPatch {
            first_name: Some("Achieng".to_string()),
            county_id: Some(nairobi.id),
            constituency_id: Some(constituency),
            ..ApplicantPatch::default()
        },
        ..ProfileSubmission::default()
    };

    match profiles.create(USER, submission).await {
        Err(ProfileError::Validation(errors)) => {
            let json = serde_json::to_value(&errors).expect("serialize");
            assert_eq!(
                json["constituencyId"][0],
                "Constituency does not belong to the selected county"
            );
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}
