use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use psb_portal::error::AppError;
use psb_portal::jobs::JobService;
use psb_portal::notices::NoticeService;
use psb_portal::otp::{CodeGenerator, LogSmsGateway, OtpPolicy, OtpService};
use psb_portal::profile::{redirect_url, ProfileService, ProfileSubmission};
use psb_portal::schema::{
    Application, ApplicantPatch, NewEducationRecord, NewJob, NewNotice, NewReferee, NoticeType,
    Role,
};
use psb_portal::storage::{MemoryStorage, ReferenceStore};
use psb_portal::workflow::{ApplicationWorkflow, InterviewScore, InterviewScorecard};

use crate::infra::seeded_memory_storage;

const DEMO_USER: &str = "demo-applicant";
const DEMO_ADMIN: &str = "demo-admin";
const DEMO_PHONE: &str = "0712345678";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the application is submitted (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Reject the candidate after the interview instead of hiring.
    #[arg(long)]
    pub(crate) reject: bool,
    /// Stop once the application is submitted.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Fixed code so the demo can answer its own challenge.
struct DemoCode;

impl CodeGenerator for DemoCode {
    fn generate(&self) -> String {
        "123456".to_string()
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let store = Arc::new(seeded_memory_storage().await?);

    println!("PSB recruitment portal demo");

    let job = post_vacancy(&store, today).await?;
    let application = complete_application(&store, job, today).await?;
    if args.skip_review {
        return Ok(());
    }
    review(&store, application, today, args.reject).await
}

async fn post_vacancy(store: &Arc<MemoryStorage>, today: NaiveDate) -> Result<i32, AppError> {
    let jobs = JobService::new(Arc::clone(store));
    let notices = NoticeService::new(Arc::clone(store));
    let catalog = store.catalog().await?;

    let designation = catalog
        .designations
        .first()
        .map(|designation| designation.id)
        .unwrap_or_default();
    let department = catalog
        .departments
        .first()
        .map(|department| department.id)
        .unwrap_or_default();

    let job = jobs
        .create(
            NewJob {
                title: "Clinical Officer II".to_string(),
                description: Some("County referral hospital outpatient department".to_string()),
                department_id: department,
                designation_id: designation,
                requirements: Some(serde_json::json!({
                    "minimumAward": "Diploma",
                    "registration": "Clinical Officers Council",
                })),
                application_deadline: Some(today + Duration::days(21)),
                is_active: true,
            },
            DEMO_ADMIN,
        )
        .await?;
    let notice = notices
        .create(
            NewNotice {
                title: format!("Advertisement: {}", job.title),
                content: "Applications close in three weeks.".to_string(),
                notice_type: NoticeType::Announcement,
                is_published: true,
            },
            DEMO_ADMIN,
        )
        .await?;

    let listing = jobs.public_job(job.id).await?;
    println!("\nPosted vacancy #{}", job.id);
    println!(
        "- {} | {} | {}",
        listing.job.title, listing.department_name, listing.job_group
    );
    println!(
        "- deadline {} | notice \"{}\" published",
        job.application_deadline
            .map(|deadline| deadline.to_string())
            .unwrap_or_else(|| "none".to_string()),
        notice.title
    );
    Ok(job.id)
}

async fn complete_application(
    store: &Arc<MemoryStorage>,
    job_id: i32,
    today: NaiveDate,
) -> Result<Application, AppError> {
    let profiles = ProfileService::new(Arc::clone(store));
    let workflow = ApplicationWorkflow::new(Arc::clone(store));
    let otp = OtpService::with_codes(
        Arc::clone(store),
        Arc::new(LogSmsGateway),
        Arc::new(DemoCode),
        OtpPolicy::default(),
    );

    println!("\nApplicant profile wizard");
    println!(
        "- first login redirects to {}",
        redirect_url(Role::Applicant, None)
    );

    let catalog = store.catalog().await?;
    let county = store.counties().await?.into_iter().next();
    let constituency = match &county {
        Some(county) => store.constituencies(county.id).await?.into_iter().next(),
        None => None,
    };
    let ward = match &constituency {
        Some(constituency) => store.wards(constituency.id).await?.into_iter().next(),
        None => None,
    };

    let personal = ProfileSubmission {
        details: ApplicantPatch {
            salutation: Some("Ms".to_string()),
            first_name: Some("Wanjiku".to_string()),
            surname: Some("Kamau".to_string()),
            phone_number: Some(DEMO_PHONE.to_string()),
            national_id: Some("29876543".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1994, 6, 12),
            gender: Some("female".to_string()),
            nationality: Some("Kenyan".to_string()),
            ..ApplicantPatch::default()
        },
        ..ProfileSubmission::default()
    };
    let dossier = profiles.create(DEMO_USER, personal).await?;
    println!(
        "- step 1 saved, completion {}%",
        dossier.applicant.profile_completion_percentage
    );

    let background = ProfileSubmission {
        details: ApplicantPatch {
            county_id: county.as_ref().map(|county| county.id),
            constituency_id: constituency.as_ref().map(|constituency| constituency.id),
            ward_id: ward.as_ref().map(|ward| ward.id),
            address: Some("P.O. Box 4410-00100 Nairobi".to_string()),
            ..ApplicantPatch::default()
        },
        education_records: Some(vec![NewEducationRecord {
            institution_id: catalog
                .institutions
                .first()
                .map(|institution| institution.id)
                .unwrap_or_default(),
            course_id: catalog.courses.first().map(|course| course.id),
            award_id: catalog
                .awards
                .first()
                .map(|award| award.id)
                .unwrap_or_default(),
            year_completed: Some(2016),
            grade: Some("Credit".to_string()),
        }]),
        referees: Some(vec![NewReferee {
            name: "Dr. Achieng Otieno".to_string(),
            position: Some("Medical Superintendent".to_string()),
            organization: Some("Mbagathi Hospital".to_string()),
            email: Some("a.otieno@example.org".to_string()),
            phone_number: Some("0722000111".to_string()),
            relationship: Some("Supervisor".to_string()),
        }]),
        ..ProfileSubmission::default()
    };
    let dossier = profiles.update(DEMO_USER, background).await?;
    println!(
        "- address, education and referees saved, completion {}%",
        dossier.applicant.profile_completion_percentage
    );

    otp.issue(DEMO_PHONE).await?;
    let verified = otp.verify(DEMO_PHONE, &DemoCode.generate()).await?;
    let applicant = profiles.verify_phone(DEMO_USER, DEMO_PHONE).await?;
    println!(
        "- OTP verified: {verified} | phone verified on profile: {}",
        applicant.phone_verified
    );
    println!(
        "- next login redirects to {}",
        redirect_url(Role::Applicant, Some(&applicant))
    );

    let application = workflow.apply(applicant.id, job_id, today).await?;
    println!(
        "- application #{} {} on {}",
        application.id, application.status, today
    );
    Ok(application)
}

async fn review(
    store: &Arc<MemoryStorage>,
    application: Application,
    today: NaiveDate,
    reject: bool,
) -> Result<(), AppError> {
    let workflow = ApplicationWorkflow::new(Arc::clone(store));

    println!("\nBoard review");
    let shortlisted = workflow
        .shortlist(
            application.id,
            Role::Board,
            Some(today + Duration::days(28)),
            Some("Meets minimum requirements".to_string()),
        )
        .await?;
    println!(
        "- board: {} (interview on {})",
        shortlisted.status,
        shortlisted
            .interview_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "tbd".to_string())
    );

    let scorecard = InterviewScorecard {
        technical_knowledge: 24,
        communication: 21,
        problem_solving: 19,
        leadership: 14,
    };
    let interviewed = workflow
        .record_interview(
            application.id,
            Role::Board,
            InterviewScore::Breakdown(scorecard),
            Some("Confident with outpatient triage".to_string()),
        )
        .await?;
    println!(
        "- board: {} with score {}/100",
        interviewed.status,
        interviewed.interview_score.unwrap_or_default()
    );

    let decided = if reject {
        workflow
            .reject(application.id, Role::Admin, "Position filled by a higher-scoring candidate")
            .await?
    } else {
        workflow
            .hire(application.id, Role::Admin, Some("Offer accepted".to_string()))
            .await?
    };
    println!(
        "- admin: {} ({})",
        decided.status,
        decided.remarks.as_deref().unwrap_or("no remarks")
    );
    Ok(())
}
