use crate::infra::{InMemoryCandidateRepository, InMemoryRecruitmentStore};
use chrono::{Months, NaiveDate};
use clap::Args;
use hr_backoffice::access::{Principal, Role};
use hr_backoffice::clock::{Clock, FixedClock, SystemClock};
use hr_backoffice::config::RecruitmentConfig;
use hr_backoffice::error::AppError;
use hr_backoffice::workflows::promotion::{
    CandidateDraft, CandidateId, EvaluationBreakdown, PromotionService,
};
use hr_backoffice::workflows::recruitment::{
    ApplicantDetails, ApplicantKind, ApplicationSubmission, JobDraft, JobType, MatchOutcome,
    RecruitmentService, ResumeDescriptor,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the ranked evaluations as CSV as well.
    #[arg(long)]
    pub(crate) csv: bool,
    /// Skip the recruitment portion of the demo.
    #[arg(long)]
    pub(crate) skip_recruitment: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        csv,
        skip_recruitment,
    } = args;

    let today = today.unwrap_or_else(|| SystemClock.today());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(today));
    let admin = Principal::new("demo-admin", Role::Admin);
    let manager = Principal::new("demo-manager", Role::Manager);
    let bole = Principal::new(
        "demo-dm-bole",
        Role::DistrictManager {
            branch: "Bole".to_string(),
        },
    );

    let candidates = Arc::new(InMemoryCandidateRepository::default());
    let promotion = Arc::new(PromotionService::new(candidates, clock.clone()));

    println!("Promotion evaluation demo (as of {today})");
    let hana = promotion.create_candidate(
        &admin,
        demo_draft("F-1001", "Hana Tesfaye", "Bole", years_before(today, 10), None),
    )?;
    let abel = promotion.create_candidate(
        &admin,
        demo_draft(
            "F-1002",
            "Abel Kebede",
            "Adama",
            years_before(today, 6),
            Some(years_before(today, 2)),
        ),
    )?;
    let jane = promotion.create_candidate(
        &admin,
        demo_draft("F-1003", "Jane Doe", "Bole", years_before(today, 8), None),
    )?;
    for candidate in [&hana, &abel, &jane] {
        println!(
            "- Registered {} ({}, {}): {} years of service -> tenure {:.2}, post-promotion {:.2}",
            candidate.full_name,
            candidate.file_number,
            candidate.branch,
            candidate.experience.total_years,
            candidate.scores.tenure.unwrap_or(0.0),
            candidate.scores.post_promotion.unwrap_or(0.0)
        );
    }

    let ratings: [(CandidateId, f64, f64); 3] =
        [(hana.id, 80.0, 50.0), (abel.id, 92.0, 70.0), (jane.id, 75.0, 60.0)];
    for (id, performance, recommendation) in ratings {
        promotion.set_performance_score(&manager, id, performance)?;
        promotion.set_manager_recommendation(&manager, id, recommendation)?;
    }
    promotion.set_district_recommendation(&bole, hana.id, 60.0)?;
    promotion.set_district_recommendation(&bole, jane.id, 40.0)?;

    match promotion.set_district_recommendation(&bole, abel.id, 90.0) {
        Ok(_) => println!("  Unexpected: Bole district manager scored an Adama candidate"),
        Err(err) => println!("  Refused cross-branch recommendation: {err}"),
    }

    println!("\nRanking");
    for (position, entry) in promotion.rank_candidates(&admin)?.iter().enumerate() {
        render_breakdown(position + 1, entry);
    }

    if csv {
        println!("\nCSV export");
        print!("{}", promotion.export_evaluations(&admin)?);
    }

    if skip_recruitment {
        return Ok(());
    }

    println!("\nRecruitment demo");
    let recruitment = RecruitmentService::new(
        Arc::new(InMemoryRecruitmentStore::default()),
        promotion.clone(),
        clock,
        RecruitmentConfig::default(),
    );
    let job = recruitment.create_job(
        &admin,
        JobDraft {
            title: "Customer Service Manager".to_string(),
            description: "Leads the branch customer service desk".to_string(),
            qualifications: Some("BA in Management or related field".to_string()),
            department: "Retail Banking".to_string(),
            location: Some("Addis Ababa".to_string()),
            job_type: JobType::Both,
            ..JobDraft::default()
        },
    )?;
    println!("- Posted job {} \"{}\" ({})", job.id, job.title, job.status.label());

    let links = recruitment.generate_links(&admin, job.id)?;
    for link in &links {
        println!(
            "  {} link: {} (expires {})",
            link.kind.label(),
            link.url,
            link.expires_at
        );
    }

    let Some(internal) = links.iter().find(|link| link.kind == ApplicantKind::Internal) else {
        println!("  No internal link was generated");
        return Ok(());
    };
    let token = internal.url.rsplit('/').next().unwrap_or_default();
    let receipt = recruitment.submit_via_link(
        token,
        ApplicationSubmission {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            job_id: job.id,
            resume: Some(ResumeDescriptor {
                file_name: "jane-doe-cv.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                size_bytes: 180_000,
            }),
            applicant: ApplicantDetails::Internal {
                other_bank_experience: None,
                file_number: Some(jane.file_number.clone()),
            },
        },
    )?;
    println!(
        "- Application {} received from {} {} (resume stored as {})",
        receipt.application.id,
        receipt.application.first_name,
        receipt.application.last_name,
        receipt.application.resume.as_deref().unwrap_or("none")
    );
    match &receipt.matching {
        MatchOutcome::Matched {
            candidate_id,
            total,
        } => println!(
            "  Matched candidate {candidate_id}; evaluation restarted with total {total:.2}"
        ),
        MatchOutcome::NoMatch => println!("  No candidate matched the applicant"),
        MatchOutcome::Failed { reason } => println!("  Matching failed: {reason}"),
        MatchOutcome::NotAttempted => println!("  Matching not attempted"),
    }

    match recruitment.submit_via_link(
        token,
        ApplicationSubmission {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            job_id: job.id,
            resume: None,
            applicant: ApplicantDetails::Internal {
                other_bank_experience: None,
                file_number: None,
            },
        },
    ) {
        Ok(_) => println!("  Unexpected: link accepted a second submission"),
        Err(err) => println!("  Second submission refused: {err}"),
    }

    let evaluation = promotion.get_evaluation(&admin, jane.id)?;
    println!("\nJane Doe after the match");
    render_breakdown(1, &evaluation);

    Ok(())
}

fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(years * 12))
        .unwrap_or(today)
}

fn demo_draft(
    file_number: &str,
    full_name: &str,
    branch: &str,
    employed: NaiveDate,
    last_promoted: Option<NaiveDate>,
) -> CandidateDraft {
    CandidateDraft {
        file_number: file_number.to_string(),
        full_name: full_name.to_string(),
        sex: "Female".to_string(),
        branch: branch.to_string(),
        district: "Addis Ababa East".to_string(),
        job_grade: "VII".to_string(),
        job_category: "Clerical".to_string(),
        department: Some("Operations".to_string()),
        current_position: Some("Senior Teller".to_string()),
        employment_date: Some(employed),
        last_promotion_date: last_promoted,
        ..CandidateDraft::default()
    }
}

fn render_breakdown(position: usize, entry: &EvaluationBreakdown) {
    println!(
        "{position}. {} ({}) total {:.2}",
        entry.full_name, entry.branch, entry.total
    );
    println!(
        "   performance {:.2} | tenure {:.2} | post-promotion {:.2} | manager {:.2} \
         | district {:.2}",
        entry.performance_contribution,
        entry.tenure_contribution,
        entry.post_promotion_contribution,
        entry.manager_contribution,
        entry.district_contribution
    );
}
