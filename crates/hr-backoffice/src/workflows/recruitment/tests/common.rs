use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::access::{Operation, Principal, Role, StaticTokenVerifier};
use crate::clock::FixedClock;
use crate::config::RecruitmentConfig;
use crate::workflows::promotion::{
    ApplicantName, Candidate, CandidateId, Experience, PromotionServiceError, RepositoryError,
    ScoreComponents, Sex,
};
use crate::workflows::recruitment::domain::{
    ApplicantDetails, ApplicationId, ApplicationLink, ApplicationRecord, ApplicationSubmission,
    Job, JobDraft, JobId, JobType, ResumeDescriptor,
};
use crate::workflows::recruitment::repository::{
    ApplicationRepository, JobRepository, LinkRepository,
};
use crate::workflows::recruitment::service::ApplicantMatcher;
use crate::workflows::recruitment::{recruitment_router, RecruitmentService};

pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const MANAGER_TOKEN: &str = "manager-token";
pub(super) const BASE_URL: &str = "https://careers.example.com";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub(super) fn admin() -> Principal {
    Principal::new("hr-admin", Role::Admin)
}

pub(super) fn manager() -> Principal {
    Principal::new("line-manager", Role::Manager)
}

pub(super) fn job_draft(job_type: JobType) -> JobDraft {
    JobDraft {
        title: "Branch Operations Manager".to_string(),
        description: "Oversees daily branch operations".to_string(),
        qualifications: Some("BA in Accounting".to_string()),
        department: "Retail Banking".to_string(),
        location: Some("Addis Ababa".to_string()),
        job_type,
        ..JobDraft::default()
    }
}

pub(super) fn internal_submission(
    job_id: JobId,
    first: &str,
    last: &str,
) -> ApplicationSubmission {
    ApplicationSubmission {
        first_name: first.to_string(),
        last_name: last.to_string(),
        job_id,
        resume: Some(ResumeDescriptor {
            file_name: "cv.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            size_bytes: 120_000,
        }),
        applicant: ApplicantDetails::Internal {
            other_bank_experience: Some("3 years at another bank".to_string()),
            file_number: None,
        },
    }
}

pub(super) fn external_submission(job_id: JobId) -> ApplicationSubmission {
    ApplicationSubmission {
        first_name: "Lensa".to_string(),
        last_name: "Gudeta".to_string(),
        job_id,
        resume: None,
        applicant: ApplicantDetails::External {
            email: "lensa@example.com".to_string(),
            phone: "+251911000000".to_string(),
            other_job_experience: Some("Microfinance officer".to_string()),
            other_job_years: 4,
        },
    }
}

pub(super) fn candidate(id: u64, full_name: &str) -> Candidate {
    Candidate {
        id: CandidateId(id),
        file_number: format!("F-{id}"),
        full_name: full_name.to_string(),
        sex: Sex::Female,
        branch: "Bole".to_string(),
        district: "Addis Ababa East".to_string(),
        job_grade: "VII".to_string(),
        job_category: "Clerical".to_string(),
        department: None,
        region: None,
        current_position: None,
        employment_date: NaiveDate::from_ymd_opt(2014, 6, 1).expect("valid date"),
        last_promotion_date: None,
        experience: Experience {
            total_years: 10,
            related_years: None,
        },
        scores: ScoreComponents {
            tenure: Some(20.0),
            post_promotion: Some(0.0),
            total: 20.0,
            ..ScoreComponents::default()
        },
    }
}

pub(super) type TestService = RecruitmentService<MemoryRecruitment, StubMatcher>;

pub(super) fn build_service(
    matcher: StubMatcher,
) -> (TestService, Arc<MemoryRecruitment>, Arc<StubMatcher>) {
    build_service_with_ttl(matcher, 7)
}

pub(super) fn build_service_with_ttl(
    matcher: StubMatcher,
    link_ttl_days: i64,
) -> (TestService, Arc<MemoryRecruitment>, Arc<StubMatcher>) {
    let store = Arc::new(MemoryRecruitment::default());
    let matcher = Arc::new(matcher);
    let service = RecruitmentService::new(
        store.clone(),
        matcher.clone(),
        Arc::new(FixedClock::on(today())),
        RecruitmentConfig {
            link_ttl_days,
            public_base_url: BASE_URL.to_string(),
        },
    );
    (service, store, matcher)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    let verifier = StaticTokenVerifier::default()
        .with_grant(ADMIN_TOKEN, admin())
        .with_grant(MANAGER_TOKEN, manager());
    recruitment_router(Arc::new(service), Arc::new(verifier))
}

/// Matcher that answers from a fixed table of known names.
#[derive(Default)]
pub(super) struct StubMatcher {
    known: Vec<Candidate>,
    offline: bool,
    calls: Mutex<Vec<ApplicantName>>,
}

impl StubMatcher {
    pub(super) fn knowing(candidates: Vec<Candidate>) -> Self {
        Self {
            known: candidates,
            ..Self::default()
        }
    }

    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<ApplicantName> {
        self.calls.lock().expect("matcher mutex poisoned").clone()
    }
}

impl ApplicantMatcher for StubMatcher {
    fn match_applicant(
        &self,
        applicant: &ApplicantName,
    ) -> Result<Candidate, PromotionServiceError> {
        self.calls
            .lock()
            .expect("matcher mutex poisoned")
            .push(applicant.clone());
        let operation = Operation::MatchApplication;
        if self.offline {
            return Err(PromotionServiceError::StorageUnavailable {
                operation,
                reason: "database offline".to_string(),
            });
        }
        let full_name = applicant.full_name();
        self.known
            .iter()
            .find(|candidate| candidate.full_name == full_name)
            .cloned()
            .ok_or(PromotionServiceError::NoMatch {
                operation,
                full_name,
            })
    }
}

#[derive(Default)]
struct Tables {
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    links: HashMap<String, ApplicationLink>,
}

#[derive(Default)]
pub(super) struct MemoryRecruitment {
    tables: Mutex<Tables>,
    applications_offline: AtomicBool,
}

impl MemoryRecruitment {
    /// While set, every application write fails as if the table were unreachable.
    pub(super) fn take_applications_offline(&self, offline: bool) {
        self.applications_offline.store(offline, Ordering::SeqCst);
    }

    fn store_application(
        &self,
        tables: &mut Tables,
        mut record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        if self.applications_offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "applications table offline".to_string(),
            ));
        }
        let next = tables
            .applications
            .keys()
            .next_back()
            .map_or(1, |id| id.0 + 1);
        record.id = ApplicationId(next);
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    pub(super) fn stored_application(&self, id: ApplicationId) -> ApplicationRecord {
        self.tables
            .lock()
            .expect("repository mutex poisoned")
            .applications
            .get(&id)
            .cloned()
            .expect("application stored")
    }

    pub(super) fn application_count(&self) -> usize {
        self.tables
            .lock()
            .expect("repository mutex poisoned")
            .applications
            .len()
    }

    pub(super) fn expire_links(&self, by_days: i64) {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        for link in tables.links.values_mut() {
            link.expires_at -= chrono::Duration::days(by_days);
        }
    }
}

impl JobRepository for MemoryRecruitment {
    fn insert_job(&self, mut job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let next = tables.jobs.keys().next_back().map_or(1, |id| id.0 + 1);
        job.id = JobId(next);
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.jobs.get(&id).cloned())
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.jobs.values().cloned().collect())
    }

    fn replace_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        match tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        tables
            .jobs
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl ApplicationRepository for MemoryRecruitment {
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        self.store_application(&mut tables, record)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.applications.get(&id).cloned())
    }

    fn applications_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables
            .applications
            .values()
            .filter(|record| record.job_id == job_id)
            .cloned()
            .collect())
    }

    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        tables.applications.insert(record.id, record);
        Ok(())
    }
}

impl LinkRepository for MemoryRecruitment {
    fn insert_link(&self, link: ApplicationLink) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        if tables.links.contains_key(&link.token) {
            return Err(RepositoryError::Conflict);
        }
        tables.links.insert(link.token.clone(), link);
        Ok(())
    }

    fn link(&self, token: &str) -> Result<Option<ApplicationLink>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.links.get(token).cloned())
    }

    fn links_for_job(&self, job_id: JobId) -> Result<Vec<ApplicationLink>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        let mut links: Vec<ApplicationLink> = tables
            .links
            .values()
            .filter(|link| link.job_id == job_id)
            .cloned()
            .collect();
        links.sort_by_key(|link| (link.created_at, link.kind.label()));
        Ok(links)
    }

    fn redeem(
        &self,
        token: &str,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        match tables.links.get(token) {
            None => return Err(RepositoryError::NotFound),
            Some(link) if link.used => return Err(RepositoryError::Conflict),
            Some(_) => {}
        }
        let stored = self.store_application(&mut tables, record)?;
        if let Some(link) = tables.links.get_mut(token) {
            link.used = true;
        }
        Ok(stored)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
