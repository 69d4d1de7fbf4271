use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{info, warn};

use super::domain::{
    ApplicantDetails, ApplicantKind, ApplicationId, ApplicationLink, ApplicationReceipt,
    ApplicationRecord, ApplicationSubmission, Job, JobApplicants, JobDraft, JobId, JobStatus,
    JobType, LinkView, MatchOutcome, PromotionStatus,
};
use super::jobs::{self, JobValidationError};
use super::links::{self, LinkError};
use super::repository::{RecruitmentStore, RepositoryError};
use super::resume::{self, ResumeError};
use crate::access::{AccessPolicy, AuthorizationError, Operation, Principal};
use crate::clock::Clock;
use crate::config::RecruitmentConfig;
use crate::workflows::promotion::{
    ApplicantName, Candidate, CandidateRepository, PromotionService, PromotionServiceError,
};

/// Hands internal applications to the promotion side for matching.
pub trait ApplicantMatcher: Send + Sync {
    fn match_applicant(&self, applicant: &ApplicantName)
        -> Result<Candidate, PromotionServiceError>;
}

impl<C> ApplicantMatcher for PromotionService<C>
where
    C: CandidateRepository + 'static,
{
    fn match_applicant(
        &self,
        applicant: &ApplicantName,
    ) -> Result<Candidate, PromotionServiceError> {
        PromotionService::match_applicant(self, applicant)
    }
}

/// Job postings, application intake, and application links.
pub struct RecruitmentService<R, M> {
    store: Arc<R>,
    matcher: Arc<M>,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
    config: RecruitmentConfig,
}

impl<R, M> RecruitmentService<R, M>
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    pub fn new(
        store: Arc<R>,
        matcher: Arc<M>,
        clock: Arc<dyn Clock>,
        config: RecruitmentConfig,
    ) -> Self {
        Self {
            store,
            matcher,
            policy: AccessPolicy,
            clock,
            config,
        }
    }

    pub fn create_job(
        &self,
        principal: &Principal,
        draft: JobDraft,
    ) -> Result<Job, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        let job = jobs::from_draft(JobId::UNASSIGNED, draft, self.clock.today())?;
        let stored = self.store.insert_job(job)?;
        info!(job_id = %stored.id, title = %stored.title, "job posted");
        Ok(stored)
    }

    /// Public lookup used by the application pages.
    pub fn get_job(&self, id: JobId) -> Result<Job, RecruitmentServiceError> {
        self.store
            .job(id)?
            .ok_or(RecruitmentServiceError::JobNotFound(id))
    }

    pub fn list_jobs(&self, principal: &Principal) -> Result<Vec<Job>, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        Ok(self.store.jobs()?)
    }

    pub fn jobs_by_type(
        &self,
        principal: &Principal,
        job_type: JobType,
    ) -> Result<Vec<Job>, RecruitmentServiceError> {
        let mut jobs = self.list_jobs(principal)?;
        jobs.retain(|job| job.job_type == job_type);
        Ok(jobs)
    }

    /// Open postings, optionally narrowed to those advertised to one applicant kind.
    pub fn open_jobs(
        &self,
        audience: Option<ApplicantKind>,
    ) -> Result<Vec<Job>, RecruitmentServiceError> {
        let mut jobs = self.store.jobs()?;
        jobs.retain(|job| {
            job.status == JobStatus::Open
                && audience.map_or(true, |kind| job.job_type.accepts(kind))
        });
        Ok(jobs)
    }

    /// Replaces a posting's fields. The id and posting date are preserved, and the status is kept
    /// unless the draft names one.
    pub fn update_job(
        &self,
        principal: &Principal,
        id: JobId,
        draft: JobDraft,
    ) -> Result<Job, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        let existing = self.get_job(id)?;
        let status = draft.status.unwrap_or(existing.status);
        let mut job = jobs::from_draft(id, draft, existing.created_on)?;
        job.status = status;
        self.store.replace_job(job.clone())?;
        info!(job_id = %id, "job updated");
        Ok(job)
    }

    pub fn set_job_status(
        &self,
        principal: &Principal,
        id: JobId,
        status: JobStatus,
    ) -> Result<Job, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        let mut job = self.get_job(id)?;
        let previous = job.status;
        job.status = status;
        self.store.replace_job(job.clone())?;
        info!(
            job_id = %id,
            from = previous.label(),
            to = status.label(),
            "job status changed"
        );
        Ok(job)
    }

    pub fn delete_job(
        &self,
        principal: &Principal,
        id: JobId,
    ) -> Result<(), RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        self.get_job(id)?;
        self.store.delete_job(id)?;
        info!(job_id = %id, "job deleted");
        Ok(())
    }

    pub fn applications_for_job(
        &self,
        principal: &Principal,
        id: JobId,
    ) -> Result<JobApplicants, RecruitmentServiceError> {
        self.authorize(principal, Operation::ReviewApplications)?;
        self.get_job(id)?;
        let (internal, external): (Vec<_>, Vec<_>) = self
            .store
            .applications_for_job(id)?
            .into_iter()
            .partition(|record| record.applicant.kind() == ApplicantKind::Internal);
        Ok(JobApplicants { internal, external })
    }

    /// Stores an application and, for internal applicants, runs candidate matching. A failed
    /// match is reported on the receipt and never fails the submission.
    pub fn submit_application(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationReceipt, RecruitmentServiceError> {
        let resume = self.check_submission(&submission)?;
        self.record(submission, resume, None)
    }

    pub fn review_application(
        &self,
        principal: &Principal,
        id: ApplicationId,
        decision: PromotionStatus,
    ) -> Result<ApplicationRecord, RecruitmentServiceError> {
        self.authorize(principal, Operation::ReviewApplications)?;
        if decision == PromotionStatus::Pending {
            return Err(RecruitmentServiceError::InvalidDecision);
        }
        let mut record = self
            .store
            .application(id)?
            .ok_or(RecruitmentServiceError::ApplicationNotFound(id))?;
        if record.matched_candidate.is_none() {
            return Err(RecruitmentServiceError::NotUnderReview(id));
        }

        record.promotion_status = Some(decision);
        self.store.update_application(record.clone())?;
        info!(
            application_id = %id,
            decision = decision.label(),
            subject = %principal.subject.0,
            "promotion decision recorded"
        );
        Ok(record)
    }

    /// Mints one internal and one external link for the posting.
    pub fn generate_links(
        &self,
        principal: &Principal,
        job_id: JobId,
    ) -> Result<Vec<LinkView>, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        let job = self.get_job(job_id)?;
        let now = self.clock.now();

        let mut views = Vec::with_capacity(2);
        for kind in [ApplicantKind::Internal, ApplicantKind::External] {
            let link = links::mint(job_id, kind, now, self.config.link_ttl_days)?;
            self.store.insert_link(link.clone())?;
            views.push(links::view(&self.config.public_base_url, &link, &job));
        }
        info!(
            job_id = %job_id,
            ttl_days = self.config.link_ttl_days,
            "application links generated"
        );
        Ok(views)
    }

    pub fn links_for_job(
        &self,
        principal: &Principal,
        job_id: JobId,
    ) -> Result<Vec<LinkView>, RecruitmentServiceError> {
        self.authorize(principal, Operation::ManageJobs)?;
        let job = self.get_job(job_id)?;
        Ok(self
            .store
            .links_for_job(job_id)?
            .iter()
            .map(|link| links::view(&self.config.public_base_url, link, &job))
            .collect())
    }

    pub fn validate_link(&self, token: &str) -> Result<LinkView, RecruitmentServiceError> {
        let link = self.usable_link(token)?;
        let job = self.get_job(link.job_id)?;
        Ok(links::view(&self.config.public_base_url, &link, &job))
    }

    /// Submits through a link: the link decides the job, and is consumed only once the
    /// submission itself has passed validation and the application is stored.
    pub fn submit_via_link(
        &self,
        token: &str,
        mut submission: ApplicationSubmission,
    ) -> Result<ApplicationReceipt, RecruitmentServiceError> {
        let link = self.usable_link(token)?;
        let kind = submission.applicant.kind();
        if kind != link.kind {
            return Err(LinkError::KindMismatch {
                expected: link.kind.label(),
                actual: kind.label(),
            }
            .into());
        }
        submission.job_id = link.job_id;
        let resume = self.check_submission(&submission)?;

        self.record(submission, resume, Some(token))
    }

    fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<(), RecruitmentServiceError> {
        self.policy
            .require(principal, operation, None)
            .map_err(|err| {
                warn!(
                    subject = %principal.subject.0,
                    role = principal.role.label(),
                    operation = %operation,
                    "operation denied"
                );
                RecruitmentServiceError::Authorization(err)
            })
    }

    fn usable_link(&self, token: &str) -> Result<ApplicationLink, RecruitmentServiceError> {
        let link = self.store.link(token)?.ok_or(LinkError::Invalid)?;
        links::check(&link, self.clock.now())?;
        Ok(link)
    }

    /// Validates names, resume, and the target posting. Returns the safe resume file name.
    fn check_submission(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<Option<String>, RecruitmentServiceError> {
        if submission.first_name.trim().is_empty() {
            return Err(RecruitmentServiceError::MissingField("first_name"));
        }
        if submission.last_name.trim().is_empty() {
            return Err(RecruitmentServiceError::MissingField("last_name"));
        }
        if let ApplicantDetails::External { email, phone, .. } = &submission.applicant {
            if email.trim().is_empty() {
                return Err(RecruitmentServiceError::MissingField("email"));
            }
            if phone.trim().is_empty() {
                return Err(RecruitmentServiceError::MissingField("phone"));
            }
        }

        let job = self.get_job(submission.job_id)?;
        if job.status != JobStatus::Open {
            return Err(RecruitmentServiceError::JobNotOpen {
                job: job.id,
                status: job.status.label(),
            });
        }
        if let Some(deadline) = job.deadline {
            if self.clock.today() > deadline {
                return Err(RecruitmentServiceError::JobNotOpen {
                    job: job.id,
                    status: "past its deadline",
                });
            }
        }
        let kind = submission.applicant.kind();
        if !job.job_type.accepts(kind) {
            return Err(RecruitmentServiceError::WrongAudience {
                job: job.id,
                kind: kind.label(),
            });
        }

        match &submission.resume {
            Some(descriptor) => {
                resume::validate(descriptor)?;
                Ok(Some(resume::safe_file_name(
                    &submission.first_name,
                    &submission.last_name,
                )))
            }
            None => Ok(None),
        }
    }

    fn record(
        &self,
        submission: ApplicationSubmission,
        resume: Option<String>,
        link_token: Option<&str>,
    ) -> Result<ApplicationReceipt, RecruitmentServiceError> {
        let record = ApplicationRecord {
            id: ApplicationId::UNASSIGNED,
            job_id: submission.job_id,
            first_name: submission.first_name.trim().to_string(),
            last_name: submission.last_name.trim().to_string(),
            applicant: submission.applicant,
            resume,
            submitted_at: self.clock.now(),
            matched_candidate: None,
            promotion_status: None,
        };
        let mut stored = match link_token {
            None => self.store.insert_application(record)?,
            Some(token) => match self.store.redeem(token, record) {
                Ok(stored) => {
                    info!(
                        job_id = %stored.job_id,
                        kind = stored.applicant.kind().label(),
                        "application link consumed"
                    );
                    stored
                }
                Err(RepositoryError::Conflict) => return Err(LinkError::AlreadyUsed.into()),
                Err(RepositoryError::NotFound) => return Err(LinkError::Invalid.into()),
                Err(other) => return Err(other.into()),
            },
        };
        info!(
            application_id = %stored.id,
            job_id = %stored.job_id,
            kind = stored.applicant.kind().label(),
            "application received"
        );

        let matching = match &stored.applicant {
            ApplicantDetails::Internal { file_number, .. } => {
                let applicant = ApplicantName {
                    first_name: stored.first_name.clone(),
                    last_name: stored.last_name.clone(),
                    file_number: file_number.clone(),
                };
                self.attach_candidate(&mut stored, &applicant)
            }
            ApplicantDetails::External { .. } => MatchOutcome::NotAttempted,
        };

        Ok(ApplicationReceipt {
            application: stored,
            matching,
        })
    }

    fn attach_candidate(
        &self,
        record: &mut ApplicationRecord,
        applicant: &ApplicantName,
    ) -> MatchOutcome {
        let candidate = match self.matcher.match_applicant(applicant) {
            Ok(candidate) => candidate,
            Err(PromotionServiceError::NoMatch { .. }) => return MatchOutcome::NoMatch,
            Err(err) => {
                warn!(application_id = %record.id, error = %err, "candidate matching failed");
                return MatchOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        record.matched_candidate = Some(candidate.id);
        record.promotion_status = Some(PromotionStatus::Pending);
        if let Err(err) = self.store.update_application(record.clone()) {
            warn!(
                application_id = %record.id,
                candidate_id = %candidate.id,
                error = %err,
                "matched candidate could not be saved on the application"
            );
            record.matched_candidate = None;
            record.promotion_status = None;
            return MatchOutcome::Failed {
                reason: err.to_string(),
            };
        }

        MatchOutcome::Matched {
            candidate_id: candidate.id,
            total: candidate.scores.total,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecruitmentServiceError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Job(#[from] JobValidationError),
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("job {job} is {status} and not accepting applications")]
    JobNotOpen { job: JobId, status: &'static str },
    #[error("job {job} is not advertised to {kind} applicants")]
    WrongAudience { job: JobId, kind: &'static str },
    #[error("promotion decision must be approved or rejected")]
    InvalidDecision,
    #[error("application {0} has no matched candidate to review")]
    NotUnderReview(ApplicationId),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RecruitmentServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecruitmentServiceError::Authorization(_) => StatusCode::FORBIDDEN,
            RecruitmentServiceError::Job(_)
            | RecruitmentServiceError::Resume(_)
            | RecruitmentServiceError::MissingField(_)
            | RecruitmentServiceError::JobNotOpen { .. }
            | RecruitmentServiceError::WrongAudience { .. }
            | RecruitmentServiceError::InvalidDecision
            | RecruitmentServiceError::NotUnderReview(_)
            | RecruitmentServiceError::Link(LinkError::KindMismatch { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RecruitmentServiceError::Link(LinkError::Invalid)
            | RecruitmentServiceError::JobNotFound(_)
            | RecruitmentServiceError::ApplicationNotFound(_)
            | RecruitmentServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            RecruitmentServiceError::Link(LinkError::Expired) => StatusCode::GONE,
            RecruitmentServiceError::Link(LinkError::AlreadyUsed)
            | RecruitmentServiceError::Repository(RepositoryError::Conflict) => {
                StatusCode::CONFLICT
            }
            RecruitmentServiceError::Link(LinkError::LifetimeOutOfRange(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RecruitmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}
