//! Job postings, internal/external application intake, and single-use application links.
//! Internal applications are handed to the promotion workflow for candidate matching.

pub mod domain;
pub mod jobs;
pub mod links;
pub mod repository;
pub mod resume;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicantKind, ApplicationId, ApplicationLink, ApplicationReceipt,
    ApplicationRecord, ApplicationSubmission, Job, JobApplicants, JobDraft, JobId, JobStatus,
    JobType, LinkView, MatchOutcome, PromotionStatus, ResumeDescriptor,
};
pub use jobs::JobValidationError;
pub use links::LinkError;
pub use repository::{ApplicationRepository, JobRepository, LinkRepository, RecruitmentStore};
pub use resume::{ResumeError, MAX_RESUME_BYTES};
pub use router::{recruitment_router, RecruitmentApi};
pub use service::{ApplicantMatcher, RecruitmentService, RecruitmentServiceError};
