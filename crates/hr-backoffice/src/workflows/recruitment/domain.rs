use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::promotion::CandidateId;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub const UNASSIGNED: Self = JobId(0);
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audience a posting is advertised to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Internal,
    External,
    #[default]
    Both,
}

impl JobType {
    pub fn accepts(self, kind: ApplicantKind) -> bool {
        match self {
            JobType::Both => true,
            JobType::Internal => kind == ApplicantKind::Internal,
            JobType::External => kind == ApplicantKind::External,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
    Filled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Filled => "filled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub qualifications: Option<String>,
    pub department: String,
    pub location: Option<String>,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_on: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub status: JobStatus,
}

/// Fields an admin supplies when creating or replacing a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub qualifications: Option<String>,
    pub department: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl ApplicationId {
    pub const UNASSIGNED: Self = ApplicationId(0);
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantKind {
    Internal,
    External,
}

impl ApplicantKind {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicantKind::Internal => "internal",
            ApplicantKind::External => "external",
        }
    }
}

/// Applicant-specific details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplicantDetails {
    Internal {
        #[serde(default)]
        other_bank_experience: Option<String>,
        /// Lets the matcher tell apart employees sharing a full name.
        #[serde(default)]
        file_number: Option<String>,
    },
    External {
        email: String,
        phone: String,
        #[serde(default)]
        other_job_experience: Option<String>,
        #[serde(default)]
        other_job_years: u32,
    },
}

impl ApplicantDetails {
    pub fn kind(&self) -> ApplicantKind {
        match self {
            ApplicantDetails::Internal { .. } => ApplicantKind::Internal,
            ApplicantDetails::External { .. } => ApplicantKind::External,
        }
    }
}

/// Metadata for an uploaded resume. The bytes live with the file-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeDescriptor {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub first_name: String,
    pub last_name: String,
    /// Ignored when submitting through an application link.
    #[serde(default)]
    pub job_id: JobId,
    #[serde(default)]
    pub resume: Option<ResumeDescriptor>,
    pub applicant: ApplicantDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PromotionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Approved => "approved",
            PromotionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub first_name: String,
    pub last_name: String,
    pub applicant: ApplicantDetails,
    /// Safe stored file name of the resume, when one was uploaded.
    pub resume: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub matched_candidate: Option<CandidateId>,
    pub promotion_status: Option<PromotionStatus>,
}

/// What happened when an internal application was matched against the candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched {
        candidate_id: CandidateId,
        total: f64,
    },
    NoMatch,
    Failed {
        reason: String,
    },
    NotAttempted,
}

/// Returned to the submitter: the stored application plus the matching result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReceipt {
    pub application: ApplicationRecord,
    pub matching: MatchOutcome,
}

/// Applications received for one posting, split by applicant kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplicants {
    pub internal: Vec<ApplicationRecord>,
    pub external: Vec<ApplicationRecord>,
}

/// Single-use application link for one posting and applicant kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLink {
    pub token: String,
    pub job_id: JobId,
    pub kind: ApplicantKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Link as handed to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkView {
    pub job_id: JobId,
    pub job_title: String,
    pub kind: ApplicantKind,
    pub url: String,
    /// RFC 3339 timestamp.
    pub expires_at: String,
}
