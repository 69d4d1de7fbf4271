use super::domain::{ApplicationId, ApplicationLink, ApplicationRecord, Job, JobId};
pub use crate::workflows::promotion::RepositoryError;

/// Job postings. `insert_job` assigns the id.
pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn job(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;
    fn jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    /// Replaces an existing posting; `NotFound` when the id is unknown.
    fn replace_job(&self, job: Job) -> Result<(), RepositoryError>;
    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError>;
}

/// Submitted applications. `insert_application` assigns the id.
pub trait ApplicationRepository: Send + Sync {
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn applications_for_job(&self, job_id: JobId)
        -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
}

pub trait LinkRepository: Send + Sync {
    fn insert_link(&self, link: ApplicationLink) -> Result<(), RepositoryError>;
    fn link(&self, token: &str) -> Result<Option<ApplicationLink>, RepositoryError>;
    fn links_for_job(&self, job_id: JobId) -> Result<Vec<ApplicationLink>, RepositoryError>;
    /// Stores the application and flips the link to used as one step, so a failed insert leaves
    /// the link usable. `Conflict` if another submission already won the link.
    fn redeem(
        &self,
        token: &str,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
}

/// Everything the recruitment service persists.
pub trait RecruitmentStore: JobRepository + ApplicationRepository + LinkRepository {}

impl<T> RecruitmentStore for T where T: JobRepository + ApplicationRepository + LinkRepository {}
