use super::domain::{Candidate, CandidateId, CandidateProfile, ComponentWrite};

/// Score store boundary. Implementations back it with a relational table or memory.
pub trait CandidateRepository: Send + Sync {
    fn get(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError>;

    /// Every candidate in storage order (ascending id).
    fn all(&self) -> Result<Vec<Candidate>, RepositoryError>;

    /// Candidates whose full name equals `full_name` exactly, in storage order.
    fn find_by_full_name(&self, full_name: &str) -> Result<Vec<Candidate>, RepositoryError>;

    /// Stores a new candidate and returns it with its assigned id. A duplicate file number is a
    /// `Conflict`.
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;

    /// Writes one component and recomputes the total in a single atomic step, the in-process
    /// equivalent of `UPDATE .. SET col = $1, total = COALESCE(..) + ..`. Returns the updated row.
    fn apply_component(
        &self,
        id: CandidateId,
        write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError>;

    /// Replaces the administrative fields and applies `write` in the same atomic step. A file
    /// number held by another candidate is a `Conflict`.
    fn update_profile(
        &self,
        id: CandidateId,
        profile: CandidateProfile,
        write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
