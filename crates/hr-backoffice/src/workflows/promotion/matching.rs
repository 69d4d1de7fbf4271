use std::sync::Arc;

use tracing::warn;

use super::domain::{ApplicantName, Candidate};
use super::repository::{CandidateRepository, RepositoryError};

/// Links an incoming application to an existing candidate by exact full name.
pub struct MatchingService<C> {
    candidates: Arc<C>,
}

impl<C> MatchingService<C>
where
    C: CandidateRepository + 'static,
{
    pub fn new(candidates: Arc<C>) -> Self {
        Self { candidates }
    }

    /// Looks up `first_name + " " + last_name` case-sensitively. A file number on the applicant
    /// narrows the hits; any remaining tie resolves to the lowest id.
    pub fn locate(&self, applicant: &ApplicantName) -> Result<Candidate, MatchError> {
        let full_name = applicant.full_name();
        let mut hits = self.candidates.find_by_full_name(&full_name)?;

        if let Some(file_number) = applicant
            .file_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            hits.retain(|candidate| candidate.file_number == file_number);
        }

        hits.sort_by_key(|candidate| candidate.id);
        if hits.len() > 1 {
            warn!(
                full_name = %full_name,
                matches = hits.len(),
                chosen = %hits[0].id,
                "ambiguous applicant name, taking lowest candidate id"
            );
        }

        hits.into_iter().next().ok_or(MatchError::NoMatch { full_name })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("no candidate named '{full_name}'")]
    NoMatch { full_name: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
