use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Candidate, CandidateId, Experience};
use super::repository::{CandidateRepository, RepositoryError};

/// Tenure metric normalized against the candidate population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationField {
    TotalTenure,
    RelatedTenure,
}

impl PopulationField {
    fn read(self, experience: &Experience) -> Option<u32> {
        match self {
            PopulationField::TotalTenure => Some(experience.total_years),
            PopulationField::RelatedTenure => experience.related_years,
        }
    }
}

/// Normalization denominators observed at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationMaxima {
    pub total_tenure: u32,
    pub related_tenure: u32,
}

impl PopulationMaxima {
    /// Raises each maximum to at least the given candidate's own value, so the candidate being
    /// scored never lands above the component weight.
    pub fn including(self, experience: &Experience) -> Self {
        Self {
            total_tenure: self.total_tenure.max(experience.total_years),
            related_tenure: self
                .related_tenure
                .max(experience.related_years.unwrap_or(0)),
        }
    }
}

/// Largest stored value of `field`, 0 for an empty population.
pub fn population_max(candidates: &[Candidate], field: PopulationField) -> u32 {
    candidates
        .iter()
        .filter_map(|candidate| field.read(&candidate.experience))
        .max()
        .unwrap_or(0)
}

/// Reads population maxima from the score store. Never cached: each call rescans, so candidates
/// scored at different times are normalized against the pool as it stood then.
pub struct NormalizationService<C> {
    candidates: Arc<C>,
}

impl<C> NormalizationService<C>
where
    C: CandidateRepository + 'static,
{
    pub fn new(candidates: Arc<C>) -> Self {
        Self { candidates }
    }

    pub fn population_max(&self, field: PopulationField) -> Result<u32, RepositoryError> {
        let population = self.candidates.all()?;
        Ok(population_max(&population, field))
    }

    pub fn maxima(&self) -> Result<PopulationMaxima, RepositoryError> {
        let population = self.candidates.all()?;
        Ok(maxima_of(&population))
    }

    /// Maxima over everyone but `id`, whose stored experience is about to be replaced.
    pub fn maxima_excluding(&self, id: CandidateId) -> Result<PopulationMaxima, RepositoryError> {
        let mut population = self.candidates.all()?;
        population.retain(|candidate| candidate.id != id);
        Ok(maxima_of(&population))
    }
}

fn maxima_of(population: &[Candidate]) -> PopulationMaxima {
    PopulationMaxima {
        total_tenure: population_max(population, PopulationField::TotalTenure),
        related_tenure: population_max(population, PopulationField::RelatedTenure),
    }
}
