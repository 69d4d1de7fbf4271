mod rules;
mod weights;

pub use rules::{ValidationError, MAX_RAW_SCORE, MIN_RAW_SCORE};
pub(crate) use rules::{validate_draft, ValidatedDraft};
pub use weights::{scale_rating, Weights, PROMOTION_WEIGHTS};

use super::domain::{Candidate, ComponentWrite, Experience, ScoreComponents};
use super::normalization::PopulationMaxima;
use crate::access::AuthorizationError;
use rules::validate_raw_score;

/// Stateless scorer. Produces component writes; persisting them is the caller's job.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationEngine {
    weights: Weights,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationEngine {
    pub fn new() -> Self {
        Self {
            weights: PROMOTION_WEIGHTS,
        }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// `total_years / population_max * 20`, or 0 while the population maximum is 0.
    pub fn compute_tenure_contribution(
        &self,
        experience: &Experience,
        population_max_tenure: u32,
    ) -> f64 {
        normalized(
            experience.total_years,
            population_max_tenure,
            self.weights.tenure,
        )
    }

    /// Same shape as tenure with weight 10; never-promoted candidates contribute 0.
    pub fn compute_post_promotion_contribution(
        &self,
        experience: &Experience,
        population_max_related_tenure: u32,
    ) -> f64 {
        match experience.related_years {
            Some(years) => normalized(
                years,
                population_max_related_tenure,
                self.weights.post_promotion,
            ),
            None => 0.0,
        }
    }

    pub fn set_performance_score(&self, raw: f64) -> Result<ComponentWrite, EvaluationError> {
        let raw = validate_raw_score("performance_score", raw)?;
        Ok(ComponentWrite::Performance {
            raw,
            contribution: scale_rating(raw, self.weights.performance),
        })
    }

    pub fn set_manager_recommendation(&self, raw: f64) -> Result<ComponentWrite, EvaluationError> {
        let raw = validate_raw_score("manager_recommendation", raw)?;
        Ok(ComponentWrite::ManagerRecommendation {
            contribution: scale_rating(raw, self.weights.manager_recommendation),
        })
    }

    /// Fails with a branch mismatch unless `caller_branch` is the candidate's branch.
    pub fn set_district_recommendation(
        &self,
        candidate: &Candidate,
        raw: f64,
        caller_branch: &str,
    ) -> Result<ComponentWrite, EvaluationError> {
        if candidate.branch != caller_branch {
            return Err(AuthorizationError::BranchMismatch {
                caller: caller_branch.to_string(),
                candidate: candidate.branch.clone(),
            }
            .into());
        }
        let raw = validate_raw_score("district_recommendation", raw)?;
        Ok(ComponentWrite::DistrictRecommendation {
            contribution: scale_rating(raw, self.weights.district_recommendation),
        })
    }

    /// Sum of the five contributions with unset ones counted as 0. Pure.
    pub fn recompute_total(&self, scores: &ScoreComponents) -> f64 {
        scores.sum_contributions()
    }

    /// Reset for a new evaluation cycle with tenure-derived components already in place.
    pub fn initialize(&self, experience: Experience, maxima: PopulationMaxima) -> ComponentWrite {
        ComponentWrite::Reset {
            experience,
            tenure: self.compute_tenure_contribution(&experience, maxima.total_tenure),
            post_promotion: self
                .compute_post_promotion_contribution(&experience, maxima.related_tenure),
        }
    }

    /// Tenure components re-derived after the tenure dates changed.
    pub fn rescore_tenure(
        &self,
        experience: Experience,
        maxima: PopulationMaxima,
    ) -> ComponentWrite {
        ComponentWrite::Tenure {
            experience,
            tenure: self.compute_tenure_contribution(&experience, maxima.total_tenure),
            post_promotion: self
                .compute_post_promotion_contribution(&experience, maxima.related_tenure),
        }
    }

    /// Components for a newly registered candidate.
    pub(crate) fn score_new_candidate(
        &self,
        draft: &ValidatedDraft,
        experience: &Experience,
        maxima: PopulationMaxima,
    ) -> ScoreComponents {
        let mut scores = ScoreComponents {
            raw_performance: draft.raw_performance,
            performance: draft
                .raw_performance
                .map(|raw| scale_rating(raw, self.weights.performance)),
            tenure: Some(self.compute_tenure_contribution(experience, maxima.total_tenure)),
            post_promotion: Some(
                self.compute_post_promotion_contribution(experience, maxima.related_tenure),
            ),
            ..ScoreComponents::default()
        };
        scores.total = self.recompute_total(&scores);
        scores
    }
}

fn normalized(value: u32, population_max: u32, points: f64) -> f64 {
    if population_max == 0 {
        return 0.0;
    }
    f64::from(value) / f64::from(population_max) * points
}

/// Failures raised by the engine's setters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}
