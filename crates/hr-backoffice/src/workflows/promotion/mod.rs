//! Promotion evaluation: candidate scoring, population normalization, application matching, and
//! the role-gated service that keeps every candidate's total consistent with its components.

pub mod domain;
pub mod evaluation;
pub mod export;
pub mod matching;
pub mod normalization;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantName, Candidate, CandidateDraft, CandidateId, CandidateProfile, CandidateSummary,
    ComponentWrite, EvaluationBreakdown, Experience, ScoreComponents, Sex,
};
pub use evaluation::{EvaluationEngine, EvaluationError, ValidationError, PROMOTION_WEIGHTS};
pub use export::{ExportError, EXPORT_HEADER};
pub use matching::{MatchError, MatchingService};
pub use normalization::{NormalizationService, PopulationField, PopulationMaxima};
pub use repository::{CandidateRepository, RepositoryError};
pub use router::{promotion_router, PromotionApi, ScoreSubmission};
pub use service::{CandidateView, PromotionService, PromotionServiceError};
