use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ApplicantName, Candidate, CandidateDraft, CandidateId, CandidateProfile, CandidateSummary,
    ComponentWrite, EvaluationBreakdown, Experience,
};
use super::evaluation::{validate_draft, EvaluationEngine, EvaluationError, ValidationError};
use super::export::{evaluations_csv, ExportError};
use super::matching::{MatchError, MatchingService};
use super::normalization::NormalizationService;
use super::repository::{CandidateRepository, RepositoryError};
use crate::access::{AccessPolicy, AuthorizationError, Operation, Principal, Role};
use crate::clock::Clock;

/// Candidate as visible to the caller: district managers only get the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateView {
    Full(Box<Candidate>),
    Summary(CandidateSummary),
}

/// Orchestrates the score store, normalization, matching, and engine behind the access policy.
pub struct PromotionService<C> {
    candidates: Arc<C>,
    normalization: NormalizationService<C>,
    matching: MatchingService<C>,
    engine: EvaluationEngine,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
}

impl<C> PromotionService<C>
where
    C: CandidateRepository + 'static,
{
    pub fn new(candidates: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            normalization: NormalizationService::new(candidates.clone()),
            matching: MatchingService::new(candidates.clone()),
            candidates,
            engine: EvaluationEngine::new(),
            policy: AccessPolicy,
            clock,
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Registers a candidate with tenure-derived components scored against the current pool.
    pub fn create_candidate(
        &self,
        principal: &Principal,
        draft: CandidateDraft,
    ) -> Result<Candidate, PromotionServiceError> {
        let operation = Operation::CreateCandidate;
        self.authorize(principal, operation, None)?;

        let today = self.clock.today();
        let validated = validate_draft(&draft, today)
            .map_err(|source| PromotionServiceError::Validation { operation, source })?;
        let experience =
            Experience::as_of(validated.employment_date, draft.last_promotion_date, today);
        let maxima = self
            .normalization
            .maxima()
            .map_err(|err| PromotionServiceError::unavailable(operation, err))?
            .including(&experience);
        let scores = self
            .engine
            .score_new_candidate(&validated, &experience, maxima);

        let file_number = draft.file_number.trim().to_string();
        let candidate = Candidate {
            id: CandidateId::UNASSIGNED,
            file_number: file_number.clone(),
            full_name: draft.full_name.trim().to_string(),
            sex: validated.sex,
            branch: draft.branch.trim().to_string(),
            district: draft.district.trim().to_string(),
            job_grade: draft.job_grade.trim().to_string(),
            job_category: draft.job_category.trim().to_string(),
            department: draft.department,
            region: draft.region,
            current_position: draft.current_position,
            employment_date: validated.employment_date,
            last_promotion_date: draft.last_promotion_date,
            experience,
            scores,
        };

        let stored = match self.candidates.insert(candidate) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(PromotionServiceError::Validation {
                    operation,
                    source: ValidationError::DuplicateFileNumber(file_number),
                })
            }
            Err(err) => return Err(PromotionServiceError::unavailable(operation, err)),
        };

        info!(
            candidate_id = %stored.id,
            file_number = %stored.file_number,
            branch = %stored.branch,
            total = stored.scores.total,
            "candidate registered"
        );
        Ok(stored)
    }

    /// Rewrites a candidate's administrative fields. Experience and the tenure-derived
    /// components follow the new dates; ratings already given are kept.
    pub fn update_candidate(
        &self,
        principal: &Principal,
        id: CandidateId,
        draft: CandidateDraft,
    ) -> Result<Candidate, PromotionServiceError> {
        let operation = Operation::UpdateCandidate;
        self.authorize(principal, operation, None)?;

        if draft.performance_score.is_some() {
            return Err(PromotionServiceError::Validation {
                operation,
                source: ValidationError::ScoreNotEditable("performance_score"),
            });
        }
        let today = self.clock.today();
        let validated = validate_draft(&draft, today)
            .map_err(|source| PromotionServiceError::Validation { operation, source })?;
        self.fetch(operation, id)?;

        let experience =
            Experience::as_of(validated.employment_date, draft.last_promotion_date, today);
        let maxima = self
            .normalization
            .maxima_excluding(id)
            .map_err(|err| PromotionServiceError::unavailable(operation, err))?
            .including(&experience);
        let write = self.engine.rescore_tenure(experience, maxima);

        let file_number = draft.file_number.trim().to_string();
        let profile = CandidateProfile {
            file_number: file_number.clone(),
            full_name: draft.full_name.trim().to_string(),
            sex: validated.sex,
            branch: draft.branch.trim().to_string(),
            district: draft.district.trim().to_string(),
            job_grade: draft.job_grade.trim().to_string(),
            job_category: draft.job_category.trim().to_string(),
            department: draft.department,
            region: draft.region,
            current_position: draft.current_position,
            employment_date: validated.employment_date,
            last_promotion_date: draft.last_promotion_date,
        };

        let updated = match self.candidates.update_profile(id, profile, write) {
            Ok(updated) => updated,
            Err(RepositoryError::Conflict) => {
                return Err(PromotionServiceError::Validation {
                    operation,
                    source: ValidationError::DuplicateFileNumber(file_number),
                })
            }
            Err(err) => return Err(PromotionServiceError::from_row(operation, id, err)),
        };

        info!(
            candidate_id = %id,
            subject = %principal.subject.0,
            tenure = updated.scores.tenure.unwrap_or(0.0),
            total = updated.scores.total,
            "candidate profile updated"
        );
        Ok(updated)
    }

    pub fn get_candidate(
        &self,
        principal: &Principal,
        id: CandidateId,
    ) -> Result<CandidateView, PromotionServiceError> {
        let candidate = self.read_scoped(principal, Operation::ReadCandidate, id)?;
        Ok(view_for(principal, candidate))
    }

    pub fn set_performance_score(
        &self,
        principal: &Principal,
        id: CandidateId,
        raw_score: f64,
    ) -> Result<Candidate, PromotionServiceError> {
        self.write_component(principal, Operation::SetPerformanceScore, id, |_| {
            self.engine.set_performance_score(raw_score)
        })
    }

    pub fn set_manager_recommendation(
        &self,
        principal: &Principal,
        id: CandidateId,
        raw_score: f64,
    ) -> Result<Candidate, PromotionServiceError> {
        self.write_component(principal, Operation::SetManagerRecommendation, id, |_| {
            self.engine.set_manager_recommendation(raw_score)
        })
    }

    /// The caller's branch comes from the principal, never from the request body.
    pub fn set_district_recommendation(
        &self,
        principal: &Principal,
        id: CandidateId,
        raw_score: f64,
    ) -> Result<Candidate, PromotionServiceError> {
        let caller_branch = principal.branch().unwrap_or_default();
        self.write_component(
            principal,
            Operation::SetDistrictRecommendation,
            id,
            |candidate| {
                self.engine
                    .set_district_recommendation(candidate, raw_score, caller_branch)
            },
        )
    }

    /// Clears every component and re-seeds the tenure-derived ones.
    pub fn initialize_evaluation(
        &self,
        principal: &Principal,
        id: CandidateId,
    ) -> Result<Candidate, PromotionServiceError> {
        let operation = Operation::InitializeEvaluation;
        self.authorize(principal, operation, None)?;
        self.begin_cycle(operation, id)
    }

    pub fn match_application(
        &self,
        principal: &Principal,
        applicant: &ApplicantName,
    ) -> Result<Candidate, PromotionServiceError> {
        self.authorize(principal, Operation::MatchApplication, None)?;
        self.match_applicant(applicant)
    }

    /// Matches a submitted application and starts a new evaluation cycle for the candidate.
    /// Runs on behalf of the intake flow, so no principal is involved.
    pub fn match_applicant(
        &self,
        applicant: &ApplicantName,
    ) -> Result<Candidate, PromotionServiceError> {
        let operation = Operation::MatchApplication;
        let candidate = self.matching.locate(applicant).map_err(|err| match err {
            MatchError::NoMatch { full_name } => {
                info!(full_name = %full_name, "application did not match any candidate");
                PromotionServiceError::NoMatch {
                    operation,
                    full_name,
                }
            }
            MatchError::Repository(err) => PromotionServiceError::unavailable(operation, err),
        })?;

        let updated = self.begin_cycle(operation, candidate.id)?;
        info!(
            candidate_id = %updated.id,
            full_name = %updated.full_name,
            "application matched to candidate"
        );
        Ok(updated)
    }

    pub fn get_evaluation(
        &self,
        principal: &Principal,
        id: CandidateId,
    ) -> Result<EvaluationBreakdown, PromotionServiceError> {
        let candidate = self.read_scoped(principal, Operation::ReadEvaluation, id)?;
        Ok(candidate.breakdown())
    }

    pub fn list_candidates(
        &self,
        principal: &Principal,
    ) -> Result<Vec<CandidateView>, PromotionServiceError> {
        let candidates = self.visible_candidates(principal, Operation::ListCandidates)?;
        Ok(candidates
            .into_iter()
            .map(|candidate| view_for(principal, candidate))
            .collect())
    }

    /// Evaluations ordered by total, highest first; ties go to the lower file number.
    pub fn rank_candidates(
        &self,
        principal: &Principal,
    ) -> Result<Vec<EvaluationBreakdown>, PromotionServiceError> {
        let candidates = self.ranked(principal, Operation::ReadEvaluation)?;
        Ok(candidates.iter().map(Candidate::breakdown).collect())
    }

    /// Ranked evaluations rendered as CSV.
    pub fn export_evaluations(
        &self,
        principal: &Principal,
    ) -> Result<String, PromotionServiceError> {
        let operation = Operation::ExportEvaluations;
        let candidates = self.ranked(principal, operation)?;
        let csv = evaluations_csv(&candidates)
            .map_err(|source| PromotionServiceError::Export { operation, source })?;
        info!(rows = candidates.len(), subject = %principal.subject.0, "evaluations exported");
        Ok(csv)
    }

    fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        subject_branch: Option<&str>,
    ) -> Result<(), PromotionServiceError> {
        self.policy
            .require(principal, operation, subject_branch)
            .map_err(|source| {
                warn!(
                    subject = %principal.subject.0,
                    role = principal.role.label(),
                    operation = %operation,
                    reason = %source,
                    "operation denied"
                );
                PromotionServiceError::Authorization { operation, source }
            })
    }

    fn fetch(
        &self,
        operation: Operation,
        id: CandidateId,
    ) -> Result<Candidate, PromotionServiceError> {
        self.candidates
            .get(id)
            .map_err(|err| PromotionServiceError::unavailable(operation, err))?
            .ok_or(PromotionServiceError::NotFound { operation, id })
    }

    /// Role check, then lookup, then branch check against the stored record.
    fn read_scoped(
        &self,
        principal: &Principal,
        operation: Operation,
        id: CandidateId,
    ) -> Result<Candidate, PromotionServiceError> {
        self.authorize(principal, operation, None)?;
        let candidate = self.fetch(operation, id)?;
        self.authorize(principal, operation, Some(&candidate.branch))?;
        Ok(candidate)
    }

    fn write_component<F>(
        &self,
        principal: &Principal,
        operation: Operation,
        id: CandidateId,
        build: F,
    ) -> Result<Candidate, PromotionServiceError>
    where
        F: FnOnce(&Candidate) -> Result<ComponentWrite, EvaluationError>,
    {
        let candidate = self.read_scoped(principal, operation, id)?;
        let write = build(&candidate).map_err(|err| match err {
            EvaluationError::Validation(source) => {
                PromotionServiceError::Validation { operation, source }
            }
            EvaluationError::Authorization(source) => {
                PromotionServiceError::Authorization { operation, source }
            }
        })?;

        let updated = self
            .candidates
            .apply_component(id, write)
            .map_err(|err| PromotionServiceError::from_row(operation, id, err))?;

        info!(
            candidate_id = %id,
            operation = %operation,
            subject = %principal.subject.0,
            total = updated.scores.total,
            "score component updated"
        );
        Ok(updated)
    }

    fn begin_cycle(
        &self,
        operation: Operation,
        id: CandidateId,
    ) -> Result<Candidate, PromotionServiceError> {
        let candidate = self.fetch(operation, id)?;
        let experience = Experience::as_of(
            candidate.employment_date,
            candidate.last_promotion_date,
            self.clock.today(),
        );
        let maxima = self
            .normalization
            .maxima()
            .map_err(|err| PromotionServiceError::unavailable(operation, err))?
            .including(&experience);

        let write = self.engine.initialize(experience, maxima);
        let updated = self
            .candidates
            .apply_component(id, write)
            .map_err(|err| PromotionServiceError::from_row(operation, id, err))?;

        info!(
            candidate_id = %id,
            tenure = updated.scores.tenure.unwrap_or(0.0),
            post_promotion = updated.scores.post_promotion.unwrap_or(0.0),
            total = updated.scores.total,
            "evaluation cycle initialized"
        );
        Ok(updated)
    }

    fn visible_candidates(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<Vec<Candidate>, PromotionServiceError> {
        self.authorize(principal, operation, None)?;
        let mut candidates = self
            .candidates
            .all()
            .map_err(|err| PromotionServiceError::unavailable(operation, err))?;
        if let Some(branch) = principal.branch() {
            candidates.retain(|candidate| candidate.branch == branch);
        }
        Ok(candidates)
    }

    fn ranked(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<Vec<Candidate>, PromotionServiceError> {
        let mut candidates = self.visible_candidates(principal, operation)?;
        candidates.sort_by(|a, b| {
            b.scores
                .total
                .total_cmp(&a.scores.total)
                .then_with(|| a.file_number.cmp(&b.file_number))
        });
        Ok(candidates)
    }
}

fn view_for(principal: &Principal, candidate: Candidate) -> CandidateView {
    match principal.role {
        Role::DistrictManager { .. } => CandidateView::Summary(candidate.summary()),
        Role::Admin | Role::Manager => CandidateView::Full(Box::new(candidate)),
    }
}

/// Failures surfaced by the promotion service, each tagged with the operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum PromotionServiceError {
    #[error("{operation}: {source}")]
    Validation {
        operation: Operation,
        #[source]
        source: ValidationError,
    },
    #[error("{operation}: {source}")]
    Authorization {
        operation: Operation,
        #[source]
        source: AuthorizationError,
    },
    #[error("{operation}: candidate {id} not found")]
    NotFound { operation: Operation, id: CandidateId },
    #[error("{operation}: no candidate named '{full_name}'")]
    NoMatch {
        operation: Operation,
        full_name: String,
    },
    #[error("{operation}: storage unavailable: {reason}")]
    StorageUnavailable { operation: Operation, reason: String },
    #[error("{operation}: {source}")]
    Export {
        operation: Operation,
        #[source]
        source: ExportError,
    },
}

impl PromotionServiceError {
    pub fn operation(&self) -> Operation {
        match self {
            PromotionServiceError::Validation { operation, .. }
            | PromotionServiceError::Authorization { operation, .. }
            | PromotionServiceError::NotFound { operation, .. }
            | PromotionServiceError::NoMatch { operation, .. }
            | PromotionServiceError::StorageUnavailable { operation, .. }
            | PromotionServiceError::Export { operation, .. } => *operation,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PromotionServiceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PromotionServiceError::Authorization { .. } => StatusCode::FORBIDDEN,
            PromotionServiceError::NotFound { .. } | PromotionServiceError::NoMatch { .. } => {
                StatusCode::NOT_FOUND
            }
            PromotionServiceError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PromotionServiceError::Export { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn unavailable(operation: Operation, err: RepositoryError) -> Self {
        PromotionServiceError::StorageUnavailable {
            operation,
            reason: err.to_string(),
        }
    }

    fn from_row(operation: Operation, id: CandidateId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => PromotionServiceError::NotFound { operation, id },
            other => PromotionServiceError::unavailable(operation, other),
        }
    }
}
