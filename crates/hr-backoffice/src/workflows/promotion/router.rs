use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicantName, CandidateDraft, CandidateId};
use super::repository::CandidateRepository;
use super::service::{PromotionService, PromotionServiceError};
use crate::access::{authenticate, AuthenticationError, CredentialVerifier, Principal};

/// Shared handler state: the service plus the verifier that resolves bearer tokens.
pub struct PromotionApi<C> {
    pub service: Arc<PromotionService<C>>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl<C> Clone for PromotionApi<C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

/// Raw 0-100 rating submitted by a manager or district manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub score: f64,
}

pub fn promotion_router<C>(
    service: Arc<PromotionService<C>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> Router
where
    C: CandidateRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates",
            post(create_handler::<C>).get(list_handler::<C>),
        )
        .route("/api/v1/candidates/ranking", get(ranking_handler::<C>))
        .route("/api/v1/candidates/export", get(export_handler::<C>))
        .route("/api/v1/candidates/match", post(match_handler::<C>))
        .route(
            "/api/v1/candidates/:id",
            get(candidate_handler::<C>).put(update_handler::<C>),
        )
        .route(
            "/api/v1/candidates/:id/evaluation",
            get(evaluation_handler::<C>),
        )
        .route(
            "/api/v1/candidates/:id/evaluation/reset",
            post(reset_handler::<C>),
        )
        .route(
            "/api/v1/candidates/:id/performance",
            patch(performance_handler::<C>),
        )
        .route(
            "/api/v1/candidates/:id/manager-recommendation",
            patch(manager_handler::<C>),
        )
        .route(
            "/api/v1/candidates/:id/district-recommendation",
            patch(district_handler::<C>),
        )
        .with_state(PromotionApi { service, verifier })
}

pub(crate) async fn create_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<CandidateDraft>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.create_candidate(&principal, draft) {
        Ok(candidate) => (StatusCode::CREATED, axum::Json(candidate)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.list_candidates(&principal) {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn ranking_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.rank_candidates(&principal) {
        Ok(ranking) => (StatusCode::OK, axum::Json(ranking)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.export_evaluations(&principal) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"promotion_evaluations.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn match_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    axum::Json(applicant): axum::Json<ApplicantName>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.match_application(&principal, &applicant) {
        Ok(candidate) => {
            let payload = json!({
                "matched": true,
                "candidate_id": candidate.id,
                "evaluation": candidate.breakdown(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn candidate_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.get_candidate(&principal, CandidateId(id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(draft): axum::Json<CandidateDraft>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.update_candidate(&principal, CandidateId(id), draft) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluation_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.get_evaluation(&principal, CandidateId(id)) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reset_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.initialize_evaluation(&principal, CandidateId(id)) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate.breakdown())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn performance_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let result = api
        .service
        .set_performance_score(&principal, CandidateId(id), submission.score);
    score_response(result)
}

pub(crate) async fn manager_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let result = api.service.set_manager_recommendation(
        &principal,
        CandidateId(id),
        submission.score,
    );
    score_response(result)
}

pub(crate) async fn district_handler<C>(
    State(api): State<PromotionApi<C>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    C: CandidateRepository + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let result = api.service.set_district_recommendation(
        &principal,
        CandidateId(id),
        submission.score,
    );
    score_response(result)
}

fn resolve<C>(api: &PromotionApi<C>, headers: &HeaderMap) -> Result<Principal, Response> {
    authenticate(headers, api.verifier.as_ref()).map_err(authentication_response)
}

fn score_response(result: Result<super::domain::Candidate, PromotionServiceError>) -> Response {
    match result {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate.breakdown())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn authentication_response(error: AuthenticationError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

pub(crate) fn error_response(error: PromotionServiceError) -> Response {
    let status = error.status_code();
    let payload = match &error {
        PromotionServiceError::NoMatch { full_name, .. } => json!({
            "error": error.to_string(),
            "operation": error.operation().label(),
            "matched": false,
            "full_name": full_name,
        }),
        _ => json!({
            "error": error.to_string(),
            "operation": error.operation().label(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
