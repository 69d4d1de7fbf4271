use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicantKind, ApplicationId, ApplicationSubmission, JobDraft, JobId, JobStatus, JobType,
    PromotionStatus,
};
use super::repository::RecruitmentStore;
use super::service::{ApplicantMatcher, RecruitmentService, RecruitmentServiceError};
use crate::access::{authenticate, CredentialVerifier, Principal};
use crate::workflows::promotion::router::authentication_response;

pub struct RecruitmentApi<R, M> {
    pub service: Arc<RecruitmentService<R, M>>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl<R, M> Clone for RecruitmentApi<R, M> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JobTypeFilter {
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AudienceFilter {
    #[serde(rename = "type")]
    pub audience: Option<ApplicantKind>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
}

/// Admin job management plus the public application endpoints.
pub fn recruitment_router<R, M>(
    service: Arc<RecruitmentService<R, M>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> Router
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            post(create_job_handler::<R, M>).get(list_jobs_handler::<R, M>),
        )
        .route(
            "/api/v1/jobs/:id",
            get(job_handler::<R, M>)
                .put(update_job_handler::<R, M>)
                .delete(delete_job_handler::<R, M>),
        )
        .route("/api/v1/jobs/:id/status", patch(job_status_handler::<R, M>))
        .route(
            "/api/v1/jobs/:id/applications",
            get(job_applications_handler::<R, M>),
        )
        .route(
            "/api/v1/jobs/:id/links",
            post(generate_links_handler::<R, M>).get(list_links_handler::<R, M>),
        )
        .route(
            "/api/v1/applications/:id/promotion-status",
            patch(review_handler::<R, M>),
        )
        .route("/api/v1/public/jobs", get(public_jobs_handler::<R, M>))
        .route("/api/v1/public/jobs/:id", get(public_job_handler::<R, M>))
        .route(
            "/api/v1/public/applications",
            post(submit_handler::<R, M>),
        )
        .route("/api/v1/public/links/:token", get(link_handler::<R, M>))
        .route(
            "/api/v1/public/links/:token/applications",
            post(link_submit_handler::<R, M>),
        )
        .with_state(RecruitmentApi { service, verifier })
}

pub(crate) async fn create_job_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.create_job(&principal, draft) {
        Ok(job) => (StatusCode::CREATED, axum::Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_jobs_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Query(filter): Query<JobTypeFilter>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let result = match filter.job_type {
        Some(job_type) => api.service.jobs_by_type(&principal, job_type),
        None => api.service.list_jobs(&principal),
    };
    match result {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn job_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    if let Err(response) = resolve(&api, &headers) {
        return response;
    }
    match api.service.get_job(JobId(id)) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_job_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.update_job(&principal, JobId(id), draft) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_job_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.delete_job(&principal, JobId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn job_status_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(change): axum::Json<StatusChange<JobStatus>>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.set_job_status(&principal, JobId(id), change.status) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn job_applications_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.applications_for_job(&principal, JobId(id)) {
        Ok(applicants) => (StatusCode::OK, axum::Json(applicants)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn generate_links_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.generate_links(&principal, JobId(id)) {
        Ok(links) => (StatusCode::CREATED, axum::Json(links)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_links_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.links_for_job(&principal, JobId(id)) {
        Ok(links) => (StatusCode::OK, axum::Json(links)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn review_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    axum::Json(change): axum::Json<StatusChange<PromotionStatus>>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api
        .service
        .review_application(&principal, ApplicationId(id), change.status)
    {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn public_jobs_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    Query(filter): Query<AudienceFilter>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    match api.service.open_jobs(filter.audience) {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn public_job_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    Path(id): Path<u64>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    match api.service.get_job(JobId(id)) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    match api.service.submit_application(submission) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn link_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    Path(token): Path<String>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    match api.service.validate_link(&token) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn link_submit_handler<R, M>(
    State(api): State<RecruitmentApi<R, M>>,
    Path(token): Path<String>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
{
    match api.service.submit_via_link(&token, submission) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

fn resolve<R, M>(api: &RecruitmentApi<R, M>, headers: &HeaderMap) -> Result<Principal, Response> {
    authenticate(headers, api.verifier.as_ref()).map_err(authentication_response)
}

pub(crate) fn error_response(error: RecruitmentServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), axum::Json(payload)).into_response()
}
