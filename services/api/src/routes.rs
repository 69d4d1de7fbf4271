use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use hr_backoffice::access::{CredentialVerifier, UserDirectory};
use hr_backoffice::workflows::promotion::{promotion_router, CandidateRepository, PromotionService};
use hr_backoffice::workflows::recruitment::{
    recruitment_router, ApplicantMatcher, RecruitmentService, RecruitmentStore,
};
use hr_backoffice::workflows::users::{users_router, UserAdminService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_backoffice_routes<C, R, M, D>(
    promotion: Arc<PromotionService<C>>,
    recruitment: Arc<RecruitmentService<R, M>>,
    users: Arc<UserAdminService<D>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> axum::Router
where
    C: CandidateRepository + 'static,
    R: RecruitmentStore + 'static,
    M: ApplicantMatcher + 'static,
    D: UserDirectory + 'static,
{
    promotion_router(promotion, verifier.clone())
        .merge(recruitment_router(recruitment, verifier.clone()))
        .merge(users_router(users, verifier))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryCandidateRepository, InMemoryRecruitmentStore};
    use axum::body::Body;
    use axum::http::Request;
    use hr_backoffice::access::{Principal, Role, StaticTokenVerifier};
    use hr_backoffice::clock::FixedClock;
    use hr_backoffice::config::RecruitmentConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn router(state: AppState) -> axum::Router {
        let clock = Arc::new(FixedClock::on(
            chrono::NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
        ));
        let promotion = Arc::new(PromotionService::new(
            Arc::new(InMemoryCandidateRepository::default()),
            clock.clone(),
        ));
        let recruitment = Arc::new(RecruitmentService::new(
            Arc::new(InMemoryRecruitmentStore::default()),
            promotion.clone(),
            clock,
            RecruitmentConfig::default(),
        ));
        let tokens = Arc::new(
            StaticTokenVerifier::default()
                .with_grant("admin-token", Principal::new("hr-admin", Role::Admin)),
        );
        let users = Arc::new(UserAdminService::new(tokens.clone()));
        with_backoffice_routes(promotion, recruitment, users, tokens).layer(Extension(state))
    }

    async fn status_of(router: axum::Router, uri: &str, token: Option<&str>) -> StatusCode {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        router
            .oneshot(request.body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        assert_eq!(
            status_of(router(app_state(false)), "/ready", None).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(router(app_state(true)), "/ready", None).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn workflow_routes_are_mounted_beside_the_health_checks() {
        let router = router(app_state(true));
        assert_eq!(
            status_of(router.clone(), "/health", None).await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router.clone(), "/api/v1/candidates", Some("admin-token")).await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router.clone(), "/api/v1/candidates", None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(router.clone(), "/api/v1/admin/users", Some("admin-token")).await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(router, "/api/v1/public/jobs", None).await,
            StatusCode::OK
        );
    }
}
