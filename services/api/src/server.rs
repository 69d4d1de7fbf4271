use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCandidateRepository, InMemoryRecruitmentStore};
use crate::routes::with_backoffice_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hr_backoffice::access::CredentialVerifier;
use hr_backoffice::clock::{Clock, SystemClock};
use hr_backoffice::config::AppConfig;
use hr_backoffice::error::AppError;
use hr_backoffice::telemetry;
use hr_backoffice::workflows::promotion::PromotionService;
use hr_backoffice::workflows::recruitment::RecruitmentService;
use hr_backoffice::workflows::users::UserAdminService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.access.grants.is_empty() {
        warn!("APP_ACCESS_TOKENS is empty; every authenticated route will answer 401");
    }
    let tokens = Arc::new(config.access.verifier());
    let verifier: Arc<dyn CredentialVerifier> = tokens.clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let promotion = Arc::new(PromotionService::new(
        Arc::new(InMemoryCandidateRepository::default()),
        clock.clone(),
    ));
    let recruitment = Arc::new(RecruitmentService::new(
        Arc::new(InMemoryRecruitmentStore::default()),
        promotion.clone(),
        clock,
        config.recruitment.clone(),
    ));

    let users = Arc::new(UserAdminService::new(tokens));

    let app = with_backoffice_routes(promotion, recruitment, users, verifier)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, grants = config.access.grants.len(), "hr back office ready");

    axum::serve(listener, app).await?;
    Ok(())
}
