use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use serde_json::json;

use super::service::{UserAdminError, UserAdminService};
use crate::access::{authenticate, CredentialVerifier, Principal, SubjectId, UserDirectory};
use crate::workflows::promotion::router::authentication_response;

pub struct UsersApi<D> {
    pub service: Arc<UserAdminService<D>>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl<D> Clone for UsersApi<D> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

/// Operator listing and revocation, admin only.
pub fn users_router<D>(
    service: Arc<UserAdminService<D>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> Router
where
    D: UserDirectory + 'static,
{
    Router::new()
        .route("/api/v1/admin/users", get(list_users_handler::<D>))
        .route(
            "/api/v1/admin/users/:subject",
            delete(revoke_user_handler::<D>),
        )
        .with_state(UsersApi { service, verifier })
}

fn resolve<D>(api: &UsersApi<D>, headers: &HeaderMap) -> Result<Principal, Response> {
    authenticate(headers, api.verifier.as_ref()).map_err(authentication_response)
}

pub async fn list_users_handler<D>(State(api): State<UsersApi<D>>, headers: HeaderMap) -> Response
where
    D: UserDirectory + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.list_users(&principal) {
        Ok(accounts) => (StatusCode::OK, axum::Json(accounts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn revoke_user_handler<D>(
    State(api): State<UsersApi<D>>,
    headers: HeaderMap,
    Path(subject): Path<String>,
) -> Response
where
    D: UserDirectory + 'static,
{
    let principal = match resolve(&api, &headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match api.service.revoke_user(&principal, &SubjectId(subject)) {
        Ok(account) => (StatusCode::OK, axum::Json(account)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(error: UserAdminError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Role, StaticTokenVerifier};
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        let tokens = Arc::new(
            StaticTokenVerifier::default()
                .with_grant("admin-token", Principal::new("hr-admin", Role::Admin))
                .with_grant("manager-token", Principal::new("hr-manager", Role::Manager)),
        );
        let verifier: Arc<dyn CredentialVerifier> = tokens.clone();
        users_router(Arc::new(UserAdminService::new(tokens)), verifier)
    }

    fn request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request builds")
    }

    async fn send(router: &Router, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(request(method, uri, token))
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn listing_never_exposes_tokens() {
        let router = router();
        let (status, body) = send(&router, "GET", "/api/v1/admin/users", "admin-token").await;
        assert_eq!(status, StatusCode::OK);
        let accounts = body.as_array().expect("account list");
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0]["subject"], "hr-admin");
        assert_eq!(accounts[1]["role"]["kind"], "manager");
        assert!(!body.to_string().contains("manager-token"));

        let (status, _) = send(&router, "GET", "/api/v1/admin/users", "manager-token").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn revoked_tokens_stop_authenticating() {
        let router = router();
        let (status, body) = send(
            &router,
            "DELETE",
            "/api/v1/admin/users/hr-manager",
            "admin-token",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokens"], 1);

        let (status, _) = send(&router, "GET", "/api/v1/admin/users", "manager-token").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &router,
            "DELETE",
            "/api/v1/admin/users/hr-manager",
            "admin-token",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &router,
            "DELETE",
            "/api/v1/admin/users/hr-admin",
            "admin-token",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().is_some());
    }
}
