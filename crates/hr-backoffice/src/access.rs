//! Role-gated access to the promotion and recruitment workflows.
//!
//! Principals arrive already authenticated: a [`CredentialVerifier`] turns a bearer token into a
//! [`Principal`] once per request, and [`AccessPolicy`] consults a fixed rule table before any
//! score component or record is touched.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Stable identifier of an authenticated operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

/// Role resolved by the credential verifier.
///
/// District managers carry the branch they are scoped to; the scoping is compared against a
/// candidate's branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    DistrictManager { branch: String },
}

impl Role {
    pub const fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::DistrictManager { .. } => "district_manager",
        }
    }

    /// Parses the role names used by the access-token configuration.
    pub fn parse(name: &str, branch: Option<&str>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "district_manager" | "district-manager" => {
                let branch = branch.map(str::trim).filter(|value| !value.is_empty())?;
                Some(Role::DistrictManager {
                    branch: branch.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Authenticated caller as seen by the services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: SubjectId,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: SubjectId(subject.into()),
            role,
        }
    }

    pub fn branch(&self) -> Option<&str> {
        match &self.role {
            Role::DistrictManager { branch } => Some(branch.as_str()),
            _ => None,
        }
    }
}

/// Operations gated by the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateCandidate,
    UpdateCandidate,
    ReadCandidate,
    ListCandidates,
    ReadEvaluation,
    ExportEvaluations,
    SetPerformanceScore,
    SetManagerRecommendation,
    SetDistrictRecommendation,
    InitializeEvaluation,
    MatchApplication,
    ReviewApplications,
    ManageJobs,
    ManageUsers,
}

impl Operation {
    pub const fn label(self) -> &'static str {
        match self {
            Operation::CreateCandidate => "create_candidate",
            Operation::UpdateCandidate => "update_candidate",
            Operation::ReadCandidate => "read_candidate",
            Operation::ListCandidates => "list_candidates",
            Operation::ReadEvaluation => "read_evaluation",
            Operation::ExportEvaluations => "export_evaluations",
            Operation::SetPerformanceScore => "set_performance_score",
            Operation::SetManagerRecommendation => "set_manager_recommendation",
            Operation::SetDistrictRecommendation => "set_district_recommendation",
            Operation::InitializeEvaluation => "initialize_evaluation",
            Operation::MatchApplication => "match_application",
            Operation::ReviewApplications => "review_applications",
            Operation::ManageJobs => "manage_jobs",
            Operation::ManageUsers => "manage_users",
        }
    }

    const fn is_read(self) -> bool {
        matches!(
            self,
            Operation::ReadCandidate
                | Operation::ListCandidates
                | Operation::ReadEvaluation
                | Operation::ExportEvaluations
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Authorization failures. Distinct from validation errors: retrying with the same identity
/// will not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("role '{role}' may not perform {operation}")]
    Denied {
        role: &'static str,
        operation: Operation,
    },
    #[error(
        "district manager of branch '{caller}' may not act on candidates of branch '{candidate}'"
    )]
    BranchMismatch { caller: String, candidate: String },
}

/// Fixed role-to-operation table.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Returns whether `principal` may perform `operation`. `subject_branch` is the branch of the
    /// candidate being touched, when there is one.
    pub fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        subject_branch: Option<&str>,
    ) -> bool {
        self.require(principal, operation, subject_branch).is_ok()
    }

    pub fn require(
        &self,
        principal: &Principal,
        operation: Operation,
        subject_branch: Option<&str>,
    ) -> Result<(), AuthorizationError> {
        let granted = match &principal.role {
            Role::Admin => {
                operation.is_read()
                    || matches!(
                        operation,
                        Operation::CreateCandidate
                            | Operation::UpdateCandidate
                            | Operation::InitializeEvaluation
                            | Operation::MatchApplication
                            | Operation::ReviewApplications
                            | Operation::ManageJobs
                            | Operation::ManageUsers
                    )
            }
            Role::Manager => {
                operation.is_read()
                    || matches!(
                        operation,
                        Operation::SetPerformanceScore | Operation::SetManagerRecommendation
                    )
            }
            Role::DistrictManager { branch } => {
                let in_scope =
                    operation.is_read() || operation == Operation::SetDistrictRecommendation;
                if in_scope {
                    if let Some(candidate) = subject_branch {
                        if candidate != branch {
                            return Err(AuthorizationError::BranchMismatch {
                                caller: branch.clone(),
                                candidate: candidate.to_string(),
                            });
                        }
                    }
                }
                in_scope
            }
        };

        if granted {
            Ok(())
        } else {
            Err(AuthorizationError::Denied {
                role: principal.role.label(),
                operation,
            })
        }
    }
}

/// Authentication failures raised while resolving a principal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("no bearer token provided")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
}

/// External credential verifier / token issuer boundary.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, AuthenticationError>;
}

/// Operator as listed to administrators. Tokens themselves are never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub subject: SubjectId,
    pub role: Role,
    /// Number of bearer tokens that resolve to this subject.
    pub tokens: usize,
}

/// Operator directory behind the credential verifier.
pub trait UserDirectory: Send + Sync {
    /// Every known subject, ordered by subject id.
    fn accounts(&self) -> Vec<UserAccount>;

    /// Drops every token issued to `subject`. Returns the removed account, `None` when the
    /// subject is unknown.
    fn revoke(&self, subject: &SubjectId) -> Option<UserAccount>;
}

/// Verifier backed by a token table seeded from configuration. Revoked tokens stop verifying
/// immediately.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    grants: RwLock<HashMap<String, Principal>>,
}

impl StaticTokenVerifier {
    pub fn new<I>(grants: I) -> Self
    where
        I: IntoIterator<Item = (String, Principal)>,
    {
        Self {
            grants: RwLock::new(grants.into_iter().collect()),
        }
    }

    pub fn with_grant(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.grants
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), principal);
        self
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<Principal, AuthenticationError> {
        self.grants
            .read()
            .expect("token table poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthenticationError::InvalidToken)
    }
}

impl UserDirectory for StaticTokenVerifier {
    fn accounts(&self) -> Vec<UserAccount> {
        let grants = self.grants.read().expect("token table poisoned");
        let mut accounts: BTreeMap<&str, UserAccount> = BTreeMap::new();
        for principal in grants.values() {
            accounts
                .entry(principal.subject.0.as_str())
                .or_insert_with(|| UserAccount {
                    subject: principal.subject.clone(),
                    role: principal.role.clone(),
                    tokens: 0,
                })
                .tokens += 1;
        }
        accounts.into_values().collect()
    }

    fn revoke(&self, subject: &SubjectId) -> Option<UserAccount> {
        let mut grants = self.grants.write().expect("token table poisoned");
        let mut revoked: Option<UserAccount> = None;
        grants.retain(|_, principal| {
            if principal.subject != *subject {
                return true;
            }
            revoked
                .get_or_insert_with(|| UserAccount {
                    subject: principal.subject.clone(),
                    role: principal.role.clone(),
                    tokens: 0,
                })
                .tokens += 1;
            false
        });
        revoked
    }
}

/// Resolves the caller from an `Authorization: Bearer <token>` header.
pub fn authenticate(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
) -> Result<Principal, AuthenticationError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthenticationError::MissingToken)?;
    let token = raw
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthenticationError::MissingToken)?;
    verifier.verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin() -> Principal {
        Principal::new("admin-1", Role::Admin)
    }

    fn manager() -> Principal {
        Principal::new("manager-1", Role::Manager)
    }

    fn district(branch: &str) -> Principal {
        Principal::new(
            "district-1",
            Role::DistrictManager {
                branch: branch.to_string(),
            },
        )
    }

    #[test]
    fn admin_creates_but_never_scores() {
        let policy = AccessPolicy;
        assert!(policy.authorize(&admin(), Operation::CreateCandidate, None));
        assert!(policy.authorize(&admin(), Operation::UpdateCandidate, None));
        assert!(policy.authorize(&admin(), Operation::ManageUsers, None));
        assert!(policy.authorize(&admin(), Operation::ManageJobs, None));
        assert!(policy.authorize(&admin(), Operation::ReadEvaluation, Some("Bole")));
        assert!(!policy.authorize(&admin(), Operation::SetPerformanceScore, None));
        assert!(!policy.authorize(&admin(), Operation::SetDistrictRecommendation, Some("Bole")));
    }

    #[test]
    fn manager_scores_any_candidate() {
        let policy = AccessPolicy;
        assert!(policy.authorize(&manager(), Operation::SetPerformanceScore, Some("Bole")));
        assert!(policy.authorize(&manager(), Operation::SetManagerRecommendation, Some("Adama")));
        assert!(policy.authorize(&manager(), Operation::ReadEvaluation, None));
        assert!(!policy.authorize(&manager(), Operation::SetDistrictRecommendation, None));
        assert!(!policy.authorize(&manager(), Operation::CreateCandidate, None));
        assert!(!policy.authorize(&manager(), Operation::UpdateCandidate, None));
        assert!(!policy.authorize(&manager(), Operation::ManageJobs, None));
    }

    #[test]
    fn district_manager_is_limited_to_own_branch() {
        let policy = AccessPolicy;
        let caller = district("Bole");

        assert!(policy.authorize(&caller, Operation::SetDistrictRecommendation, Some("Bole")));
        assert!(policy.authorize(&caller, Operation::ListCandidates, None));

        match policy.require(&caller, Operation::SetDistrictRecommendation, Some("Adama")) {
            Err(AuthorizationError::BranchMismatch { caller, candidate }) => {
                assert_eq!(caller, "Bole");
                assert_eq!(candidate, "Adama");
            }
            other => panic!("expected branch mismatch, got {other:?}"),
        }
        assert!(!policy.authorize(&caller, Operation::ReadCandidate, Some("Adama")));
        assert!(!policy.authorize(&caller, Operation::SetPerformanceScore, Some("Bole")));
    }

    #[test]
    fn unlisted_operations_are_denied() {
        let policy = AccessPolicy;
        match policy.require(&district("Bole"), Operation::ManageUsers, None) {
            Err(AuthorizationError::Denied { role, operation }) => {
                assert_eq!(role, "district_manager");
                assert_eq!(operation, Operation::ManageUsers);
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn role_parse_requires_branch_for_district_managers() {
        assert_eq!(Role::parse("ADMIN", None), Some(Role::Admin));
        assert_eq!(Role::parse("district_manager", None), None);
        assert_eq!(
            Role::parse("district_manager", Some("Bole")),
            Some(Role::DistrictManager {
                branch: "Bole".to_string()
            })
        );
        assert_eq!(Role::parse("auditor", None), None);
    }

    #[test]
    fn directory_groups_tokens_by_subject_and_revokes_them() {
        let verifier = StaticTokenVerifier::default()
            .with_grant("t-1", admin())
            .with_grant("t-2", admin())
            .with_grant("t-3", district("Bole"));

        let accounts = verifier.accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].subject, SubjectId("admin-1".to_string()));
        assert_eq!(accounts[0].tokens, 2);
        assert_eq!(accounts[1].role.label(), "district_manager");

        let revoked = verifier
            .revoke(&SubjectId("admin-1".to_string()))
            .expect("known subject");
        assert_eq!(revoked.tokens, 2);
        assert_eq!(verifier.verify("t-1"), Err(AuthenticationError::InvalidToken));
        assert_eq!(verifier.verify("t-3"), Ok(district("Bole")));
        assert_eq!(verifier.revoke(&SubjectId("admin-1".to_string())), None);
        assert_eq!(verifier.accounts().len(), 1);
    }

    #[test]
    fn authenticate_reads_bearer_tokens() {
        let verifier = StaticTokenVerifier::default().with_grant("secret", manager());
        let mut headers = HeaderMap::new();
        assert_eq!(
            authenticate(&headers, &verifier),
            Err(AuthenticationError::MissingToken)
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert_eq!(
            authenticate(&headers, &verifier),
            Err(AuthenticationError::InvalidToken)
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        assert_eq!(authenticate(&headers, &verifier), Ok(manager()));
    }
}
