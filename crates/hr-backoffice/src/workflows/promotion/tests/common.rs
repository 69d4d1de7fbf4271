use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::access::{Principal, Role, StaticTokenVerifier};
use crate::clock::FixedClock;
use crate::workflows::promotion::domain::{
    ApplicantName, Candidate, CandidateDraft, CandidateId, CandidateProfile, ComponentWrite,
};
use crate::workflows::promotion::repository::{CandidateRepository, RepositoryError};
use crate::workflows::promotion::{promotion_router, PromotionService};

pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const MANAGER_TOKEN: &str = "manager-token";
pub(super) const BOLE_TOKEN: &str = "bole-token";
pub(super) const ADAMA_TOKEN: &str = "adama-token";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn admin() -> Principal {
    Principal::new("hr-admin", Role::Admin)
}

pub(super) fn manager() -> Principal {
    Principal::new("line-manager", Role::Manager)
}

pub(super) fn district_manager(branch: &str) -> Principal {
    Principal::new(
        format!("dm-{}", branch.to_ascii_lowercase()),
        Role::DistrictManager {
            branch: branch.to_string(),
        },
    )
}

pub(super) fn draft(file_number: &str, full_name: &str, employed: NaiveDate) -> CandidateDraft {
    CandidateDraft {
        file_number: file_number.to_string(),
        full_name: full_name.to_string(),
        sex: "Female".to_string(),
        branch: "Bole".to_string(),
        district: "Addis Ababa East".to_string(),
        job_grade: "VII".to_string(),
        job_category: "Clerical".to_string(),
        department: Some("Operations".to_string()),
        region: Some("Addis Ababa".to_string()),
        current_position: Some("Senior Teller".to_string()),
        employment_date: Some(employed),
        last_promotion_date: None,
        performance_score: None,
    }
}

pub(super) fn applicant(first_name: &str, last_name: &str) -> ApplicantName {
    ApplicantName {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        file_number: None,
    }
}

pub(super) fn build_service() -> (PromotionService<MemoryCandidates>, Arc<MemoryCandidates>) {
    build_service_on(today())
}

pub(super) fn build_service_on(
    day: NaiveDate,
) -> (PromotionService<MemoryCandidates>, Arc<MemoryCandidates>) {
    let repository = Arc::new(MemoryCandidates::default());
    let service = PromotionService::new(repository.clone(), Arc::new(FixedClock::on(day)));
    (service, repository)
}

pub(super) fn verifier() -> StaticTokenVerifier {
    StaticTokenVerifier::default()
        .with_grant(ADMIN_TOKEN, admin())
        .with_grant(MANAGER_TOKEN, manager())
        .with_grant(BOLE_TOKEN, district_manager("Bole"))
        .with_grant(ADAMA_TOKEN, district_manager("Adama"))
}

pub(super) fn router_with_service(
    service: PromotionService<MemoryCandidates>,
) -> axum::Router {
    promotion_router(Arc::new(service), Arc::new(verifier()))
}

/// Asserts the total equals the sum of present contributions.
pub(super) fn assert_total_consistent(candidate: &Candidate) {
    let scores = &candidate.scores;
    let expected: f64 = [
        scores.performance,
        scores.tenure,
        scores.post_promotion,
        scores.manager_recommendation,
        scores.district_recommendation,
    ]
    .into_iter()
    .map(|value| value.unwrap_or(0.0))
    .sum();
    assert!(
        (scores.total - expected).abs() < 1e-9,
        "total {} diverged from components {expected}",
        scores.total
    );
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[derive(Default)]
pub(super) struct MemoryCandidates {
    rows: Mutex<BTreeMap<CandidateId, Candidate>>,
}

impl MemoryCandidates {
    pub(super) fn snapshot(&self, id: CandidateId) -> Candidate {
        self.rows
            .lock()
            .expect("repository mutex poisoned")
            .get(&id)
            .cloned()
            .expect("candidate stored")
    }
}

impl CandidateRepository for MemoryCandidates {
    fn get(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn find_by_full_name(&self, full_name: &str) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|candidate| candidate.full_name == full_name)
            .cloned()
            .collect())
    }

    fn insert(&self, mut candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.file_number == candidate.file_number)
        {
            return Err(RepositoryError::Conflict);
        }
        let next = guard.keys().next_back().map_or(1, |id| id.0 + 1);
        candidate.id = CandidateId(next);
        guard.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    fn apply_component(
        &self,
        id: CandidateId,
        write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        let candidate = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        candidate.apply(&write);
        Ok(candidate.clone())
    }

    fn update_profile(
        &self,
        id: CandidateId,
        profile: CandidateProfile,
        write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .values()
            .any(|existing| existing.id != id && existing.file_number == profile.file_number)
        {
            return Err(RepositoryError::Conflict);
        }
        let candidate = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        candidate.set_profile(profile);
        candidate.apply(&write);
        Ok(candidate.clone())
    }
}

pub(super) struct UnavailableCandidates;

impl CandidateRepository for UnavailableCandidates {
    fn get(&self, _id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_full_name(&self, _full_name: &str) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _candidate: Candidate) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_component(
        &self,
        _id: CandidateId,
        _write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
    fn update_profile(
        &self,
        _id: CandidateId,
        _profile: CandidateProfile,
        _write: ComponentWrite,
    ) -> Result<Candidate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
