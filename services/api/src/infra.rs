use chrono::NaiveDate;
use hr_backoffice::workflows::promotion::{
    Candidate, CandidateId, CandidateProfile, CandidateRepository, ComponentWrite, RepositoryError,
};
use hr_backoffice::workflows::recruitment::{
    ApplicationId, ApplicationLink, ApplicationRecord, ApplicationRepository, Job, JobId,
    JobRepository, LinkRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Score store kept in process memory. Component writes run under the table lock, so each write
/// and its total recomputation land together.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCandidateRepository {
    rows: Arc<Mutex<BTreeMap<CandidateId, Candidate>>>,
}

impl CandidateRepository for InMemoryCandidateRepository {
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
        candidate.id = CandidateId(guard.keys().next_back().map_or(1, |id| id.0 + 1));
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

#[derive(Default)]
struct RecruitmentTables {
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    links: HashMap<String, ApplicationLink>,
}

impl RecruitmentTables {
    fn store_application(&mut self, mut record: ApplicationRecord) -> ApplicationRecord {
        record.id = ApplicationId(
            self.applications
                .keys()
                .next_back()
                .map_or(1, |id| id.0 + 1),
        );
        self.applications.insert(record.id, record.clone());
        record
    }
}

/// Jobs, applications, and links behind a single lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecruitmentStore {
    tables: Arc<Mutex<RecruitmentTables>>,
}

impl JobRepository for InMemoryRecruitmentStore {
    fn insert_job(&self, mut job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        job.id = JobId(guard.jobs.keys().next_back().map_or(1, |id| id.0 + 1));
        guard.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.jobs.get(&id).cloned())
    }

    fn jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.jobs.values().cloned().collect())
    }

    fn replace_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        match guard.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_job(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard
            .jobs
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl ApplicationRepository for InMemoryRecruitmentStore {
    fn insert_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.store_application(record))
    }

    fn application(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.applications.get(&id).cloned())
    }

    fn applications_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .applications
            .values()
            .filter(|record| record.job_id == job_id)
            .cloned()
            .collect())
    }

    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.applications.contains_key(&record.id) {
            guard.applications.insert(record.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

impl LinkRepository for InMemoryRecruitmentStore {
    fn insert_link(&self, link: ApplicationLink) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.links.contains_key(&link.token) {
            return Err(RepositoryError::Conflict);
        }
        guard.links.insert(link.token.clone(), link);
        Ok(())
    }

    fn link(&self, token: &str) -> Result<Option<ApplicationLink>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.links.get(token).cloned())
    }

    fn links_for_job(&self, job_id: JobId) -> Result<Vec<ApplicationLink>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        let mut links: Vec<ApplicationLink> = guard
            .links
            .values()
            .filter(|link| link.job_id == job_id)
            .cloned()
            .collect();
        links.sort_by_key(|link| link.created_at);
        Ok(links)
    }

    fn redeem(
        &self,
        token: &str,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        let link = guard.links.get_mut(token).ok_or(RepositoryError::NotFound)?;
        if link.used {
            return Err(RepositoryError::Conflict);
        }
        link.used = true;
        Ok(guard.store_application(record))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
