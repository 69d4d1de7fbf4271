use chrono::{DateTime, Duration, SecondsFormat, Utc};
use uuid::Uuid;

use super::domain::{ApplicantKind, ApplicationLink, Job, JobId, LinkView};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("invalid application link")]
    Invalid,
    #[error("application link has expired")]
    Expired,
    #[error("application link has already been used")]
    AlreadyUsed,
    #[error("link is for {expected} applicants, submission is {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("a link lifetime of {0} days falls outside the supported calendar")]
    LifetimeOutOfRange(i64),
}

/// Mints a fresh single-use link valid for `ttl_days`.
pub fn mint(
    job_id: JobId,
    kind: ApplicantKind,
    now: DateTime<Utc>,
    ttl_days: i64,
) -> Result<ApplicationLink, LinkError> {
    let expires_at = Duration::try_days(ttl_days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(LinkError::LifetimeOutOfRange(ttl_days))?;
    Ok(ApplicationLink {
        token: Uuid::new_v4().simple().to_string(),
        job_id,
        kind,
        created_at: now,
        expires_at,
        used: false,
    })
}

/// A link is usable until its expiry instant and only once.
pub fn check(link: &ApplicationLink, now: DateTime<Utc>) -> Result<(), LinkError> {
    if now > link.expires_at {
        return Err(LinkError::Expired);
    }
    if link.used {
        return Err(LinkError::AlreadyUsed);
    }
    Ok(())
}

pub fn url(public_base_url: &str, link: &ApplicationLink) -> String {
    format!(
        "{}/apply/{}/{}",
        public_base_url.trim_end_matches('/'),
        link.kind.label(),
        link.token
    )
}

pub fn view(public_base_url: &str, link: &ApplicationLink, job: &Job) -> LinkView {
    LinkView {
        job_id: link.job_id,
        job_title: job.title.clone(),
        kind: link.kind,
        url: url(public_base_url, link),
        expires_at: link.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}
