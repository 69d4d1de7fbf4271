use chrono::NaiveDate;

use super::domain::{Job, JobDraft, JobId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobValidationError {
    #[error("job {0} is required")]
    MissingField(&'static str),
    #[error("deadline {deadline} precedes the posting date {created_on}")]
    DeadlineBeforePosting {
        deadline: NaiveDate,
        created_on: NaiveDate,
    },
}

/// Title, description, and department are mandatory.
pub fn validate(draft: &JobDraft) -> Result<(), JobValidationError> {
    for (field, value) in [
        ("title", &draft.title),
        ("description", &draft.description),
        ("department", &draft.department),
    ] {
        if value.trim().is_empty() {
            return Err(JobValidationError::MissingField(field));
        }
    }
    Ok(())
}

/// Builds a posting from a validated draft. New postings default to `open`.
pub fn from_draft(
    id: JobId,
    draft: JobDraft,
    created_on: NaiveDate,
) -> Result<Job, JobValidationError> {
    validate(&draft)?;
    if let Some(deadline) = draft.deadline {
        if deadline < created_on {
            return Err(JobValidationError::DeadlineBeforePosting {
                deadline,
                created_on,
            });
        }
    }

    Ok(Job {
        id,
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        qualifications: draft.qualifications,
        department: draft.department.trim().to_string(),
        location: draft.location,
        job_type: draft.job_type,
        salary: draft.salary,
        created_on,
        deadline: draft.deadline,
        status: draft.status.unwrap_or_default(),
    })
}
