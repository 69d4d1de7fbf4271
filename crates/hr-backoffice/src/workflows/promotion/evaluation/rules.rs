use chrono::NaiveDate;

use super::super::domain::{CandidateDraft, Sex};

/// Bounds accepted for every raw rating.
pub const MIN_RAW_SCORE: f64 = 0.0;
pub const MAX_RAW_SCORE: f64 = 100.0;

/// Input problems the caller can fix. Nothing is persisted when one is raised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequiredField(&'static str),
    #[error("sex must be Male or Female, got '{0}'")]
    InvalidSex(String),
    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("employment date {0} is in the future")]
    EmploymentDateInFuture(NaiveDate),
    #[error("last promotion date {promoted} precedes employment date {employed}")]
    PromotionBeforeEmployment {
        employed: NaiveDate,
        promoted: NaiveDate,
    },
    #[error("file number '{0}' is already registered")]
    DuplicateFileNumber(String),
    #[error("{0} is set through its scoring endpoint, not the profile")]
    ScoreNotEditable(&'static str),
}

pub(crate) fn validate_raw_score(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (MIN_RAW_SCORE..=MAX_RAW_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}

/// Draft fields after validation, ready to be scored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedDraft {
    pub sex: Sex,
    pub employment_date: NaiveDate,
    pub raw_performance: Option<f64>,
}

pub(crate) fn validate_draft(
    draft: &CandidateDraft,
    today: NaiveDate,
) -> Result<ValidatedDraft, ValidationError> {
    require("file_number", &draft.file_number)?;
    require("full_name", &draft.full_name)?;
    require("branch", &draft.branch)?;

    let sex =
        Sex::parse(&draft.sex).ok_or_else(|| ValidationError::InvalidSex(draft.sex.clone()))?;

    let employment_date = draft
        .employment_date
        .ok_or(ValidationError::MissingRequiredField("employment_date"))?;
    if employment_date > today {
        return Err(ValidationError::EmploymentDateInFuture(employment_date));
    }
    if let Some(promoted) = draft.last_promotion_date {
        if promoted < employment_date {
            return Err(ValidationError::PromotionBeforeEmployment {
                employed: employment_date,
                promoted,
            });
        }
    }

    let raw_performance = draft
        .performance_score
        .map(|score| validate_raw_score("performance_score", score))
        .transpose()?;

    Ok(ValidatedDraft {
        sex,
        employment_date,
        raw_performance,
    })
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingRequiredField(field))
    } else {
        Ok(())
    }
}
