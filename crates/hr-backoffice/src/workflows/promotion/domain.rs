use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the score store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub u64);

impl CandidateId {
    /// Placeholder carried by records that have not been inserted yet; the store assigns ids.
    pub const UNASSIGNED: Self = CandidateId(0);
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Male" => Some(Sex::Male),
            "Female" => Some(Sex::Female),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Whole calendar years of service, derived from the tenure dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub total_years: u32,
    /// Years since the last promotion; absent for employees never promoted.
    pub related_years: Option<u32>,
}

impl Experience {
    pub fn as_of(
        employment_date: NaiveDate,
        last_promotion_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        Self {
            total_years: calendar_years_between(employment_date, today),
            related_years: last_promotion_date.map(|date| calendar_years_between(date, today)),
        }
    }
}

/// Calendar-year difference, floored at zero.
pub fn calendar_years_between(from: NaiveDate, to: NaiveDate) -> u32 {
    u32::try_from(to.year() - from.year()).unwrap_or(0)
}

/// Per-component contributions. Each component stays `None` until it has been computed or
/// submitted, so "unset" and "explicitly zero" remain distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Raw individual performance (PMS) score on the 0-100 scale.
    pub raw_performance: Option<f64>,
    pub performance: Option<f64>,
    pub tenure: Option<f64>,
    pub post_promotion: Option<f64>,
    pub manager_recommendation: Option<f64>,
    pub district_recommendation: Option<f64>,
    pub total: f64,
}

impl ScoreComponents {
    /// Sum of the five weighted contributions with unset components counted as zero.
    pub fn sum_contributions(&self) -> f64 {
        [
            self.performance,
            self.tenure,
            self.post_promotion,
            self.manager_recommendation,
            self.district_recommendation,
        ]
        .into_iter()
        .flatten()
        .sum()
    }

    pub fn refresh_total(&mut self) -> f64 {
        self.total = self.sum_contributions();
        self.total
    }

    /// Applies a single component write and re-derives the total in the same step.
    pub fn apply(&mut self, write: &ComponentWrite) -> f64 {
        match *write {
            ComponentWrite::Performance { raw, contribution } => {
                self.raw_performance = Some(raw);
                self.performance = Some(contribution);
            }
            ComponentWrite::ManagerRecommendation { contribution } => {
                self.manager_recommendation = Some(contribution);
            }
            ComponentWrite::DistrictRecommendation { contribution } => {
                self.district_recommendation = Some(contribution);
            }
            ComponentWrite::Tenure {
                tenure,
                post_promotion,
                ..
            } => {
                self.tenure = Some(tenure);
                self.post_promotion = Some(post_promotion);
            }
            ComponentWrite::Reset {
                tenure,
                post_promotion,
                ..
            } => {
                *self = ScoreComponents {
                    tenure: Some(tenure),
                    post_promotion: Some(post_promotion),
                    ..ScoreComponents::default()
                };
            }
        }
        self.refresh_total()
    }
}

/// A single write to a candidate's components. The store applies it together with the total
/// recomputation so concurrent writers to different components never clobber each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum ComponentWrite {
    Performance { raw: f64, contribution: f64 },
    ManagerRecommendation { contribution: f64 },
    DistrictRecommendation { contribution: f64 },
    /// Re-derived tenure components after a profile edit; ratings already given are kept.
    Tenure {
        experience: Experience,
        tenure: f64,
        post_promotion: f64,
    },
    /// Starts a fresh evaluation cycle: every component cleared, tenure-derived ones re-seeded
    /// from experience measured as of the reset.
    Reset {
        experience: Experience,
        tenure: f64,
        post_promotion: f64,
    },
}

/// Employee scored for promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub file_number: String,
    pub full_name: String,
    pub sex: Sex,
    pub branch: String,
    pub district: String,
    pub job_grade: String,
    pub job_category: String,
    pub department: Option<String>,
    pub region: Option<String>,
    pub current_position: Option<String>,
    pub employment_date: NaiveDate,
    pub last_promotion_date: Option<NaiveDate>,
    pub experience: Experience,
    pub scores: ScoreComponents,
}

impl Candidate {
    /// Applies a component write, returning the recomputed total.
    pub fn apply(&mut self, write: &ComponentWrite) -> f64 {
        match write {
            ComponentWrite::Reset { experience, .. }
            | ComponentWrite::Tenure { experience, .. } => self.experience = *experience,
            _ => {}
        }
        self.scores.apply(write)
    }

    /// Replaces the administrative fields. Scores are untouched.
    pub fn set_profile(&mut self, profile: CandidateProfile) {
        let CandidateProfile {
            file_number,
            full_name,
            sex,
            branch,
            district,
            job_grade,
            job_category,
            department,
            region,
            current_position,
            employment_date,
            last_promotion_date,
        } = profile;
        self.file_number = file_number;
        self.full_name = full_name;
        self.sex = sex;
        self.branch = branch;
        self.district = district;
        self.job_grade = job_grade;
        self.job_category = job_category;
        self.department = department;
        self.region = region;
        self.current_position = current_position;
        self.employment_date = employment_date;
        self.last_promotion_date = last_promotion_date;
    }

    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            file_number: self.file_number.clone(),
            full_name: self.full_name.clone(),
            branch: self.branch.clone(),
            district: self.district.clone(),
            job_grade: self.job_grade.clone(),
        }
    }

    pub fn breakdown(&self) -> EvaluationBreakdown {
        EvaluationBreakdown::from(self)
    }
}

/// Administrative fields an admin may edit after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub file_number: String,
    pub full_name: String,
    pub sex: Sex,
    pub branch: String,
    pub district: String,
    pub job_grade: String,
    pub job_category: String,
    pub department: Option<String>,
    pub region: Option<String>,
    pub current_position: Option<String>,
    pub employment_date: NaiveDate,
    pub last_promotion_date: Option<NaiveDate>,
}

/// Limited view handed to district managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: CandidateId,
    pub file_number: String,
    pub full_name: String,
    pub branch: String,
    pub district: String,
    pub job_grade: String,
}

/// Input accepted by `create_candidate` and `update_candidate`. Fields are loosely typed so
/// validation can name exactly what is wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDraft {
    pub file_number: String,
    pub full_name: String,
    pub sex: String,
    pub branch: String,
    pub district: String,
    pub job_grade: String,
    pub job_category: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub employment_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_promotion_date: Option<NaiveDate>,
    /// Raw 0-100 performance score known at hiring/import time.
    #[serde(default)]
    pub performance_score: Option<f64>,
}

/// Every component with unset values reported as zero, plus the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBreakdown {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub branch: String,
    pub raw_performance_score: f64,
    pub performance_contribution: f64,
    pub tenure_contribution: f64,
    pub post_promotion_contribution: f64,
    pub manager_contribution: f64,
    pub district_contribution: f64,
    pub total: f64,
    pub total_tenure_years: u32,
    pub related_tenure_years: Option<u32>,
}

impl From<&Candidate> for EvaluationBreakdown {
    fn from(candidate: &Candidate) -> Self {
        let scores = &candidate.scores;
        Self {
            candidate_id: candidate.id,
            full_name: candidate.full_name.clone(),
            branch: candidate.branch.clone(),
            raw_performance_score: scores.raw_performance.unwrap_or(0.0),
            performance_contribution: scores.performance.unwrap_or(0.0),
            tenure_contribution: scores.tenure.unwrap_or(0.0),
            post_promotion_contribution: scores.post_promotion.unwrap_or(0.0),
            manager_contribution: scores.manager_recommendation.unwrap_or(0.0),
            district_contribution: scores.district_recommendation.unwrap_or(0.0),
            total: scores.total,
            total_tenure_years: candidate.experience.total_years,
            related_tenure_years: candidate.experience.related_years,
        }
    }
}

/// Name (and optional file number) an application is matched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantName {
    pub first_name: String,
    pub last_name: String,
    /// Secondary key used to disambiguate candidates sharing a full name.
    #[serde(default)]
    pub file_number: Option<String>,
}

impl ApplicantName {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}
