use super::domain::Candidate;

pub const EXPORT_HEADER: [&str; 11] = [
    "ID",
    "File Number",
    "Name",
    "Position",
    "Department",
    "Branch",
    "Grade",
    "District",
    "Manager Rec",
    "District Rec",
    "Total Score",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Flush(String),
    #[error("csv output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Writes candidates in the given order. Unset recommendations are written as 0.
pub fn evaluations_csv(candidates: &[Candidate]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for candidate in candidates {
        let scores = &candidate.scores;
        writer.write_record([
            candidate.id.to_string(),
            candidate.file_number.clone(),
            candidate.full_name.clone(),
            candidate.current_position.clone().unwrap_or_default(),
            candidate.department.clone().unwrap_or_default(),
            candidate.branch.clone(),
            candidate.job_grade.clone(),
            candidate.district.clone(),
            scores.manager_recommendation.unwrap_or(0.0).to_string(),
            scores.district_recommendation.unwrap_or(0.0).to_string(),
            scores.total.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
