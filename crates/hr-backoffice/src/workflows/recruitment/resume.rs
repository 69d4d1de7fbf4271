use std::path::Path;

use mime::Mime;

use super::domain::ResumeDescriptor;

pub const MAX_RESUME_BYTES: u64 = 2 * 1024 * 1024;
const MAX_STEM_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeError {
    #[error("resume must be a .pdf file, got '{0}'")]
    NotPdf(String),
    #[error("resume content type '{0}' is not accepted")]
    UnsupportedContentType(String),
    #[error("resume is empty")]
    Empty,
    #[error("resume is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

/// Accepts PDFs up to 2 MiB sent as `application/pdf` or `application/octet-stream`.
pub fn validate(resume: &ResumeDescriptor) -> Result<(), ResumeError> {
    let is_pdf = Path::new(&resume.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ResumeError::NotPdf(resume.file_name.clone()));
    }

    let content_type = match resume.content_type.as_deref() {
        Some(raw) => raw
            .parse::<Mime>()
            .map_err(|_| ResumeError::UnsupportedContentType(raw.to_string()))?,
        None => mime_guess::from_path(&resume.file_name).first_or_octet_stream(),
    };
    let accepted = content_type.essence_str() == mime::APPLICATION_PDF.essence_str()
        || content_type.essence_str() == mime::APPLICATION_OCTET_STREAM.essence_str();
    if !accepted {
        return Err(ResumeError::UnsupportedContentType(content_type.to_string()));
    }

    if resume.size_bytes == 0 {
        return Err(ResumeError::Empty);
    }
    if resume.size_bytes > MAX_RESUME_BYTES {
        return Err(ResumeError::TooLarge {
            size: resume.size_bytes,
            limit: MAX_RESUME_BYTES,
        });
    }
    Ok(())
}

/// `First_Last.pdf` restricted to `[A-Za-z0-9_-]`, stem capped at 200 characters.
pub fn safe_file_name(first_name: &str, last_name: &str) -> String {
    let raw = format!("{}_{}", first_name.trim(), last_name.trim());
    let mut stem: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.trim_matches('_').is_empty() {
        stem = "resume".to_string();
    }
    format!("{stem}.pdf")
}
