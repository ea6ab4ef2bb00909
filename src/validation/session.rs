use garde::Validate;

use crate::error::{AppError, Result};
use crate::models::session::ClassSession;

/// Validates that every required session field is present.
///
/// Whitespace-only values count as missing.
///
/// # Arguments
///
/// * `session` - The decoded session.
///
/// # Returns
///
/// A `Result<()>` that is `AppError::MissingParameter` naming the offending
/// fields when validation fails.
pub fn validate_session(session: &ClassSession) -> Result<()> {
    let mut missing: Vec<String> = Vec::new();

    if let Err(report) = session.validate() {
        missing.extend(report.iter().map(|(path, _)| path.to_string()));
    }

    for (name, value) in [
        ("class_name", &session.class_name),
        ("teacher_name", &session.teacher_name),
        ("thumbnail_url", &session.thumbnail_url),
        ("class_media_url", &session.class_media_url),
        ("slides_url", &session.slides_url),
        ("live_at_time", &session.live_at_time),
    ] {
        if !value.is_empty() && value.trim().is_empty() {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() {
        return Ok(());
    }

    Err(AppError::MissingParameter(missing.join(", ")))
}
