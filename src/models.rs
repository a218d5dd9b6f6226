//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the shared response envelopes and validation helpers used by the API.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

static EXECUTION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    // Execution ids come from pipeline orchestrators: alphanumeric plus . _ : -
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._:-]*$").unwrap()
});

/// Validate a pipeline execution identifier
pub fn validate_execution_id(id: &str) -> Result<(), validator::ValidationError> {
    if !EXECUTION_ID_RE.is_match(id) {
        let mut err = validator::ValidationError::new("invalid_execution_id");
        err.message = Some(
            "Invalid execution id. Must start with a letter or digit and contain only letters, digits, dots, underscores, colons, and hyphens.".into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_execution_ids() {
        assert!(validate_execution_id("exec-123").is_ok());
        assert!(validate_execution_id("run_2024.01.15:42").is_ok());
        assert!(validate_execution_id("a").is_ok());
    }

    #[test]
    fn test_invalid_execution_ids() {
        assert!(validate_execution_id("").is_err());
        assert!(validate_execution_id("-starts-with-dash").is_err());
        assert!(validate_execution_id("has space").is_err());
        assert!(validate_execution_id("slash/not/allowed").is_err());
    }
}
