//! Attachment upload validation
//!
//! Pure checks run before a file is handed to the platform shell for
//! upload. Failures come back as a typed outcome, never an error: the
//! UI maps each kind to its own message.
//!
//! The entry point is async so a future version can stat the file or
//! sniff its content without changing the signature.

use serde::{Deserialize, Serialize};

use crate::model::Attachment;

/// Default upload ceiling: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Executable types rejected unless the caller overrides the block list
pub const DEFAULT_BLOCKED_MIME_TYPES: [&str; 3] = [
    "application/x-executable",
    "application/x-msdos-program",
    "application/x-msdownload",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    FileTooLarge,
    MimeTypeBlocked,
    MimeTypeNotAllowed,
    FileNotFound,
}

/// Upload policy; `None` lists fall back to the defaults above
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size_bytes: Option<u64>,
    /// When present and non-empty, the MIME type must appear here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_mime_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
            details: None,
        }
    }

    fn fail(error: ValidationError, details: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error),
            details: Some(details.into()),
        }
    }
}

fn normalize_mime(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_lowercase()
}

/// Validate an attachment before upload
///
/// `file_size_bytes` is the size reported by the platform shell; `None`
/// means the file could not be found or measured. Zero bytes is a valid
/// size, distinct from missing.
pub async fn validate_for_upload(
    attachment: &Attachment,
    file_size_bytes: Option<u64>,
    config: &ValidationConfig,
) -> ValidationOutcome {
    let max_file_size_bytes = config
        .max_file_size_bytes
        .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES);
    let blocked: Vec<String> = match &config.blocked_mime_types {
        Some(list) => list.iter().map(|m| normalize_mime(Some(m))).collect(),
        None => DEFAULT_BLOCKED_MIME_TYPES
            .iter()
            .map(|m| m.to_string())
            .collect(),
    };

    let Some(size) = file_size_bytes else {
        return ValidationOutcome::fail(ValidationError::FileNotFound, "Missing file size.");
    };

    if size > max_file_size_bytes {
        return ValidationOutcome::fail(
            ValidationError::FileTooLarge,
            format!("Max {} bytes.", max_file_size_bytes),
        );
    }

    let mime_type = normalize_mime(attachment.mime_type.as_deref());
    if !mime_type.is_empty() && blocked.iter().any(|m| *m == mime_type) {
        return ValidationOutcome::fail(ValidationError::MimeTypeBlocked, mime_type);
    }

    if let Some(allowed) = &config.allowed_mime_types {
        if !allowed.is_empty() {
            let allowed: Vec<String> =
                allowed.iter().map(|m| normalize_mime(Some(m))).collect();
            if mime_type.is_empty() || !allowed.iter().any(|m| *m == mime_type) {
                return ValidationOutcome::fail(
                    ValidationError::MimeTypeNotAllowed,
                    if mime_type.is_empty() {
                        "unknown".to_string()
                    } else {
                        mime_type
                    },
                );
            }
        }
    }

    ValidationOutcome::ok()
}
