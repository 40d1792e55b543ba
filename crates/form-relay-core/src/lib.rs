#![warn(missing_docs)]
//! # form-relay-core
//!
//! ## Purpose
//! Defines the pure data model used across the `form-relay` workspace.
//!
//! ## Responsibilities
//! - Represent selected files, submission configuration, and destinations.
//! - Detect placeholder configuration values left over from scaffolding.
//! - Decide whether a selected file is acceptable before any network work.
//!
//! ## Data flow
//! The host page scan resolves one [`SubmissionConfig`] per form into a
//! [`FormBinding`]. On submit, the controller runs [`validate_selection`]
//! over the current [`SelectedFile`] before authorization or transfer.
//!
//! ## Ownership and lifetimes
//! Configuration and file metadata are owned values; bindings are created
//! once at scan time and never mutated afterwards.
//!
//! ## Error model
//! Construction failures return [`CoreError`]; validation verdicts return
//! [`ValidationError`] whose `Display` text is the user-facing message.
//!
//! ## Security and privacy notes
//! This crate never holds file bytes or credentials, only identifiers and
//! metadata. Obfuscated configuration values are carried opaquely; decoding
//! them is documented as obfuscation, not access control.
//!
//! ## Example
//! ```rust
//! use form_relay_core::validate_file_name;
//!
//! assert!(validate_file_name("Homework1_Ana.pdf", Some("Homework1_")).is_ok());
//! assert!(validate_file_name("Other.pdf", Some("Homework1_")).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Markers that identify configuration values still holding scaffold text.
pub const PLACEHOLDER_MARKERS: [&str; 2] = ["REPLACE_WITH", "YOUR_"];

/// Default direct-upload endpoint for the cloud storage REST API.
pub const DEFAULT_DRIVE_UPLOAD_ENDPOINT: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,name";

/// Default send endpoint for the transactional email API.
pub const DEFAULT_MAIL_SEND_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Metadata snapshot of the file chosen in the host page's file input.
///
/// File bytes are not held here; they are read through the host file store
/// only when a transfer is actually attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    /// File name as reported by the file input.
    pub name: String,
    /// Byte size as reported by the file input.
    pub size_bytes: u64,
    /// MIME content type; blank values fall back to octet-stream.
    pub content_type: String,
}

impl SelectedFile {
    /// Constructs a validated selection snapshot.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFileName`] when `name` is blank.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        content_type: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::EmptyFileName);
        }

        let content_type = content_type.into();
        let content_type = if content_type.trim().is_empty() {
            "application/octet-stream".to_string()
        } else {
            content_type
        };

        Ok(Self {
            name,
            size_bytes,
            content_type,
        })
    }
}

/// Configuration value obfuscated at rest in the page manifest.
///
/// Obfuscation only; decoding lives in `form-relay-encoding` and hard-fails
/// on malformed input instead of falling back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObfuscatedValue {
    /// Unicode scalar values, one per character.
    CharCodes(Vec<u32>),
    /// Standard base64 of the UTF-8 text.
    Base64(String),
}

/// Destination-specific configuration, selected by the form's attributes.
///
/// Exactly one transfer strategy per form; strategies are never mixed
/// within one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Direct multipart upload into a cloud storage folder.
    Drive {
        /// Target folder identifier.
        folder_id: String,
        /// OAuth client identifier for the identity provider.
        client_id: String,
        /// API key for the provider's discovery/init step.
        api_key: String,
        /// Upload endpoint; defaults to the public REST endpoint.
        #[serde(default = "default_drive_upload_endpoint")]
        upload_endpoint: String,
    },
    /// Opaque multipart POST to a caller-configured endpoint.
    Relay {
        /// Destination endpoint URL.
        endpoint: String,
    },
    /// Structured send call to a transactional email API.
    Email {
        /// Send endpoint; defaults to the public mail API endpoint.
        #[serde(default = "default_mail_send_endpoint")]
        endpoint: String,
        /// Mail service identifier.
        service_id: String,
        /// Mail template identifier.
        template_id: String,
        /// Public key/credential for the send call.
        public_key: String,
        /// Optional obfuscated recipient override.
        #[serde(default)]
        recipient_override: Option<ObfuscatedValue>,
    },
}

fn default_drive_upload_endpoint() -> String {
    DEFAULT_DRIVE_UPLOAD_ENDPOINT.to_string()
}

fn default_mail_send_endpoint() -> String {
    DEFAULT_MAIL_SEND_ENDPOINT.to_string()
}

impl DestinationConfig {
    /// Returns `true` when the strategy needs an interactive bearer credential.
    pub fn requires_authorization(&self) -> bool {
        matches!(self, Self::Drive { .. })
    }

    /// Returns the first identifier field still holding placeholder text.
    pub fn first_placeholder_field(&self) -> Option<&'static str> {
        match self {
            Self::Drive {
                folder_id,
                client_id,
                api_key,
                upload_endpoint,
            } => [
                ("folder_id", folder_id),
                ("client_id", client_id),
                ("api_key", api_key),
                ("upload_endpoint", upload_endpoint),
            ]
            .into_iter()
            .find(|(_, value)| is_placeholder_value(value))
            .map(|(field, _)| field),
            Self::Relay { endpoint } => {
                is_placeholder_value(endpoint).then_some("endpoint")
            }
            Self::Email {
                endpoint,
                service_id,
                template_id,
                public_key,
                recipient_override: _,
            } => [
                ("endpoint", endpoint),
                ("service_id", service_id),
                ("template_id", template_id),
                ("public_key", public_key),
            ]
            .into_iter()
            .find(|(_, value)| is_placeholder_value(value))
            .map(|(field, _)| field),
        }
    }

    /// Validates that no required identifier is blank or placeholder text.
    ///
    /// # Errors
    /// Returns [`CoreError::PlaceholderConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.first_placeholder_field() {
            Some(field) => Err(CoreError::PlaceholderConfig {
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Declarative options resolved once from one form's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Stable form identifier from the host page.
    pub form_id: String,
    /// Required filename prefix; `None` or empty skips the name rules.
    #[serde(default)]
    pub required_prefix: Option<String>,
    /// Maximum accepted byte size; `None` skips the size rule.
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
    /// Destination and strategy selection.
    pub destination: DestinationConfig,
}

impl SubmissionConfig {
    /// Validates form identity and destination identifiers.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFormId`] for a blank form id and propagates
    /// destination placeholder failures.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.form_id.trim().is_empty() {
            return Err(CoreError::EmptyFormId);
        }
        self.destination.validate()
    }

    /// Serializes the configuration to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Decode`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Decode)
    }

    /// Deserializes a configuration from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Decode`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Decode)
    }
}

/// Immutable pairing of a form element with its resolved configuration.
///
/// Created during the page-load scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    /// Form identifier used to address status/submit elements.
    pub form_id: String,
    /// Resolved submission configuration.
    pub config: SubmissionConfig,
}

impl FormBinding {
    /// Creates a binding from a resolved configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFormId`] when the config carries no id.
    pub fn new(config: SubmissionConfig) -> Result<Self, CoreError> {
        if config.form_id.trim().is_empty() {
            return Err(CoreError::EmptyFormId);
        }

        Ok(Self {
            form_id: config.form_id.clone(),
            config,
        })
    }
}

/// Returns `true` when a configuration value is blank or scaffold text.
pub fn is_placeholder_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_MARKERS
            .iter()
            .any(|marker| trimmed.contains(marker))
}

/// Validation verdict for a selected file.
///
/// The `Display` text of each variant is the user-facing message surfaced
/// by the status presenter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Submit fired with no file selected.
    #[error("select a file before submitting")]
    NoFileSelected,
    /// File name does not start with the required prefix.
    #[error("file name must start with \"{required}\"")]
    InvalidPrefix {
        /// Prefix the form requires.
        required: String,
    },
    /// Nothing remains after stripping the prefix and extension.
    #[error("file name has nothing after \"{required}\"")]
    EmptyLocalPart {
        /// Prefix the form requires.
        required: String,
    },
    /// The stripped remainder contains whitespace.
    #[error("file name must not contain spaces after \"{required}\"")]
    WhitespaceInName {
        /// Prefix the form requires.
        required: String,
    },
    /// File exceeds the configured size ceiling.
    ///
    /// The status presenter renders this with megabyte formatting; this
    /// `Display` form carries the raw byte counts.
    #[error("file size {size_bytes} exceeds the {limit_bytes} byte limit")]
    TooLarge {
        /// Actual byte size of the selection.
        size_bytes: u64,
        /// Configured maximum byte size.
        limit_bytes: u64,
    },
}

/// Validates a file name against the form's required prefix.
///
/// # Semantics
/// The prefix comparison is case-insensitive. The remainder is the name
/// with the prefix and the extension (final `.` suffix) stripped; it must
/// be non-empty and whitespace-free. An absent or empty prefix skips all
/// three name rules, since they are defined relative to the prefix.
///
/// # Errors
/// Returns [`ValidationError::InvalidPrefix`], [`ValidationError::EmptyLocalPart`],
/// or [`ValidationError::WhitespaceInName`] per the rules above.
pub fn validate_file_name(
    name: &str,
    required_prefix: Option<&str>,
) -> Result<(), ValidationError> {
    let Some(prefix) = required_prefix.filter(|prefix| !prefix.trim().is_empty()) else {
        return Ok(());
    };

    let lower_name = name.to_lowercase();
    let lower_prefix = prefix.to_lowercase();
    if !lower_name.starts_with(&lower_prefix) {
        return Err(ValidationError::InvalidPrefix {
            required: prefix.to_string(),
        });
    }

    // starts_with guarantees the slice boundary is valid on the lowercase form.
    let remainder = &lower_name[lower_prefix.len()..];
    let local_part = remainder
        .rsplit_once('.')
        .map(|(stem, _extension)| stem)
        .unwrap_or(remainder);

    if local_part.is_empty() {
        return Err(ValidationError::EmptyLocalPart {
            required: prefix.to_string(),
        });
    }

    if local_part.chars().any(char::is_whitespace) {
        return Err(ValidationError::WhitespaceInName {
            required: prefix.to_string(),
        });
    }

    Ok(())
}

/// Validates a byte size against the form's optional ceiling.
///
/// # Errors
/// Returns [`ValidationError::TooLarge`] when `size_bytes` exceeds the
/// configured limit. An absent limit skips the check.
pub fn validate_size(size_bytes: u64, max_size_bytes: Option<u64>) -> Result<(), ValidationError> {
    match max_size_bytes {
        Some(limit_bytes) if size_bytes > limit_bytes => Err(ValidationError::TooLarge {
            size_bytes,
            limit_bytes,
        }),
        _ => Ok(()),
    }
}

/// Full pre-network validation for one submit attempt.
///
/// # Errors
/// Returns [`ValidationError::NoFileSelected`] when `file` is `None`, then
/// applies the name and size rules from the form configuration.
pub fn validate_selection(
    file: Option<&SelectedFile>,
    config: &SubmissionConfig,
) -> Result<(), ValidationError> {
    let file = file.ok_or(ValidationError::NoFileSelected)?;
    validate_file_name(&file.name, config.required_prefix.as_deref())?;
    validate_size(file.size_bytes, config.max_size_bytes)
}

/// Formats a byte count as a short megabyte string ("15 MB", "1.5 MB").
pub fn human_megabytes(bytes: u64) -> String {
    if bytes % 1_000_000 == 0 {
        format!("{} MB", bytes / 1_000_000)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    }
}

/// Error type for core model construction and configuration checks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Selected file name cannot be blank.
    #[error("file name is empty")]
    EmptyFileName,
    /// Form identifier cannot be blank.
    #[error("form id is empty")]
    EmptyFormId,
    /// A required identifier still holds scaffold placeholder text.
    #[error("configuration field '{field}' is missing or placeholder text")]
    PlaceholderConfig {
        /// Name of the offending configuration field.
        field: String,
    },
    /// Configuration JSON decoding error.
    #[error("configuration decode failure: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for placeholder detection and the validator rules.

    use super::*;

    fn drive_config(prefix: Option<&str>, limit: Option<u64>) -> SubmissionConfig {
        SubmissionConfig {
            form_id: "activities".to_string(),
            required_prefix: prefix.map(str::to_string),
            max_size_bytes: limit,
            destination: DestinationConfig::Drive {
                folder_id: "folder-123".to_string(),
                client_id: "client-123".to_string(),
                api_key: "key-123".to_string(),
                upload_endpoint: DEFAULT_DRIVE_UPLOAD_ENDPOINT.to_string(),
            },
        }
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        validate_file_name("homework1_ana.pdf", Some("Homework1_")).expect("name should pass");
    }

    #[test]
    fn prefix_alone_fails_with_empty_local_part() {
        let verdict = validate_file_name("Homework1.pdf", Some("Homework1"));
        assert!(matches!(
            verdict,
            Err(ValidationError::EmptyLocalPart { .. })
        ));
    }

    #[test]
    fn whitespace_in_remainder_is_rejected() {
        let verdict = validate_file_name("homework1_ana perez.docx", Some("Homework1_"));
        assert!(matches!(
            verdict,
            Err(ValidationError::WhitespaceInName { .. })
        ));
    }

    #[test]
    fn empty_prefix_skips_name_rules() {
        validate_file_name("any name at all.pdf", None).expect("no prefix, no rules");
        validate_file_name("any name at all.pdf", Some("")).expect("blank prefix, no rules");
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        validate_size(15_000_000, Some(15_000_000)).expect("at the limit is allowed");
        let verdict = validate_size(20_000_000, Some(15_000_000));
        assert!(matches!(
            verdict,
            Err(ValidationError::TooLarge {
                size_bytes: 20_000_000,
                limit_bytes: 15_000_000,
            })
        ));
    }

    #[test]
    fn megabyte_formatting_trims_whole_values() {
        assert_eq!(human_megabytes(15_000_000), "15 MB");
        assert_eq!(human_megabytes(1_500_000), "1.5 MB");
    }

    #[test]
    fn selection_requires_a_file() {
        let config = drive_config(None, None);
        assert!(matches!(
            validate_selection(None, &config),
            Err(ValidationError::NoFileSelected)
        ));
    }

    #[test]
    fn placeholder_markers_are_detected() {
        assert!(is_placeholder_value(""));
        assert!(is_placeholder_value("  "));
        assert!(is_placeholder_value("REPLACE_WITH_CLIENT_ID"));
        assert!(is_placeholder_value("YOUR_API_KEY_HERE"));
        assert!(!is_placeholder_value("client-872"));
    }

    #[test]
    fn drive_destination_reports_first_placeholder_field() {
        let destination = DestinationConfig::Drive {
            folder_id: "folder-123".to_string(),
            client_id: "REPLACE_WITH_CLIENT_ID".to_string(),
            api_key: "key-123".to_string(),
            upload_endpoint: DEFAULT_DRIVE_UPLOAD_ENDPOINT.to_string(),
        };
        assert_eq!(destination.first_placeholder_field(), Some("client_id"));
    }

    #[test]
    fn blank_content_type_falls_back_to_octet_stream() {
        let file = SelectedFile::new("report.bin", 10, "").expect("file should build");
        assert_eq!(file.content_type, "application/octet-stream");
    }
}
