#![warn(missing_docs)]
//! # form-relay-contract
//!
//! ## Purpose
//! Defines the wire contracts exchanged with transfer destinations and the
//! client-side parsing helpers for them.
//!
//! ## Responsibilities
//! - Parse the stored-file record a direct upload returns on success.
//! - Extract the human-readable message from destination error envelopes.
//! - Model the structured mail-send request for the email strategy.
//!
//! ## Data flow
//! Raw response text from the HTTP transport -> [`parse_stored_file`] or
//! [`extract_rejection_message`] -> transfer report or rejection message.
//! The email strategy builds a [`MailSendRequest`] and serializes it into
//! the request body.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient
//! network buffers.
//!
//! ## Error model
//! Invalid JSON or blank mandatory fields return [`ContractError`].
//!
//! ## Security and privacy notes
//! This crate handles destination payloads only; bearer credentials never
//! pass through it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Stored-file record returned by a successful direct upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileRecord {
    /// Destination-assigned identifier.
    pub id: String,
    /// Display name the destination stored.
    pub name: String,
}

/// Error envelope shape used by the storage REST API.
#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Structured send call for the transactional email API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSendRequest {
    /// Mail service identifier.
    pub service_id: String,
    /// Mail template identifier.
    pub template_id: String,
    /// Public key/credential the API accepts for send calls.
    pub user_id: String,
    /// Named template fields (sender, free text, attachment, recipient).
    #[serde(default)]
    pub template_params: Map<String, Value>,
}

impl MailSendRequest {
    /// Creates a validated send request with empty template parameters.
    ///
    /// # Errors
    /// Returns [`ContractError::InvalidContract`] when any identifier is
    /// blank.
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let request = Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            user_id: user_id.into(),
            template_params: Map::new(),
        };

        for (field, value) in [
            ("service_id", &request.service_id),
            ("template_id", &request.template_id),
            ("user_id", &request.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(ContractError::InvalidContract(format!("{field} is empty")));
            }
        }

        Ok(request)
    }

    /// Sets one named template parameter.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.template_params.insert(name.into(), value.into());
    }

    /// Serializes the request to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`ContractError::Decode`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(ContractError::Decode)
    }
}

/// Parses a successful direct-upload response body.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON and
/// [`ContractError::InvalidContract`] when `id` or `name` is blank.
pub fn parse_stored_file(raw: &str) -> Result<StoredFileRecord, ContractError> {
    let record: StoredFileRecord = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if record.id.trim().is_empty() {
        return Err(ContractError::InvalidContract("id is empty".to_string()));
    }

    if record.name.trim().is_empty() {
        return Err(ContractError::InvalidContract("name is empty".to_string()));
    }

    Ok(record)
}

/// Extracts the destination's message from an error response body.
///
/// Returns `None` when the body is not the known envelope shape, so
/// callers can fall back to a generic rejection message.
pub fn extract_rejection_message(raw: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(raw).ok()?;
    let message = envelope.error.message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

/// Contract parsing errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("contract decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("contract violation: {0}")]
    InvalidContract(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for response parsing and the mail-send model.

    use super::*;

    #[test]
    fn stored_file_parses_id_and_name() {
        let record = parse_stored_file(r#"{"id":"abc123","name":"Tarea1_Juan.pdf"}"#)
            .expect("record should parse");
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "Tarea1_Juan.pdf");
    }

    #[test]
    fn blank_stored_file_fields_violate_contract() {
        let verdict = parse_stored_file(r#"{"id":"","name":"x"}"#);
        assert!(matches!(verdict, Err(ContractError::InvalidContract(_))));
    }

    #[test]
    fn rejection_message_comes_from_error_envelope() {
        let raw = r#"{"error":{"message":"quota exceeded"}}"#;
        assert_eq!(
            extract_rejection_message(raw).as_deref(),
            Some("quota exceeded")
        );
    }

    #[test]
    fn unknown_error_shapes_yield_no_message() {
        assert_eq!(extract_rejection_message("<html>500</html>"), None);
        assert_eq!(extract_rejection_message(r#"{"detail":"nope"}"#), None);
    }

    #[test]
    fn mail_send_request_serializes_identifiers_and_params() {
        let mut request = MailSendRequest::new("service-1", "template-1", "public-1")
            .expect("request should build");
        request.set_param("from_name", "Ana");
        request.set_param("file_size", "1.5 MB");

        let bytes = request.to_json_bytes().expect("request should serialize");
        let text = String::from_utf8(bytes).expect("json is utf-8");
        assert!(text.contains("\"service_id\":\"service-1\""));
        assert!(text.contains("\"from_name\":\"Ana\""));
    }

    #[test]
    fn mail_send_request_rejects_blank_identifiers() {
        assert!(MailSendRequest::new("", "template-1", "public-1").is_err());
    }
}
