#![warn(missing_docs)]
//! # form-relay-encoding
//!
//! ## Purpose
//! Composes wire bodies for the transfer executor: MIME multipart payloads,
//! data URIs, and obfuscated-configuration decoding.
//!
//! ## Responsibilities
//! - Build the two-part metadata+file body for direct uploads.
//! - Build multipart form-data bodies for relay POSTs.
//! - Encode attachments as base64 data URIs for the email strategy.
//! - Decode obfuscated recipient values (char codes, base64).
//!
//! ## Data flow
//! The transfer client passes validated file bytes and metadata into a
//! compose function together with a [`generate_boundary`] token; the
//! returned [`MultipartBody`] is handed to the HTTP transport unchanged.
//!
//! ## Ownership and lifetimes
//! Composed bodies own their byte buffers so the transport layer never
//! borrows from transient file buffers.
//!
//! ## Error model
//! Malformed boundaries, metadata serialization failures, and undecodable
//! obfuscated values return [`EncodingError`]. Decoding never falls back to
//! defaults on failure.
//!
//! ## Security and privacy notes
//! Obfuscated values are exactly that — obfuscated, not protected. Decoding
//! exists for compatibility with manifest formats, not as access control.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use form_relay_core::ObfuscatedValue;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use thiserror::Error;

/// Random suffix length for generated boundary tokens.
const BOUNDARY_SUFFIX_LEN: usize = 24;

/// A composed request body plus the exact `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Full content type, including the boundary parameter.
    pub content_type: String,
    /// Raw body bytes ready for the transport.
    pub bytes: Vec<u8>,
}

/// Metadata part of a direct upload body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadMetadata {
    /// Display name the destination should store.
    pub name: String,
    /// Target container identifiers.
    pub parents: Vec<String>,
    /// Content type of the file part.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Generates a boundary token unique to one request.
pub fn generate_boundary() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(BOUNDARY_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("relay-{suffix}")
}

/// Composes the two-part metadata+file body for a direct upload.
///
/// # Semantics
/// Part one is the JSON metadata; part two carries the file bytes encoded
/// as base64 with an explicit transfer-encoding header. The returned
/// content type is `multipart/related` with the boundary parameter.
///
/// # Errors
/// Returns [`EncodingError::InvalidBoundary`] for unusable boundary tokens
/// and [`EncodingError::Metadata`] when metadata serialization fails.
pub fn compose_upload_body(
    metadata: &UploadMetadata,
    file_bytes: &[u8],
    file_content_type: &str,
    boundary: &str,
) -> Result<MultipartBody, EncodingError> {
    validate_boundary(boundary)?;

    let metadata_json = serde_json::to_string(metadata).map_err(EncodingError::Metadata)?;
    let encoded_file = BASE64.encode(file_bytes);

    let mut body = String::new();
    body.push_str(&format!("--{boundary}\r\n"));
    body.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.push_str(&metadata_json);
    body.push_str("\r\n");
    body.push_str(&format!("--{boundary}\r\n"));
    body.push_str(&format!("Content-Type: {file_content_type}\r\n"));
    body.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    body.push_str(&encoded_file);
    body.push_str("\r\n");
    body.push_str(&format!("--{boundary}--\r\n"));

    Ok(MultipartBody {
        content_type: format!("multipart/related; boundary={boundary}"),
        bytes: body.into_bytes(),
    })
}

/// Composes a multipart form-data body for the relay POST strategy.
///
/// # Semantics
/// Text fields come first in declaration order, then one file part named
/// `file` carrying the raw bytes. The returned content type is
/// `multipart/form-data` with the boundary parameter.
///
/// # Errors
/// Returns [`EncodingError::InvalidBoundary`] for unusable boundary tokens.
pub fn compose_form_body(
    fields: &[(String, String)],
    file_name: &str,
    file_content_type: &str,
    file_bytes: &[u8],
    boundary: &str,
) -> Result<MultipartBody, EncodingError> {
    validate_boundary(boundary)?;

    let mut bytes = Vec::new();
    for (name, value) in fields {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }

    bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    bytes.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    bytes.extend_from_slice(format!("Content-Type: {file_content_type}\r\n\r\n").as_bytes());
    bytes.extend_from_slice(file_bytes);
    bytes.extend_from_slice(b"\r\n");
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok(MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes,
    })
}

/// Encodes file bytes as a base64 data URI for structured payloads.
pub fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64.encode(bytes))
}

/// Decodes an obfuscated configuration value into plain text.
///
/// # Errors
/// Returns [`EncodingError::CharCode`] for invalid scalar values,
/// [`EncodingError::Base64`] for malformed base64, and
/// [`EncodingError::Utf8`] when decoded bytes are not UTF-8. There is no
/// fallback value on failure.
pub fn decode_obfuscated(value: &ObfuscatedValue) -> Result<String, EncodingError> {
    match value {
        ObfuscatedValue::CharCodes(codes) => codes
            .iter()
            .map(|&code| char::from_u32(code).ok_or(EncodingError::CharCode(code)))
            .collect(),
        ObfuscatedValue::Base64(encoded) => {
            let bytes = BASE64.decode(encoded.trim())?;
            String::from_utf8(bytes).map_err(EncodingError::Utf8)
        }
    }
}

fn validate_boundary(boundary: &str) -> Result<(), EncodingError> {
    let usable = !boundary.is_empty()
        && boundary.len() <= 70
        && boundary
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '-');

    if usable {
        Ok(())
    } else {
        Err(EncodingError::InvalidBoundary(boundary.to_string()))
    }
}

/// Error type for body composition and obfuscation decoding.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Boundary token is empty, too long, or carries invalid characters.
    #[error("invalid multipart boundary: '{0}'")]
    InvalidBoundary(String),
    /// Metadata part could not be serialized.
    #[error("metadata encode failure: {0}")]
    Metadata(serde_json::Error),
    /// Character code has no Unicode scalar value.
    #[error("invalid character code: {0}")]
    CharCode(u32),
    /// Base64 payload is malformed.
    #[error("base64 decode failure: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decoded bytes are not valid UTF-8.
    #[error("decoded value is not utf-8: {0}")]
    Utf8(std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for body composition and obfuscation decoding.

    use super::*;

    #[test]
    fn upload_body_contains_both_parts_and_terminator() {
        let metadata = UploadMetadata {
            name: "Tarea1_Juan.pdf".to_string(),
            parents: vec!["folder-901".to_string()],
            mime_type: "application/pdf".to_string(),
        };

        let body = compose_upload_body(&metadata, b"%PDF-1.4", "application/pdf", "relay-abc")
            .expect("body should compose");

        let text = String::from_utf8(body.bytes).expect("body is ascii");
        assert!(body.content_type.ends_with("boundary=relay-abc"));
        assert!(text.contains("\"name\":\"Tarea1_Juan.pdf\""));
        assert!(text.contains("\"parents\":[\"folder-901\"]"));
        assert!(text.contains("Content-Transfer-Encoding: base64"));
        assert!(text.ends_with("--relay-abc--\r\n"));
    }

    #[test]
    fn form_body_places_fields_before_file_part() {
        let fields = vec![("sender".to_string(), "Ana".to_string())];
        let body = compose_form_body(&fields, "notes.txt", "text/plain", b"hello", "relay-xyz")
            .expect("body should compose");

        let text = String::from_utf8(body.bytes).expect("body is ascii");
        let field_at = text.find("name=\"sender\"").expect("field part present");
        let file_at = text.find("filename=\"notes.txt\"").expect("file part present");
        assert!(field_at < file_at);
    }

    #[test]
    fn generated_boundaries_are_usable_and_distinct() {
        let first = generate_boundary();
        let second = generate_boundary();
        assert_ne!(first, second);
        validate_boundary(&first).expect("generated boundary should validate");
    }

    #[test]
    fn data_uri_wraps_base64_payload() {
        let uri = encode_data_uri("text/plain", b"hi");
        assert_eq!(uri, "data:text/plain;base64,aGk=");
    }

    #[test]
    fn char_code_recipient_round_trips() {
        let value = ObfuscatedValue::CharCodes("docente@example.edu".chars().map(u32::from).collect());
        let decoded = decode_obfuscated(&value).expect("codes should decode");
        assert_eq!(decoded, "docente@example.edu");
    }

    #[test]
    fn base64_recipient_round_trips() {
        let value = ObfuscatedValue::Base64(BASE64.encode("docente@example.edu"));
        let decoded = decode_obfuscated(&value).expect("base64 should decode");
        assert_eq!(decoded, "docente@example.edu");
    }

    #[test]
    fn malformed_obfuscation_hard_fails() {
        assert!(decode_obfuscated(&ObfuscatedValue::CharCodes(vec![0xD800])).is_err());
        assert!(decode_obfuscated(&ObfuscatedValue::Base64("!!!".to_string())).is_err());
    }
}
