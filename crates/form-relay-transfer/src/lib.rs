#![warn(missing_docs)]
//! # form-relay-transfer
//!
//! ## Purpose
//! Moves one validated file (plus accompanying text fields) to the
//! configured destination using exactly one of three transfer strategies.
//!
//! ## Responsibilities
//! - Validate destination endpoints (HTTPS, no placeholder text) at
//!   construction time.
//! - Build the strategy-specific request: direct multipart upload, opaque
//!   multipart relay POST, or structured mail-send call.
//! - Execute through an injectable transport and map responses into a
//!   success report or a rejection carrying the destination's message.
//!
//! ## Data flow
//! Controller hands validated file metadata + bytes to
//! [`TransferClient::transfer`] -> request composition via
//! `form-relay-encoding`/`form-relay-contract` -> [`TransferTransport`]
//! executes -> [`TransferReport`] or [`TransferError`].
//!
//! ## Ownership and lifetimes
//! Requests own their body buffers; nothing borrows from the transport
//! after `execute` returns.
//!
//! ## Error model
//! [`TransferError`] distinguishes rejections (destination answered with a
//! non-success status) from network failures (request never completed);
//! [`classify_transfer_error`] separates retryable failures from fatal
//! configuration-shaped ones.
//!
//! ## Security and privacy notes
//! Bearer tokens pass through the `Authorization` header only and are
//! never included in error text or reports.

use std::sync::Arc;

use form_relay_contract::{
    ContractError, MailSendRequest, extract_rejection_message, parse_stored_file,
};
use form_relay_core::{CoreError, DestinationConfig, SelectedFile, human_megabytes};
use form_relay_encoding::{
    EncodingError, UploadMetadata, compose_form_body, compose_upload_body, decode_obfuscated,
    encode_data_uri, generate_boundary,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// One HTTP request prepared by the transfer client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Destination endpoint URL.
    pub endpoint: String,
    /// Exact `Content-Type` header value.
    pub content_type: String,
    /// Optional `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// Response surface the strategies need: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl TransferResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport executing one prepared request.
///
/// Implementations return `Ok` for any completed HTTP exchange, including
/// error statuses; `Err` is reserved for requests that never completed.
pub trait TransferTransport: Send + Sync {
    /// Executes one request to completion.
    ///
    /// # Errors
    /// Returns [`TransferError::Network`] when the request could not be
    /// completed.
    fn execute(&self, request: &TransferRequest) -> Result<TransferResponse, TransferError>;
}

/// Real transport over a blocking HTTP client.
///
/// No client timeout is configured; in-flight transfers run to completion
/// or to transport failure.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds the blocking client.
    ///
    /// # Errors
    /// Returns [`TransferError::Network`] when client construction fails.
    pub fn new() -> Result<Self, TransferError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|error| TransferError::Network(format!("client build failure: {error}")))?;

        Ok(Self { client })
    }
}

impl TransferTransport for HttpTransport {
    fn execute(&self, request: &TransferRequest) -> Result<TransferResponse, TransferError> {
        let mut builder = self
            .client
            .post(&request.endpoint)
            .header(reqwest::header::CONTENT_TYPE, &request.content_type)
            .body(request.body.clone());

        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let response = builder
            .send()
            .map_err(|error| TransferError::Network(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| TransferError::Network(error.to_string()))?;

        Ok(TransferResponse { status, body })
    }
}

/// Success descriptor for one completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Name the destination stored or displayed.
    pub stored_name: String,
    /// Destination-assigned identifier, when the destination returns one.
    pub stored_id: Option<String>,
    /// SHA-256 hex fingerprint of the transferred file bytes.
    pub content_fingerprint: String,
}

/// Coarse failure classification driving the submit-control re-enable rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The user may retry by resubmitting or re-selecting a file.
    Retryable,
    /// Operator intervention is required; retrying cannot help.
    Fatal,
}

/// Classifies one transfer failure for the controller.
pub fn classify_transfer_error(error: &TransferError) -> FailureClass {
    match error {
        TransferError::ConfigMissing { .. }
        | TransferError::Endpoint(_)
        | TransferError::MissingCredential
        | TransferError::Encoding(_) => FailureClass::Fatal,
        TransferError::Rejected { .. }
        | TransferError::Network(_)
        | TransferError::AttachmentRead(_)
        | TransferError::Contract(_) => FailureClass::Retryable,
    }
}

/// Computes the SHA-256 hex fingerprint of transferred bytes.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Transfer executor for one form, polymorphic over the strategy.
///
/// The strategy is fixed at construction from the destination config;
/// strategies are never mixed within one instance.
pub struct TransferClient {
    destination: DestinationConfig,
    transport: Arc<dyn TransferTransport>,
}

impl std::fmt::Debug for TransferClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferClient")
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

impl TransferClient {
    /// Creates a validated transfer client.
    ///
    /// # Errors
    /// Returns [`TransferError::ConfigMissing`] when a destination
    /// identifier is blank or placeholder text and
    /// [`TransferError::Endpoint`] when an endpoint is malformed or not
    /// HTTPS.
    pub fn new(
        destination: DestinationConfig,
        transport: Arc<dyn TransferTransport>,
    ) -> Result<Self, TransferError> {
        destination.validate().map_err(|error| match error {
            CoreError::PlaceholderConfig { field } => TransferError::ConfigMissing { field },
            other => TransferError::Endpoint(other.to_string()),
        })?;

        let endpoint = match &destination {
            DestinationConfig::Drive {
                upload_endpoint, ..
            } => upload_endpoint,
            DestinationConfig::Relay { endpoint } => endpoint,
            DestinationConfig::Email { endpoint, .. } => endpoint,
        };
        validate_endpoint(endpoint)?;

        Ok(Self {
            destination,
            transport,
        })
    }

    /// Returns the configured destination.
    pub fn destination(&self) -> &DestinationConfig {
        &self.destination
    }

    /// Returns `true` when the strategy needs a bearer credential.
    pub fn requires_authorization(&self) -> bool {
        self.destination.requires_authorization()
    }

    /// Moves one validated file to the destination.
    ///
    /// # Parameters
    /// - `file`: validated selection metadata.
    /// - `file_bytes`: the full file content, already read into memory.
    /// - `fields`: auxiliary text fields accompanying the file.
    /// - `bearer_token`: credential for strategies that require one.
    ///
    /// # Errors
    /// Returns [`TransferError::MissingCredential`] when the direct-upload
    /// strategy runs without a token, [`TransferError::Rejected`] for
    /// non-success destination responses (carrying the destination's
    /// message when available), and [`TransferError::Network`] when the
    /// request never completed.
    pub fn transfer(
        &self,
        file: &SelectedFile,
        file_bytes: &[u8],
        fields: &[(String, String)],
        bearer_token: Option<&str>,
    ) -> Result<TransferReport, TransferError> {
        let request = self.build_request(file, file_bytes, fields, bearer_token)?;
        let response = self.transport.execute(&request)?;

        if !response.is_success() {
            return Err(rejection(&response));
        }

        // Only the direct-upload strategy returns a structured record;
        // relay and email response bodies are destination-defined.
        let (stored_name, stored_id) = match &self.destination {
            DestinationConfig::Drive { .. } => {
                let record = parse_stored_file(&response.body)?;
                (record.name, Some(record.id))
            }
            _ => (file.name.clone(), None),
        };

        Ok(TransferReport {
            stored_name,
            stored_id,
            content_fingerprint: content_fingerprint(file_bytes),
        })
    }

    fn build_request(
        &self,
        file: &SelectedFile,
        file_bytes: &[u8],
        fields: &[(String, String)],
        bearer_token: Option<&str>,
    ) -> Result<TransferRequest, TransferError> {
        match &self.destination {
            DestinationConfig::Drive {
                folder_id,
                upload_endpoint,
                ..
            } => {
                let token = bearer_token.ok_or(TransferError::MissingCredential)?;
                let metadata = UploadMetadata {
                    name: file.name.clone(),
                    parents: vec![folder_id.to_string()],
                    mime_type: file.content_type.clone(),
                };
                let boundary = generate_boundary();
                let body =
                    compose_upload_body(&metadata, file_bytes, &file.content_type, &boundary)?;

                Ok(TransferRequest {
                    endpoint: upload_endpoint.clone(),
                    content_type: body.content_type,
                    authorization: Some(format!("Bearer {token}")),
                    body: body.bytes,
                })
            }
            DestinationConfig::Relay { endpoint } => {
                let boundary = generate_boundary();
                let body = compose_form_body(
                    fields,
                    &file.name,
                    &file.content_type,
                    file_bytes,
                    &boundary,
                )?;

                Ok(TransferRequest {
                    endpoint: endpoint.clone(),
                    content_type: body.content_type,
                    authorization: None,
                    body: body.bytes,
                })
            }
            DestinationConfig::Email {
                endpoint,
                service_id,
                template_id,
                public_key,
                recipient_override,
            } => {
                let mut request = MailSendRequest::new(service_id, template_id, public_key)?;
                for (name, value) in fields {
                    request.set_param(name.clone(), value.clone());
                }
                request.set_param("file_name", file.name.clone());
                request.set_param("file_size", human_megabytes(file.size_bytes));
                request.set_param(
                    "attachment",
                    encode_data_uri(&file.content_type, file_bytes),
                );
                if let Some(obfuscated) = recipient_override {
                    request.set_param("to_email", decode_obfuscated(obfuscated)?);
                }

                Ok(TransferRequest {
                    endpoint: endpoint.clone(),
                    content_type: "application/json".to_string(),
                    authorization: None,
                    body: request.to_json_bytes()?,
                })
            }
        }
    }
}

fn rejection(response: &TransferResponse) -> TransferError {
    let message = extract_rejection_message(&response.body)
        .or_else(|| {
            let trimmed = response.body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
                .then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("destination rejected the submission (HTTP {})", response.status));

    TransferError::Rejected {
        status: response.status,
        message,
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), TransferError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| TransferError::Endpoint(format!("invalid endpoint url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(TransferError::Endpoint(
            "destination endpoint must use https".to_string(),
        ));
    }

    Ok(())
}

/// Errors produced by transfer construction and execution.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Destination identifier is blank or placeholder text.
    #[error("destination config is incomplete: {field}")]
    ConfigMissing {
        /// Offending configuration field.
        field: String,
    },
    /// Endpoint violates URL or transport policy.
    #[error("invalid destination endpoint: {0}")]
    Endpoint(String),
    /// Direct upload was attempted without a bearer credential.
    #[error("no bearer credential is available for the upload")]
    MissingCredential,
    /// Destination answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status the destination returned.
        status: u16,
        /// Destination message, or a generic rejection line.
        message: String,
    },
    /// Request could not be completed.
    #[error("transfer network failure: {0}")]
    Network(String),
    /// File bytes could not be read for the transfer.
    #[error("could not read the selected file: {0}")]
    AttachmentRead(String),
    /// Body composition or obfuscation decoding failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// Destination response violated the wire contract.
    #[error(transparent)]
    Contract(#[from] ContractError),
}
