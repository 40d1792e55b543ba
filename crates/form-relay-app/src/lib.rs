#![warn(missing_docs)]
//! # form-relay-app
//!
//! ## Purpose
//! Orchestrates validation, authorization, transfer, and status projection
//! for every form bound on one host page.
//!
//! ## Responsibilities
//! - Assemble one [`FormController`] per manifest form at page-scan time.
//! - Drive the four-phase submit pipeline with a single-flight guard.
//! - Keep the submit control disabled permanently on configuration errors.
//! - Provide log redaction, per-run event logging, and the version and
//!   year-stamp surfaces.
//!
//! ## Data flow
//! Page manifest -> [`bind_forms`] -> controllers. Per submit:
//! validation -> (interactive authorization when the strategy needs a
//! bearer credential) -> file read -> transfer -> status projection.
//!
//! ## Ownership and lifetimes
//! Controllers own their attempt state and configuration. The only shared
//! mutable state is the page-wide authorization provider behind
//! `Arc<Mutex<...>>`, refreshed idempotently.
//!
//! ## Error model
//! Subsystem failures are mapped to status text at the point of
//! occurrence; nothing propagates past the owning controller. Fatal
//! configuration failures keep the form disabled; everything else leaves
//! it retryable.
//!
//! ## Security and privacy notes
//! - Message strings pass through [`redact_sensitive`] before they reach
//!   the run log.
//! - The run logger never receives token values or file bytes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use form_relay_auth::{AuthError, AuthorizationProvider, IdentityProvider, ProviderConfig};
use form_relay_core::{FormBinding, SelectedFile, ValidationError, validate_selection};
use form_relay_host::{FileStore, HostError, PageManifest, scan_forms};
use form_relay_transfer::{
    FailureClass, TransferClient, TransferError, TransferTransport, classify_transfer_error,
};
use form_relay_ui::{AttemptPhase, StatusLine, SubmissionAttempt};
use thiserror::Error;
use time::OffsetDateTime;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("FORM_RELAY_VERSION");

/// Returns the app version sourced from the root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Outcome of one submit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The control was disabled; nothing ran.
    Ignored,
    /// Validation rejected the selection before any network activity.
    Rejected,
    /// Authorization or transfer failed after validation.
    Failed,
    /// The transfer completed and the selection was cleared.
    Succeeded,
}

/// Controller for one bound form; at most one attempt in flight.
pub struct FormController {
    binding: FormBinding,
    attempt: SubmissionAttempt,
    selected: Option<SelectedFile>,
    fields: Vec<(String, String)>,
    submit_enabled: bool,
    config_error: Option<String>,
    transfer: Option<TransferClient>,
    auth: Option<Arc<Mutex<AuthorizationProvider>>>,
    files: Arc<dyn FileStore>,
    logger: Option<Arc<RunLogger>>,
}

impl FormController {
    /// Builds a controller for one binding.
    ///
    /// Construction never fails: a destination that cannot produce a
    /// transfer client (placeholder identifiers, bad endpoint) yields a
    /// controller that is permanently disabled and shows the
    /// configuration error in its status region.
    pub fn new(
        binding: FormBinding,
        auth: Option<Arc<Mutex<AuthorizationProvider>>>,
        transport: Arc<dyn TransferTransport>,
        files: Arc<dyn FileStore>,
        logger: Option<Arc<RunLogger>>,
    ) -> Self {
        let mut controller = Self {
            binding,
            attempt: SubmissionAttempt::new(),
            selected: None,
            fields: Vec::new(),
            submit_enabled: true,
            config_error: None,
            transfer: None,
            auth,
            files,
            logger,
        };

        match TransferClient::new(controller.binding.config.destination.clone(), transport) {
            Ok(client) => controller.transfer = Some(client),
            Err(error) => controller.disable_permanently(error.to_string()),
        }

        controller
    }

    /// Returns the bound form id.
    pub fn form_id(&self) -> &str {
        &self.binding.form_id
    }

    /// Returns the rendered status line for the form's status region.
    ///
    /// A configuration error outlives attempt state: it stays visible
    /// until the page is reloaded with corrected configuration.
    pub fn status(&self) -> StatusLine {
        match &self.config_error {
            Some(message) => StatusLine::error(message.clone()),
            None => self.attempt.status().clone(),
        }
    }

    /// Returns the current attempt phase.
    pub fn phase(&self) -> AttemptPhase {
        self.attempt.phase()
    }

    /// Returns `true` while the submit control is enabled.
    pub fn is_submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Returns the currently selected file name, when one is held.
    pub fn selected_file_name(&self) -> Option<&str> {
        self.selected.as_ref().map(|file| file.name.as_str())
    }

    /// Adds one auxiliary text field sent along with the file.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Records a new selection and resets the attempt state.
    ///
    /// Returns `false` without touching state while an attempt is in
    /// flight or when the form is disabled by a configuration error.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if self.config_error.is_some() {
            return false;
        }

        if !self.attempt.select_file(file.name.clone()) {
            return false;
        }

        self.selected = Some(file);
        true
    }

    /// Runs one submission attempt through the four-phase pipeline.
    ///
    /// Invoking this while the submit control is disabled is a no-op. The
    /// control is disabled for the full duration of the attempt and
    /// re-enabled afterwards unless the failure was configuration-shaped.
    pub fn submit(&mut self, now_ms: u64) -> SubmitOutcome {
        if !self.submit_enabled {
            return SubmitOutcome::Ignored;
        }

        self.submit_enabled = false;
        let outcome = self.run_attempt(now_ms);
        self.submit_enabled = self.config_error.is_none();
        outcome
    }

    fn run_attempt(&mut self, now_ms: u64) -> SubmitOutcome {
        self.attempt.begin_validation();

        if let Err(verdict) = validate_selection(self.selected.as_ref(), &self.binding.config) {
            self.log("WARN", "validate", "rejected", &verdict.to_string());
            self.attempt.reject(&verdict);
            return SubmitOutcome::Rejected;
        }

        let Some(file) = self.selected.clone() else {
            self.attempt.reject(&ValidationError::NoFileSelected);
            return SubmitOutcome::Rejected;
        };

        if self.transfer.is_none() {
            // Construction already disabled the form; submit was a race
            // against the page scan and is treated as ignored.
            return SubmitOutcome::Ignored;
        }

        let bearer_token = if self.binding.config.destination.requires_authorization() {
            self.attempt.begin_authorization();
            match self.acquire_token(now_ms) {
                Ok(token) => Some(token),
                Err(error) => {
                    if matches!(
                        error,
                        AuthError::ConfigMissing { .. } | AuthError::InitFailed(_)
                    ) {
                        self.disable_permanently(error.to_string());
                    } else {
                        self.attempt.fail(error.to_string());
                    }
                    self.log("ERROR", "authorize", "failed", &error.to_string());
                    return SubmitOutcome::Failed;
                }
            }
        } else {
            None
        };

        self.attempt.begin_transfer();

        let file_bytes = match self.files.read(&file.name) {
            Ok(bytes) => bytes,
            Err(error) => {
                let error = TransferError::AttachmentRead(error.to_string());
                self.log("ERROR", "transfer", "read_failed", &error.to_string());
                self.attempt.fail(error.to_string());
                return SubmitOutcome::Failed;
            }
        };

        let result = match self.transfer.as_ref() {
            Some(client) => client.transfer(&file, &file_bytes, &self.fields, bearer_token.as_deref()),
            None => return SubmitOutcome::Ignored,
        };

        match result {
            Ok(report) => {
                self.log("INFO", "transfer", "stored", &report.stored_name);
                self.attempt.succeed(&report.stored_name);
                self.selected = None;
                SubmitOutcome::Succeeded
            }
            Err(error) => {
                self.log("ERROR", "transfer", "failed", &error.to_string());
                if classify_transfer_error(&error) == FailureClass::Fatal {
                    self.disable_permanently(error.to_string());
                } else {
                    self.attempt.fail(error.to_string());
                }
                SubmitOutcome::Failed
            }
        }
    }

    fn acquire_token(&self, now_ms: u64) -> Result<String, AuthError> {
        let Some(shared) = self.auth.as_ref() else {
            return Err(AuthError::ConfigMissing {
                field: "authorization_provider".to_string(),
            });
        };

        let mut provider = shared.lock().map_err(|_| {
            AuthError::Provider("authorization state is unavailable".to_string())
        })?;
        let token = provider.ensure_signed_in(now_ms)?;
        Ok(token.access_token)
    }

    fn disable_permanently(&mut self, message: String) {
        // Retrying cannot help until the page is reloaded with corrected
        // configuration, so the control stays disabled.
        self.attempt.fail(message.clone());
        self.config_error = Some(message);
        self.submit_enabled = false;
    }

    fn log(&self, level: &str, stage: &str, action: &str, detail: &str) {
        if let Some(logger) = &self.logger {
            logger.write_line(level, stage, action, &redact_sensitive(detail));
        }
    }
}

/// Binds every manifest form into a controller at page-scan time.
///
/// Drive-strategy forms share one page-wide [`AuthorizationProvider`]
/// built from the first Drive destination's credential identifiers.
///
/// # Errors
/// Returns [`AppError::Host`] when the manifest cannot be scanned
/// (duplicate or blank form ids). Per-form configuration problems do not
/// fail the bind; they surface in that form's status region.
pub fn bind_forms(
    manifest: &PageManifest,
    identity: Arc<dyn IdentityProvider>,
    transport: Arc<dyn TransferTransport>,
    files: Arc<dyn FileStore>,
    logger: Option<Arc<RunLogger>>,
) -> Result<Vec<FormController>, AppError> {
    let bindings = scan_forms(manifest).map_err(AppError::Host)?;

    let mut shared_auth: Option<Arc<Mutex<AuthorizationProvider>>> = None;
    let mut controllers = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let auth = if binding.config.destination.requires_authorization() {
            if shared_auth.is_none()
                && let form_relay_core::DestinationConfig::Drive {
                    client_id, api_key, ..
                } = &binding.config.destination
            {
                shared_auth = Some(Arc::new(Mutex::new(AuthorizationProvider::new(
                    ProviderConfig::new(client_id.clone(), api_key.clone()),
                    identity.clone(),
                ))));
            }
            shared_auth.clone()
        } else {
            None
        };

        controllers.push(FormController::new(
            binding,
            auth,
            transport.clone(),
            files.clone(),
            logger.clone(),
        ));
    }

    Ok(controllers)
}

/// Redacts common secret markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["password", "token", "authorization", "bearer", "api_key"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(key) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// Formats the year for the page's cosmetic footer stamp.
pub fn year_stamp(now: OffsetDateTime) -> String {
    now.year().to_string()
}

/// Returns the current year stamp from the system clock.
pub fn current_year_stamp() -> String {
    year_stamp(OffsetDateTime::now_utc())
}

/// Per-run event logger writing `level | stage | action | detail` lines.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates a timestamp-named log file inside `dir`.
    ///
    /// # Errors
    /// Returns [`AppError::RunLog`] when the file cannot be created.
    pub fn create_in(dir: &Path) -> Result<Self, AppError> {
        let timestamp = timestamp_compact_utc();
        let path = dir.join(format!("{timestamp}_relay_log.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                AppError::RunLog(format!(
                    "unable to create log file '{}': {error}",
                    path.display()
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one structured line; errors are swallowed on purpose so
    /// logging can never break a submission attempt.
    pub fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
        let timestamp = timestamp_compact_utc();
        let line = format!("{timestamp} | {level} | {stage} | {action} | {detail}\n");

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            if level == "ERROR" {
                let _ = file.flush();
            }
        }
    }
}

fn timestamp_compact_utc() -> String {
    time::format_description::parse("[year][month][day]T[hour][minute][second]Z")
        .ok()
        .and_then(|format| OffsetDateTime::now_utc().format(&format).ok())
        .unwrap_or_else(|| "00000000T000000Z".to_string())
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Host collaborator error during the page scan.
    #[error("host error: {0}")]
    Host(HostError),
    /// Run log file could not be created.
    #[error("run log error: {0}")]
    RunLog(String),
}
