#![warn(missing_docs)]
//! # form-relay-ui
//!
//! ## Purpose
//! Defines the status presenter for one form: a single user-visible
//! message with a mutually exclusive style category, driven by the
//! per-attempt submission state machine.
//!
//! ## Responsibilities
//! - Represent the `idle | pending | success | error` status categories.
//! - Model one submission attempt's phase transitions with guards.
//! - Map validation verdicts and phase changes to display text.
//!
//! ## Data flow
//! Controller events (file selected, submit phases, outcomes) mutate
//! [`SubmissionAttempt`], which owns the [`StatusLine`] rendered in the
//! form's status region.
//!
//! ## Ownership and lifetimes
//! The attempt owns all strings; nothing borrows from controller state.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Transition
//! methods apply only when legal and report whether they did.
//!
//! ## Security and privacy notes
//! Status text never includes tokens or credential identifiers; callers
//! pass already-redacted messages.

use form_relay_core::{ValidationError, human_megabytes};

/// Message shown while a form waits for a selection.
pub const IDLE_MESSAGE: &str = "Choose a file and press submit.";
/// Message shown during pre-network validation.
pub const VALIDATING_MESSAGE: &str = "Checking the selected file...";
/// Message shown while the consent prompt is open.
pub const AUTHORIZING_MESSAGE: &str = "Waiting for authorization...";
/// Message shown while the transfer is in flight.
pub const TRANSFERRING_MESSAGE: &str = "Sending the file...";

/// Mutually exclusive status style category; exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    /// Nothing in progress, no outcome to show.
    Idle,
    /// An attempt phase is in progress.
    Pending,
    /// The last attempt succeeded.
    Success,
    /// The last attempt was rejected or failed.
    Error,
}

/// One rendered status: category plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Active style category.
    pub category: StatusCategory,
    /// User-visible message text.
    pub message: String,
}

impl StatusLine {
    /// Idle status with the awaiting-file message.
    pub fn idle() -> Self {
        Self {
            category: StatusCategory::Idle,
            message: IDLE_MESSAGE.to_string(),
        }
    }

    /// Pending status with the given message.
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            category: StatusCategory::Pending,
            message: message.into(),
        }
    }

    /// Success status with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: StatusCategory::Success,
            message: message.into(),
        }
    }

    /// Error status with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: StatusCategory::Error,
            message: message.into(),
        }
    }
}

/// Phase of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No attempt in progress.
    Idle,
    /// Pre-network validation is running.
    Validating,
    /// Validation rejected the selection; terminal for the attempt.
    Rejected,
    /// Interactive authorization is in progress.
    Authorizing,
    /// The transfer call is in flight.
    Transferring,
    /// The attempt completed; terminal for the attempt.
    Succeeded,
    /// The attempt failed after validation; terminal for the attempt.
    Failed,
}

impl AttemptPhase {
    /// Returns `true` for phases that end an attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Succeeded | Self::Failed)
    }

    /// Returns `true` while an attempt is between submit and outcome.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Validating | Self::Authorizing | Self::Transferring)
    }
}

/// State for one submission attempt plus the rendered status line.
///
/// Transition methods return `true` when the transition was legal and
/// applied; an illegal call leaves phase and status untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    file_name: Option<String>,
    phase: AttemptPhase,
    status: StatusLine,
}

impl SubmissionAttempt {
    /// Creates an idle attempt with no selection.
    pub fn new() -> Self {
        Self {
            file_name: None,
            phase: AttemptPhase::Idle,
            status: StatusLine::idle(),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    /// Returns the rendered status line.
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Returns the currently selected file name, when one is held.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Records a new selection and resets phase and status to idle.
    ///
    /// A selection always discards the previous attempt's outcome; it is
    /// refused only while an attempt is in flight.
    pub fn select_file(&mut self, file_name: impl Into<String>) -> bool {
        if self.phase.is_in_flight() {
            return false;
        }

        self.file_name = Some(file_name.into());
        self.phase = AttemptPhase::Idle;
        self.status = StatusLine::idle();
        true
    }

    /// Enters validation from idle or a terminal phase.
    pub fn begin_validation(&mut self) -> bool {
        if self.phase.is_in_flight() {
            return false;
        }

        self.phase = AttemptPhase::Validating;
        self.status = StatusLine::pending(VALIDATING_MESSAGE);
        true
    }

    /// Records a validation rejection with its verdict message.
    pub fn reject(&mut self, verdict: &ValidationError) -> bool {
        if self.phase != AttemptPhase::Validating {
            return false;
        }

        self.phase = AttemptPhase::Rejected;
        self.status = StatusLine::error(describe_verdict(verdict));
        true
    }

    /// Enters the interactive authorization phase.
    pub fn begin_authorization(&mut self) -> bool {
        if self.phase != AttemptPhase::Validating {
            return false;
        }

        self.phase = AttemptPhase::Authorizing;
        self.status = StatusLine::pending(AUTHORIZING_MESSAGE);
        true
    }

    /// Enters the transfer phase, from validation or authorization.
    pub fn begin_transfer(&mut self) -> bool {
        if !matches!(
            self.phase,
            AttemptPhase::Validating | AttemptPhase::Authorizing
        ) {
            return false;
        }

        self.phase = AttemptPhase::Transferring;
        self.status = StatusLine::pending(TRANSFERRING_MESSAGE);
        true
    }

    /// Records success, clears the selection, and shows the stored name.
    pub fn succeed(&mut self, stored_name: &str) -> bool {
        if self.phase != AttemptPhase::Transferring {
            return false;
        }

        self.phase = AttemptPhase::Succeeded;
        self.status = StatusLine::success(format!("File sent as \"{stored_name}\"."));
        self.file_name = None;
        true
    }

    /// Records a post-validation failure with an already-redacted message.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !matches!(
            self.phase,
            AttemptPhase::Authorizing | AttemptPhase::Transferring
        ) {
            return false;
        }

        self.phase = AttemptPhase::Failed;
        self.status = StatusLine::error(message);
        true
    }
}

impl Default for SubmissionAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a validation verdict to its user-facing message.
///
/// Size verdicts are rendered in megabytes so the limit reads the way the
/// form advertises it; everything else uses the verdict's own text.
pub fn describe_verdict(verdict: &ValidationError) -> String {
    match verdict {
        ValidationError::TooLarge {
            size_bytes,
            limit_bytes,
        } => format!(
            "file is {}, above the {} limit",
            human_megabytes(*size_bytes),
            human_megabytes(*limit_bytes)
        ),
        other => other.to_string(),
    }
}
