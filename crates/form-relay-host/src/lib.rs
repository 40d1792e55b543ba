#![warn(missing_docs)]
//! # form-relay-host
//!
//! ## Purpose
//! Models the host-page collaborator: the declarative markup contract the
//! forms are scanned from, and the file input's byte source.
//!
//! ## Responsibilities
//! - Parse the page manifest (one entry per form, mirroring the form's
//!   declarative attributes).
//! - Produce immutable form bindings at page-load scan time.
//! - Provide a backend-agnostic file store with a real filesystem backend
//!   and a deterministic in-memory backend for tests.
//!
//! ## Data flow
//! Manifest JSON -> [`PageManifest::from_json`] -> [`scan_forms`] ->
//! bindings consumed by the controller. On transfer, the controller reads
//! file bytes through [`FileStore::read`].
//!
//! ## Ownership and lifetimes
//! Bindings and manifests are owned snapshots; stores hand out owned byte
//! buffers so transfers never borrow backend state.
//!
//! ## Error model
//! Malformed manifests, duplicate form ids, and unreadable files return
//! [`HostError`]. Placeholder-bearing entries still produce bindings: the
//! controller gates them so the configuration error is visible in the
//! form's own status region.
//!
//! ## Security and privacy notes
//! The disk store is jailed to its root directory; selection names that
//! attempt to traverse outside it are rejected.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use form_relay_core::{FormBinding, SubmissionConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declarative page description consumed from the host page.
///
/// Each entry corresponds to one form element and carries the attributes
/// the markup contract defines: prefix, destination identifiers, size
/// limit, and credential identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageManifest {
    /// Optional page title, cosmetic only.
    #[serde(default)]
    pub title: Option<String>,
    /// One configuration per form element, in document order.
    pub forms: Vec<SubmissionConfig>,
    /// Whether the page carries a year-stamp footer element.
    #[serde(default)]
    pub year_stamp: bool,
}

impl PageManifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    /// Returns [`HostError::Manifest`] for invalid JSON.
    pub fn from_json(raw: &str) -> Result<Self, HostError> {
        serde_json::from_str(raw).map_err(HostError::Manifest)
    }
}

/// Scans the manifest into immutable form bindings.
///
/// # Semantics
/// Bindings are created in document order, one per form. Entries with
/// placeholder destination values still bind; configuration gating is the
/// controller's job so the error surfaces per form.
///
/// # Errors
/// Returns [`HostError::DuplicateFormId`] when two entries share an id and
/// [`HostError::Binding`] when an entry has no usable id.
pub fn scan_forms(manifest: &PageManifest) -> Result<Vec<FormBinding>, HostError> {
    let mut bindings = Vec::with_capacity(manifest.forms.len());
    let mut seen_ids = Vec::new();

    for config in &manifest.forms {
        if seen_ids.contains(&config.form_id) {
            return Err(HostError::DuplicateFormId(config.form_id.clone()));
        }
        seen_ids.push(config.form_id.clone());
        bindings.push(FormBinding::new(config.clone()).map_err(HostError::Binding)?);
    }

    Ok(bindings)
}

/// Trait implemented by file byte sources.
pub trait FileStore: Send + Sync {
    /// Reads the full content of one selected file.
    ///
    /// # Errors
    /// Returns [`HostError::FileRead`] when the bytes cannot be obtained.
    fn read(&self, file_name: &str) -> Result<Vec<u8>, HostError>;
}

/// Real file store rooted at one directory.
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// Creates a store reading from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for DiskFileStore {
    fn read(&self, file_name: &str) -> Result<Vec<u8>, HostError> {
        // Selection names come from a file input; path syntax means the
        // name is trying to escape the store root.
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(HostError::FileRead {
                name: file_name.to_string(),
                detail: "file name must not contain path segments".to_string(),
            });
        }

        let path = self.root.join(file_name);
        fs::read(&path).map_err(|error| HostError::FileRead {
            name: file_name.to_string(),
            detail: error.to_string(),
        })
    }
}

/// Deterministic in-memory file store for tests and examples.
#[derive(Debug, Default)]
pub struct SyntheticFileStore {
    files: HashMap<String, Vec<u8>>,
}

impl SyntheticFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with named contents.
    pub fn with_files(files: HashMap<String, Vec<u8>>) -> Self {
        Self { files }
    }

    /// Adds or replaces one file.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }
}

impl FileStore for SyntheticFileStore {
    fn read(&self, file_name: &str) -> Result<Vec<u8>, HostError> {
        self.files
            .get(file_name)
            .cloned()
            .ok_or_else(|| HostError::FileRead {
                name: file_name.to_string(),
                detail: "file is not present in the synthetic store".to_string(),
            })
    }
}

/// Host collaborator error type.
#[derive(Debug, Error)]
pub enum HostError {
    /// Manifest JSON decoding error.
    #[error("page manifest decode failure: {0}")]
    Manifest(#[from] serde_json::Error),
    /// Two manifest entries share one form id.
    #[error("duplicate form id: {0}")]
    DuplicateFormId(String),
    /// Manifest entry could not be bound.
    #[error("form binding failure: {0}")]
    Binding(form_relay_core::CoreError),
    /// File bytes could not be obtained.
    #[error("could not read file '{name}': {detail}")]
    FileRead {
        /// Selection name that failed.
        name: String,
        /// Backend detail message.
        detail: String,
    },
}
