#![warn(missing_docs)]
//! # form-relay-auth
//!
//! ## Purpose
//! Obtains and keeps fresh the bearer credential used by direct uploads.
//!
//! ## Responsibilities
//! - Validate identity-provider configuration before any init call.
//! - Model the `Uninitialized -> ClientReady -> SignedOut/SignedIn`
//!   lifecycle with explicit legal transitions.
//! - Expose an idempotent `ensure_signed_in` that reloads the token before
//!   each use instead of trusting a cached value.
//!
//! ## Data flow
//! The controller resolves a [`ProviderConfig`] from the form destination ->
//! [`AuthorizationProvider::ensure_signed_in`] drives the injectable
//! [`IdentityProvider`] -> a [`BearerToken`] is borrowed per transfer call.
//!
//! ## Ownership and lifetimes
//! Tokens are owned `String` values to decouple provider and controller
//! lifetimes. The provider instance is shared read-mostly across forms.
//!
//! ## Error model
//! Missing configuration, init failures, and consent outcomes surface as
//! [`AuthError`]; consent rejection leaves the provider in its prior phase
//! so the user can retry.
//!
//! ## Security and privacy notes
//! This crate never logs token values. Credential identifiers are treated
//! as opaque strings.
//!
//! ## Example
//! ```rust
//! use form_relay_auth::{AuthPhase, AuthorizationProvider, ProviderConfig};
//! use form_relay_auth::StaticIdentityProvider;
//! use std::sync::Arc;
//!
//! let config = ProviderConfig::new("client-1", "key-1");
//! let provider = AuthorizationProvider::new(config, Arc::new(StaticIdentityProvider::new("tok", 10_000)));
//! assert!(matches!(provider.phase(), AuthPhase::Uninitialized));
//! ```

use std::sync::Arc;

use form_relay_core::is_placeholder_value;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default discovery document endpoint for the storage provider client.
pub const DEFAULT_DISCOVERY_ENDPOINT: &str =
    "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest";

/// Default authorization scope requested during consent.
pub const DEFAULT_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Identity-provider configuration resolved from the form destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client identifier.
    pub client_id: String,
    /// API key used by the provider's client initialization.
    pub api_key: String,
    /// Discovery document endpoint loaded at init time.
    #[serde(default = "default_discovery_endpoint")]
    pub discovery_endpoint: String,
    /// Authorization scope requested at consent time.
    #[serde(default = "default_upload_scope")]
    pub scope: String,
}

fn default_discovery_endpoint() -> String {
    DEFAULT_DISCOVERY_ENDPOINT.to_string()
}

fn default_upload_scope() -> String {
    DEFAULT_UPLOAD_SCOPE.to_string()
}

impl ProviderConfig {
    /// Creates a config with default discovery endpoint and scope.
    pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_key: api_key.into(),
            discovery_endpoint: default_discovery_endpoint(),
            scope: default_upload_scope(),
        }
    }

    /// Validates identifiers and the discovery endpoint policy.
    ///
    /// # Errors
    /// Returns [`AuthError::ConfigMissing`] when an identifier is blank or
    /// placeholder text, or when the discovery endpoint is not HTTPS.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("api_key", &self.api_key),
            ("scope", &self.scope),
        ] {
            if is_placeholder_value(value) {
                return Err(AuthError::ConfigMissing {
                    field: field.to_string(),
                });
            }
        }

        let parsed = Url::parse(&self.discovery_endpoint).map_err(|_| AuthError::ConfigMissing {
            field: "discovery_endpoint".to_string(),
        })?;
        if parsed.scheme() != "https" {
            return Err(AuthError::ConfigMissing {
                field: "discovery_endpoint".to_string(),
            });
        }

        Ok(())
    }
}

/// Bearer credential with absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    /// Token presented in the `Authorization` header.
    pub access_token: String,
    /// Absolute epoch milliseconds when the token expires.
    pub expires_at_ms: u64,
}

impl BearerToken {
    /// Returns `true` when the token has expired at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Consent mode for a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPrompt {
    /// Interactive prompt shown to the user.
    Interactive,
    /// Silent reload of an existing grant; never prompts.
    Silent,
}

/// Abstract identity provider driven by the authorization state machine.
///
/// Implementations wrap the hosted provider library; the state machine is
/// independent of any particular calling convention.
pub trait IdentityProvider: Send + Sync {
    /// Performs one-time asynchronous client initialization.
    ///
    /// # Errors
    /// Returns [`AuthError::InitFailed`] when the provider library errors.
    fn initialize(&self, config: &ProviderConfig) -> Result<(), AuthError>;

    /// Requests a bearer token in the given consent mode.
    ///
    /// # Errors
    /// Returns [`AuthError::ConsentDenied`] or
    /// [`AuthError::ConsentCancelled`] for interactive outcomes and
    /// [`AuthError::Provider`] for transport failures.
    fn request_token(&self, prompt: ConsentPrompt) -> Result<BearerToken, AuthError>;

    /// Revokes the given token with the provider.
    ///
    /// # Errors
    /// Returns [`AuthError::Provider`] when revocation fails.
    fn revoke(&self, token: &BearerToken) -> Result<(), AuthError>;
}

/// Authorization lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Provider library has not been initialized yet.
    Uninitialized,
    /// Library initialized; no consent has been requested yet.
    ClientReady,
    /// User signed out after a previous session.
    SignedOut,
    /// A usable credential is held.
    SignedIn,
}

/// Authorization provider with explicit init/consent/sign-out transitions.
///
/// One instance is shared across all forms on a page; it is the only
/// process-wide mutable state in the workspace and is refreshed
/// idempotently.
pub struct AuthorizationProvider {
    config: ProviderConfig,
    provider: Arc<dyn IdentityProvider>,
    phase: AuthPhase,
    token: Option<BearerToken>,
}

impl AuthorizationProvider {
    /// Creates a provider in the `Uninitialized` phase.
    pub fn new(config: ProviderConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            config,
            provider,
            phase: AuthPhase::Uninitialized,
            token: None,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// Performs one-time client initialization; idempotent.
    ///
    /// # Errors
    /// Returns [`AuthError::ConfigMissing`] before touching the provider
    /// when identifiers are absent or placeholders, and
    /// [`AuthError::InitFailed`] when the provider init errors. The phase
    /// stays `Uninitialized` on failure.
    pub fn initialize(&mut self) -> Result<(), AuthError> {
        if self.phase != AuthPhase::Uninitialized {
            return Ok(());
        }

        self.config.validate()?;
        self.provider.initialize(&self.config)?;
        self.phase = AuthPhase::ClientReady;
        Ok(())
    }

    /// Returns a usable credential, prompting only when necessary.
    ///
    /// # Semantics
    /// - While `SignedIn`, the token is reloaded silently before every use;
    ///   no interactive prompt is shown.
    /// - From `ClientReady` or `SignedOut`, one interactive consent prompt
    ///   runs; rejection or dismissal leaves the phase unchanged.
    /// - Calls from `Uninitialized` run [`Self::initialize`] first.
    ///
    /// # Errors
    /// Propagates [`AuthError::ConfigMissing`]/[`AuthError::InitFailed`]
    /// from init and [`AuthError::ConsentDenied`]/
    /// [`AuthError::ConsentCancelled`]/[`AuthError::Provider`] from the
    /// token request.
    pub fn ensure_signed_in(&mut self, now_ms: u64) -> Result<BearerToken, AuthError> {
        self.initialize()?;

        let prompt = match self.phase {
            AuthPhase::SignedIn => ConsentPrompt::Silent,
            _ => ConsentPrompt::Interactive,
        };

        let token = self.provider.request_token(prompt)?;
        if token.is_expired(now_ms) {
            return Err(AuthError::Provider(
                "provider returned an already-expired token".to_string(),
            ));
        }

        self.phase = AuthPhase::SignedIn;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Revokes the current credential and returns to `SignedOut`.
    ///
    /// # Errors
    /// Returns [`AuthError::Provider`] when revocation fails; the local
    /// token is discarded regardless.
    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        let token = self.token.take();
        if self.phase == AuthPhase::SignedIn {
            self.phase = AuthPhase::SignedOut;
        }

        match token {
            Some(token) => self.provider.revoke(&token),
            None => Ok(()),
        }
    }

    /// Returns `true` when a non-expired credential is currently held.
    pub fn is_signed_in(&self, now_ms: u64) -> bool {
        matches!(
            (&self.phase, &self.token),
            (AuthPhase::SignedIn, Some(token)) if !token.is_expired(now_ms)
        )
    }
}

/// Fixed-token identity provider for examples and tests.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    access_token: String,
    expires_at_ms: u64,
}

impl StaticIdentityProvider {
    /// Creates a provider that always grants the same token.
    pub fn new(access_token: impl Into<String>, expires_at_ms: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at_ms,
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn initialize(&self, _config: &ProviderConfig) -> Result<(), AuthError> {
        Ok(())
    }

    fn request_token(&self, _prompt: ConsentPrompt) -> Result<BearerToken, AuthError> {
        Ok(BearerToken {
            access_token: self.access_token.clone(),
            expires_at_ms: self.expires_at_ms,
        })
    }

    fn revoke(&self, _token: &BearerToken) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Errors produced by the authorization lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Required identifier is absent, placeholder text, or non-HTTPS.
    #[error("authorization config is incomplete: {field}")]
    ConfigMissing {
        /// Offending configuration field.
        field: String,
    },
    /// Provider library initialization failed.
    #[error("authorization client failed to initialize: {0}")]
    InitFailed(String),
    /// User rejected the interactive consent prompt.
    #[error("authorization was denied")]
    ConsentDenied,
    /// User dismissed the interactive consent prompt.
    #[error("authorization was cancelled")]
    ConsentCancelled,
    /// Provider transport or revocation failure.
    #[error("identity provider failure: {0}")]
    Provider(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for config policy and lifecycle transitions.

    use super::*;

    #[test]
    fn placeholder_client_id_blocks_initialization() {
        let config = ProviderConfig::new("REPLACE_WITH_CLIENT_ID", "key-1");
        let mut provider =
            AuthorizationProvider::new(config, Arc::new(StaticIdentityProvider::new("tok", 10)));
        let error = provider.initialize().expect_err("placeholder must fail");
        assert!(matches!(error, AuthError::ConfigMissing { field } if field == "client_id"));
        assert!(matches!(provider.phase(), AuthPhase::Uninitialized));
    }

    #[test]
    fn discovery_endpoint_must_be_https() {
        let mut config = ProviderConfig::new("client-1", "key-1");
        config.discovery_endpoint = "http://example.test/discovery".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn ensure_signed_in_initializes_then_signs_in() {
        let mut provider = AuthorizationProvider::new(
            ProviderConfig::new("client-1", "key-1"),
            Arc::new(StaticIdentityProvider::new("tok", 10_000)),
        );

        let token = provider.ensure_signed_in(1_000).expect("should sign in");
        assert_eq!(token.access_token, "tok");
        assert!(matches!(provider.phase(), AuthPhase::SignedIn));
        assert!(provider.is_signed_in(1_000));
    }

    #[test]
    fn sign_out_returns_to_signed_out_phase() {
        let mut provider = AuthorizationProvider::new(
            ProviderConfig::new("client-1", "key-1"),
            Arc::new(StaticIdentityProvider::new("tok", 10_000)),
        );
        provider.ensure_signed_in(1_000).expect("should sign in");

        provider.sign_out().expect("sign out should work");
        assert!(matches!(provider.phase(), AuthPhase::SignedOut));
        assert!(!provider.is_signed_in(1_000));
    }

    #[test]
    fn expired_grant_from_provider_is_rejected() {
        let mut provider = AuthorizationProvider::new(
            ProviderConfig::new("client-1", "key-1"),
            Arc::new(StaticIdentityProvider::new("tok", 500)),
        );
        let verdict = provider.ensure_signed_in(1_000);
        assert!(matches!(verdict, Err(AuthError::Provider(_))));
    }
}
