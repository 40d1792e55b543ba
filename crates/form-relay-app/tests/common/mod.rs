//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use form_relay_app::{FormController, bind_forms};
use form_relay_auth::{AuthError, BearerToken, ConsentPrompt, IdentityProvider, ProviderConfig};
use form_relay_core::SelectedFile;
use form_relay_host::{PageManifest, SyntheticFileStore};
use form_relay_transfer::{TransferError, TransferRequest, TransferResponse, TransferTransport};

/// Manifest with one Drive form requiring a prefix and a 15 MB ceiling.
#[allow(dead_code)]
pub const DRIVE_MANIFEST: &str = r#"{
    "forms": [{
        "form_id": "activities",
        "required_prefix": "Tarea1_",
        "max_size_bytes": 15000000,
        "destination": {
            "kind": "drive",
            "folder_id": "folder-901",
            "client_id": "client-901",
            "api_key": "key-901"
        }
    }]
}"#;

/// Manifest with one email-relay form carrying an obfuscated recipient.
#[allow(dead_code)]
pub const EMAIL_MANIFEST: &str = r#"{
    "forms": [{
        "form_id": "homework-mail",
        "destination": {
            "kind": "email",
            "service_id": "service-1",
            "template_id": "template-1",
            "public_key": "public-1",
            "recipient_override": {"base64": "ZG9jZW50ZUBleGFtcGxlLmVkdQ=="}
        }
    }]
}"#;

/// Manifest whose relay endpoint was never filled in by the operator.
#[allow(dead_code)]
pub const PLACEHOLDER_MANIFEST: &str = r#"{
    "forms": [{
        "form_id": "contact",
        "destination": {"kind": "relay", "endpoint": "YOUR_FORM_ENDPOINT_HERE"}
    }]
}"#;

/// Identity provider that counts prompts and can simulate dismissal.
pub struct CountingIdentityProvider {
    interactive_prompts: Mutex<u32>,
    silent_reloads: Mutex<u32>,
    dismiss_consent: bool,
}

impl CountingIdentityProvider {
    #[allow(dead_code)]
    pub fn granting() -> Self {
        Self {
            interactive_prompts: Mutex::new(0),
            silent_reloads: Mutex::new(0),
            dismiss_consent: false,
        }
    }

    #[allow(dead_code)]
    pub fn dismissing() -> Self {
        Self {
            interactive_prompts: Mutex::new(0),
            silent_reloads: Mutex::new(0),
            dismiss_consent: true,
        }
    }

    #[allow(dead_code)]
    pub fn interactive_prompt_count(&self) -> u32 {
        *self
            .interactive_prompts
            .lock()
            .expect("prompt lock should work")
    }

    #[allow(dead_code)]
    pub fn silent_reload_count(&self) -> u32 {
        *self
            .silent_reloads
            .lock()
            .expect("reload lock should work")
    }
}

impl IdentityProvider for CountingIdentityProvider {
    fn initialize(&self, _config: &ProviderConfig) -> Result<(), AuthError> {
        Ok(())
    }

    fn request_token(&self, prompt: ConsentPrompt) -> Result<BearerToken, AuthError> {
        match prompt {
            ConsentPrompt::Interactive => {
                *self
                    .interactive_prompts
                    .lock()
                    .expect("prompt lock should work") += 1;
                if self.dismiss_consent {
                    return Err(AuthError::ConsentCancelled);
                }
            }
            ConsentPrompt::Silent => {
                *self
                    .silent_reloads
                    .lock()
                    .expect("reload lock should work") += 1;
            }
        }

        Ok(BearerToken {
            access_token: "tok-fixture".to_string(),
            expires_at_ms: 10_000_000,
        })
    }

    fn revoke(&self, _token: &BearerToken) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Transport that records every request and replies with one canned response.
pub struct RecordingTransport {
    requests: Mutex<Vec<TransferRequest>>,
    response: TransferResponse,
}

impl RecordingTransport {
    #[allow(dead_code)]
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response: TransferResponse {
                status,
                body: body.to_string(),
            },
        }
    }

    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request lock should work").len()
    }

    #[allow(dead_code)]
    pub fn last_request(&self) -> TransferRequest {
        self.requests
            .lock()
            .expect("request lock should work")
            .last()
            .expect("at least one request recorded")
            .clone()
    }
}

impl TransferTransport for RecordingTransport {
    fn execute(&self, request: &TransferRequest) -> Result<TransferResponse, TransferError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        Ok(self.response.clone())
    }
}

/// Builds the single controller a one-form manifest binds.
#[allow(dead_code)]
pub fn bind_single(
    manifest_json: &str,
    identity: Arc<CountingIdentityProvider>,
    transport: Arc<RecordingTransport>,
) -> FormController {
    let manifest = PageManifest::from_json(manifest_json).expect("manifest should parse");
    let mut store = SyntheticFileStore::new();
    store.insert("Tarea1_Juan.pdf", b"%PDF-1.4 fixture".to_vec());

    let mut controllers = bind_forms(&manifest, identity, transport, Arc::new(store), None)
        .expect("bind should work");
    assert_eq!(controllers.len(), 1, "fixture manifests bind one form");
    controllers.remove(0)
}

/// Selection metadata matching the synthetic store fixture file.
#[allow(dead_code)]
pub fn fixture_selection() -> SelectedFile {
    SelectedFile::new("Tarea1_Juan.pdf", 16, "application/pdf").expect("selection should build")
}
