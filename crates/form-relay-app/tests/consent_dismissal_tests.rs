//! Integration tests for dismissed/denied consent prompts.

mod common;

use std::sync::Arc;

use common::{
    CountingIdentityProvider, DRIVE_MANIFEST, RecordingTransport, bind_single, fixture_selection,
};
use form_relay_app::SubmitOutcome;
use form_relay_ui::StatusCategory;

#[test]
fn consent_dismissal_tests_dismissal_blocks_transfer_and_stays_retryable() {
    let identity = Arc::new(CountingIdentityProvider::dismissing());
    let transport = Arc::new(RecordingTransport::replying(200, "{}"));
    let mut controller = bind_single(DRIVE_MANIFEST, identity.clone(), transport.clone());

    assert!(controller.select_file(fixture_selection()));
    let outcome = controller.submit(1_000);

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(transport.request_count(), 0);
    assert_eq!(identity.interactive_prompt_count(), 1);

    let status = controller.status();
    assert_eq!(status.category, StatusCategory::Error);
    assert_eq!(status.message, "authorization was cancelled");
    assert!(controller.is_submit_enabled());
}
