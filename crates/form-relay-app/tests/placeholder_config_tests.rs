//! Integration tests for placeholder-configuration gating.

mod common;

use std::sync::Arc;

use common::{
    CountingIdentityProvider, PLACEHOLDER_MANIFEST, RecordingTransport, bind_single,
    fixture_selection,
};
use form_relay_app::SubmitOutcome;
use form_relay_ui::StatusCategory;

#[test]
fn placeholder_config_tests_disable_the_form_until_operator_fixes_it() {
    let transport = Arc::new(RecordingTransport::replying(200, "{}"));
    let mut controller = bind_single(
        PLACEHOLDER_MANIFEST,
        Arc::new(CountingIdentityProvider::granting()),
        transport.clone(),
    );

    assert!(!controller.is_submit_enabled());
    let status = controller.status();
    assert_eq!(status.category, StatusCategory::Error);
    assert!(status.message.contains("endpoint"));

    // Submit and selection are no-ops while the config error stands.
    assert!(!controller.select_file(fixture_selection()));
    assert_eq!(controller.submit(1_000), SubmitOutcome::Ignored);
    assert_eq!(controller.submit(2_000), SubmitOutcome::Ignored);
    assert_eq!(transport.request_count(), 0);
}
