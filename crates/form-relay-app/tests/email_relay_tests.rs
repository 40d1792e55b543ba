//! Integration tests for the email-relay strategy end to end.

mod common;

use std::sync::Arc;

use common::{
    CountingIdentityProvider, EMAIL_MANIFEST, RecordingTransport, bind_single, fixture_selection,
};
use form_relay_app::SubmitOutcome;

#[test]
fn email_relay_tests_payload_carries_fields_attachment_and_recipient() {
    let identity = Arc::new(CountingIdentityProvider::granting());
    let transport = Arc::new(RecordingTransport::replying(200, "OK"));
    let mut controller = bind_single(EMAIL_MANIFEST, identity.clone(), transport.clone());

    controller.push_field("from_name", "Ana");
    assert!(controller.select_file(fixture_selection()));
    assert_eq!(controller.submit(1_000), SubmitOutcome::Succeeded);

    // The email strategy never opens a consent prompt.
    assert_eq!(identity.interactive_prompt_count(), 0);

    let request = transport.last_request();
    assert_eq!(request.content_type, "application/json");
    assert_eq!(request.authorization, None);

    let payload: serde_json::Value =
        serde_json::from_slice(&request.body).expect("payload is json");
    assert_eq!(payload["service_id"], "service-1");
    assert_eq!(payload["template_params"]["from_name"], "Ana");
    assert_eq!(payload["template_params"]["file_name"], "Tarea1_Juan.pdf");
    assert_eq!(
        payload["template_params"]["to_email"],
        "docente@example.edu"
    );
    let attachment = payload["template_params"]["attachment"]
        .as_str()
        .expect("attachment is a string");
    assert!(attachment.starts_with("data:application/pdf;base64,"));
}
