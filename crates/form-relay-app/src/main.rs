#![warn(missing_docs)]
//! # form-relay-app binary
//!
//! Minimal runtime entry point: prints the version and footer year stamp
//! the host page consumes. Form orchestration is exercised through the
//! library surface.

/// CLI entry point.
fn main() {
    println!("form-relay-app {}", form_relay_app::app_version());
    println!("footer year stamp: {}", form_relay_app::current_year_stamp());
}
