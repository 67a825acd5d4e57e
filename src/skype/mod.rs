//! Skype integration layer: chat-update decoding, handlers, and dispatch.

pub mod builtin;
pub mod connection;
pub mod decoder;
pub mod dispatcher;
pub mod handler;

/// Returns the skype module name for smoke checks.
pub fn module_name() -> &'static str {
    "skype"
}
