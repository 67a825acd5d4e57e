//! Domain layer: chat-update model and identifier rules.

pub mod chat_update;
pub mod identifiers;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
