use crate::{domain::chat_update::ChatUpdate, skype::decoder::DecodeError};

/// A handler registered on a [`ChatUpdateConnection`](crate::skype::connection::ChatUpdateConnection).
///
/// Handlers opt into event kinds through capability queries; the default
/// implementations opt out.
pub trait Handler: Send + Sync {
    /// Stable name used by the sync policy and in logs.
    fn name(&self) -> &str;

    fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
        None
    }

    /// Called inline when an inbound message could not be decoded.
    fn handle_decode_error(&self, _error: &DecodeError) {}
}

pub trait ChatUpdateHandler: Send + Sync {
    fn handle_chat_update(&self, update: &ChatUpdate);
}
