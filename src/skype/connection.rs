use std::{collections::HashSet, sync::Arc};

use crate::skype::{
    decoder::{ChatUpdateDecoder, DecodeError},
    dispatcher::{ChatUpdateDispatcher, SyncPolicy},
    handler::Handler,
};

const CHAT_UPDATE_DECODE_FAILED: &str = "CHAT_UPDATE_DECODE_FAILED";

/// Connection-side owner of the handler registry and delivery policy.
pub struct ChatUpdateConnection {
    decoder: ChatUpdateDecoder,
    dispatcher: ChatUpdateDispatcher,
    handlers: Vec<Arc<dyn Handler>>,
    sync_policy: Box<SyncPolicy>,
}

impl ChatUpdateConnection {
    pub fn new(
        decoder: ChatUpdateDecoder,
        dispatcher: ChatUpdateDispatcher,
        sync_policy: Box<SyncPolicy>,
    ) -> Self {
        Self {
            decoder,
            dispatcher,
            handlers: Vec::new(),
            sync_policy,
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn Handler>) {
        tracing::debug!(handler = handler.name(), "chat update handler registered");
        self.handlers.push(handler);
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn should_call_synchronously(&self, handler: &dyn Handler) -> bool {
        (self.sync_policy)(handler)
    }

    pub fn handler_panics(&self) -> usize {
        self.dispatcher.handler_panics()
    }

    /// Decodes one inbound chat-update message and hands it to dispatch.
    ///
    /// A decode failure is reported to every handler and returned; it only
    /// drops this message.
    pub fn handle_message(&self, raw: &[u8]) -> Result<(), DecodeError> {
        let update = match self.decoder.decode(raw) {
            Ok(update) => update,
            Err(error) => {
                self.report_decode_error(&error);
                return Err(error);
            }
        };

        tracing::debug!(
            chat_id = %update.chat_id,
            command = update.command.as_wire(),
            action_type = update.data.action_type.as_ref().map(|t| t.as_wire()),
            "chat update decoded"
        );

        self.dispatcher
            .dispatch(update, &self.handlers, self.sync_policy.as_ref());
        Ok(())
    }

    fn report_decode_error(&self, error: &DecodeError) {
        tracing::warn!(
            code = CHAT_UPDATE_DECODE_FAILED,
            kind = error.code(),
            error = %error,
            "dropping chat update that failed to decode"
        );

        for handler in &self.handlers {
            self.dispatcher.isolate(handler.as_ref(), "handle_decode_error", || {
                handler.handle_decode_error(error)
            });
        }
    }
}

impl std::fmt::Debug for ChatUpdateConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatUpdateConnection")
            .field("decoder", &self.decoder)
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Policy that delivers inline to the handlers named in `names` and
/// concurrently to everyone else.
pub fn named_sync_policy<I, S>(names: I) -> Box<SyncPolicy>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Box::new(move |handler: &dyn Handler| names.contains(handler.name()))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        mpsc::{self, Sender},
        Mutex,
    };

    use tokio::runtime::Runtime;

    use super::*;
    use crate::{
        domain::{
            chat_update::{ChatAction, ChatUpdate},
            identifiers::SuffixRule,
        },
        skype::handler::ChatUpdateHandler,
    };

    struct Collector {
        name: &'static str,
        updates: Sender<ChatUpdate>,
        decode_errors: Mutex<Vec<&'static str>>,
    }

    impl Collector {
        fn new(name: &'static str, updates: Sender<ChatUpdate>) -> Self {
            Self {
                name,
                updates,
                decode_errors: Mutex::new(Vec::new()),
            }
        }
    }

    impl Handler for Collector {
        fn name(&self) -> &str {
            self.name
        }

        fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
            Some(self)
        }

        fn handle_decode_error(&self, error: &DecodeError) {
            self.decode_errors
                .lock()
                .expect("decode error lock")
                .push(error.code());
        }
    }

    impl ChatUpdateHandler for Collector {
        fn handle_chat_update(&self, update: &ChatUpdate) {
            let _ = self.updates.send(update.clone());
        }
    }

    struct PanickingHook;

    impl Handler for PanickingHook {
        fn name(&self) -> &str {
            "panicking-hook"
        }

        fn handle_decode_error(&self, _error: &DecodeError) {
            panic!("decode error hook exploded");
        }
    }

    fn connection(runtime: &Runtime) -> ChatUpdateConnection {
        ChatUpdateConnection::new(
            ChatUpdateDecoder::new(SuffixRule::new("@legacy", "@new")),
            ChatUpdateDispatcher::new(runtime.handle().clone()),
            named_sync_policy(["inline"]),
        )
    }

    #[test]
    fn named_policy_matches_handler_names() {
        let runtime = Runtime::new().expect("test runtime should start");
        let (tx, _rx) = mpsc::channel();
        let connection = connection(&runtime);

        assert!(connection.should_call_synchronously(&Collector::new("inline", tx.clone())));
        assert!(!connection.should_call_synchronously(&Collector::new("other", tx)));
    }

    #[test]
    fn decoded_message_reaches_registered_handler() {
        let runtime = Runtime::new().expect("test runtime should start");
        let (tx, rx) = mpsc::channel();
        let mut connection = connection(&runtime);
        connection.add_handler(Arc::new(Collector::new("inline", tx)));

        connection
            .handle_message(
                br#"{"id":"123-456@legacy","cmd":"action","data":["announce","alice@legacy",true]}"#,
            )
            .expect("message should decode");

        let update = rx.try_recv().expect("inline handler should have run");
        assert_eq!(update.chat_id, "123-456@new");
        assert_eq!(update.data.sender_id, "alice@new");
        assert_eq!(update.data.action, Some(ChatAction::Announce(true)));
    }

    #[test]
    fn decode_failure_is_reported_to_handlers_and_not_dispatched() {
        let runtime = Runtime::new().expect("test runtime should start");
        let (tx, rx) = mpsc::channel();
        let collector = Arc::new(Collector::new("inline", tx));
        let mut connection = connection(&runtime);
        connection.add_handler(collector.clone());

        let error = connection
            .handle_message(br#"{"id":"x","cmd":"action","data":["restrict","a","yes"]}"#)
            .expect_err("restrict payload must be a bool");

        assert!(matches!(error, DecodeError::MalformedActionPayload { .. }));
        assert!(rx.try_recv().is_err());
        assert_eq!(
            *collector.decode_errors.lock().expect("decode error lock"),
            ["CHAT_UPDATE_MALFORMED_ACTION_PAYLOAD"]
        );

        connection
            .handle_message(br#"{"id":"x","cmd":"action","data":["restrict","a",true]}"#)
            .expect("next message should still decode");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn panicking_decode_error_hook_does_not_skip_siblings() {
        let runtime = Runtime::new().expect("test runtime should start");
        let (tx, _rx) = mpsc::channel();
        let collector = Arc::new(Collector::new("inline", tx));
        let mut connection = connection(&runtime);
        connection.add_handler(Arc::new(PanickingHook));
        connection.add_handler(collector.clone());

        let error = connection
            .handle_message(b"not json")
            .expect_err("garbage must not decode");

        assert!(matches!(error, DecodeError::MalformedEnvelope(_)));
        assert_eq!(
            *collector.decode_errors.lock().expect("decode error lock"),
            ["CHAT_UPDATE_MALFORMED_ENVELOPE"]
        );
        assert_eq!(connection.handler_panics(), 1);
    }
}
