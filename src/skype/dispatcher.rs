use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::runtime::Handle;

use crate::{domain::chat_update::ChatUpdate, skype::handler::Handler};

const CHAT_UPDATE_HANDLER_PANICKED: &str = "CHAT_UPDATE_HANDLER_PANICKED";

/// Decides per handler whether delivery happens inline (`true`) or on a
/// concurrent task (`false`).
pub type SyncPolicy = dyn Fn(&dyn Handler) -> bool + Send + Sync;

/// Delivers decoded chat updates to every capable handler.
///
/// Concurrent deliveries run on the runtime's blocking pool and are never
/// awaited by [`ChatUpdateDispatcher::dispatch`]. Every handler callback runs
/// behind a panic boundary that logs the panic and counts it.
#[derive(Debug, Clone)]
pub struct ChatUpdateDispatcher {
    runtime: Handle,
    handler_panics: Arc<AtomicUsize>,
}

impl ChatUpdateDispatcher {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            handler_panics: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of handler callbacks that panicked so far, inline or concurrent.
    pub fn handler_panics(&self) -> usize {
        self.handler_panics.load(Ordering::Relaxed)
    }

    pub fn dispatch(
        &self,
        update: ChatUpdate,
        handlers: &[Arc<dyn Handler>],
        sync_policy: &SyncPolicy,
    ) {
        let update = Arc::new(update);

        for handler in handlers {
            if handler.as_chat_update_handler().is_none() {
                continue;
            }

            if sync_policy(handler.as_ref()) {
                deliver(&self.handler_panics, handler.as_ref(), &update);
            } else {
                let handler = Arc::clone(handler);
                let update = Arc::clone(&update);
                let panics = Arc::clone(&self.handler_panics);
                // Fire and forget; nothing joins this task.
                drop(self.runtime.spawn_blocking(move || {
                    deliver(&panics, handler.as_ref(), &update)
                }));
            }
        }
    }

    /// Runs `callback` for `handler` behind the same panic boundary used for
    /// chat-update delivery.
    pub(crate) fn isolate<F>(&self, handler: &dyn Handler, callback: &'static str, run: F)
    where
        F: FnOnce(),
    {
        isolate(&self.handler_panics, handler, callback, run);
    }
}

fn deliver(panics: &AtomicUsize, handler: &dyn Handler, update: &ChatUpdate) {
    let Some(chat_update_handler) = handler.as_chat_update_handler() else {
        return;
    };

    isolate(panics, handler, "handle_chat_update", || {
        chat_update_handler.handle_chat_update(update)
    });
}

fn isolate<F>(panics: &AtomicUsize, handler: &dyn Handler, callback: &'static str, run: F)
where
    F: FnOnce(),
{
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(run)) {
        panics.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            code = CHAT_UPDATE_HANDLER_PANICKED,
            handler = handler.name(),
            callback,
            panic = %panic_message(payload.as_ref()),
            "handler panicked; continuing with remaining handlers"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic payload omitted".to_owned())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            mpsc::{self, Sender},
            Barrier, Mutex,
        },
        thread,
        time::{Duration, Instant},
    };

    use tokio::runtime::Runtime;

    use super::*;
    use crate::{
        domain::chat_update::{ChatUpdateCommand, ChatUpdateData},
        skype::handler::ChatUpdateHandler,
    };

    const WAIT: Duration = Duration::from_secs(5);

    fn update() -> ChatUpdate {
        ChatUpdate {
            chat_id: "123-456@g.us".to_owned(),
            command: ChatUpdateCommand::Action,
            data: ChatUpdateData::default(),
        }
    }

    fn runtime() -> Runtime {
        Runtime::new().expect("test runtime should start")
    }

    struct Recording {
        name: &'static str,
        seen: Sender<&'static str>,
        gate: Option<Arc<Barrier>>,
    }

    impl Handler for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
            Some(self)
        }
    }

    impl ChatUpdateHandler for Recording {
        fn handle_chat_update(&self, _update: &ChatUpdate) {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            let _ = self.seen.send(self.name);
        }
    }

    struct Panicking;

    impl Handler for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn as_chat_update_handler(&self) -> Option<&dyn ChatUpdateHandler> {
            Some(self)
        }
    }

    impl ChatUpdateHandler for Panicking {
        fn handle_chat_update(&self, _update: &ChatUpdate) {
            panic!("handler exploded");
        }
    }

    struct Incapable {
        polled: Mutex<u32>,
    }

    impl Handler for Incapable {
        fn name(&self) -> &str {
            "incapable"
        }
    }

    fn recording(name: &'static str, seen: &Sender<&'static str>) -> Arc<dyn Handler> {
        Arc::new(Recording {
            name,
            seen: seen.clone(),
            gate: None,
        })
    }

    fn gated(
        name: &'static str,
        seen: &Sender<&'static str>,
        gate: &Arc<Barrier>,
    ) -> Arc<dyn Handler> {
        Arc::new(Recording {
            name,
            seen: seen.clone(),
            gate: Some(Arc::clone(gate)),
        })
    }

    fn sync_named(names: &'static [&'static str]) -> impl Fn(&dyn Handler) -> bool + Send + Sync {
        move |handler: &dyn Handler| names.iter().any(|name| *name == handler.name())
    }

    #[test]
    fn sync_handlers_finish_before_dispatch_returns() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let (tx, rx) = mpsc::channel();
        let gate = Arc::new(Barrier::new(3));
        let handlers = vec![
            recording("a", &tx),
            gated("b", &tx, &gate),
            gated("c", &tx, &gate),
        ];

        dispatcher.dispatch(update(), &handlers, &sync_named(&["a"]));

        // b and c are parked on the barrier, so only a can have reported.
        assert_eq!(rx.try_recv(), Ok("a"));
        assert!(rx.try_recv().is_err());

        gate.wait();
        let mut concurrent = vec![
            rx.recv_timeout(WAIT).expect("b or c should run"),
            rx.recv_timeout(WAIT).expect("b or c should run"),
        ];
        concurrent.sort_unstable();
        assert_eq!(concurrent, ["b", "c"]);
    }

    #[test]
    fn sync_handlers_run_in_registration_order() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let (tx, rx) = mpsc::channel();
        let handlers = vec![recording("first", &tx), recording("second", &tx)];

        dispatcher.dispatch(update(), &handlers, &|_: &dyn Handler| true);

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn incapable_handlers_are_skipped() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let (tx, rx) = mpsc::channel();
        let incapable = Arc::new(Incapable {
            polled: Mutex::new(0),
        });
        let handlers = vec![incapable.clone() as Arc<dyn Handler>, recording("a", &tx)];
        let counter = Arc::clone(&incapable);

        dispatcher.dispatch(update(), &handlers, &move |handler: &dyn Handler| {
            if handler.name() == "incapable" {
                *counter.polled.lock().expect("counter lock") += 1;
            }
            true
        });

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), ["a"]);
        assert_eq!(*incapable.polled.lock().expect("counter lock"), 0);
    }

    #[test]
    fn panicking_sync_handler_does_not_block_siblings() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let (tx, rx) = mpsc::channel();
        let handlers = vec![Arc::new(Panicking) as Arc<dyn Handler>, recording("after", &tx)];

        dispatcher.dispatch(update(), &handlers, &|_: &dyn Handler| true);

        assert_eq!(rx.try_recv(), Ok("after"));
        assert_eq!(dispatcher.handler_panics(), 1);
    }

    #[test]
    fn panicking_async_handler_is_isolated() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let (tx, rx) = mpsc::channel();
        let handlers = vec![Arc::new(Panicking) as Arc<dyn Handler>, recording("after", &tx)];

        dispatcher.dispatch(update(), &handlers, &|_: &dyn Handler| false);
        assert_eq!(rx.recv_timeout(WAIT), Ok("after"));

        dispatcher.dispatch(update(), &handlers, &|_: &dyn Handler| false);
        assert_eq!(rx.recv_timeout(WAIT), Ok("after"));

        // Both panics are caught by the dispatcher's boundary, not by tokio.
        wait_for_panics(&dispatcher, 2);
    }

    #[test]
    fn isolate_contains_panics_from_other_callbacks() {
        let runtime = runtime();
        let dispatcher = ChatUpdateDispatcher::new(runtime.handle().clone());
        let mut ran_after = false;

        dispatcher.isolate(&Panicking, "handle_decode_error", || panic!("hook exploded"));
        dispatcher.isolate(&Panicking, "handle_decode_error", || ran_after = true);

        assert!(ran_after);
        assert_eq!(dispatcher.handler_panics(), 1);
    }

    fn wait_for_panics(dispatcher: &ChatUpdateDispatcher, expected: usize) {
        let deadline = Instant::now() + WAIT;
        while dispatcher.handler_panics() < expected {
            assert!(
                Instant::now() < deadline,
                "expected {expected} handler panics, saw {}",
                dispatcher.handler_panics()
            );
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(dispatcher.handler_panics(), expected);
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&"boom".to_owned()), "boom");
        assert_eq!(panic_message(&42_u8), "panic payload omitted");
    }
}
