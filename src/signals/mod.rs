//! # Process-wide signal fan-out.
//!
//! Independent of the loop orchestration: any number of [`SignalHandler`]s
//! observe every OS signal the process receives.
//!
//! - [`SignalFanout`] is the handler set plus its listener; create one and call
//!   [`SignalFanout::spawn_listener`] for an explicitly owned instance.
//! - [`install_signal_handler`] / [`uninstall_signal_handler`] operate on a
//!   lazily created process-wide instance whose listener is started by the
//!   first install made inside a tokio runtime (and restarted if the runtime
//!   that hosted it is gone).

mod fanout;
mod os;

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::task::JoinHandle;

pub use fanout::{SignalFanout, SignalHandler, SignalHandlerRef};
pub use os::Signal;

static GLOBAL: OnceLock<Arc<SignalFanout>> = OnceLock::new();
static LISTENER: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);

/// The process-wide fan-out.
fn global() -> &'static Arc<SignalFanout> {
    GLOBAL.get_or_init(|| Arc::new(SignalFanout::new()))
}

/// Installs `handler` on the process-wide fan-out (no-op if already installed)
/// and makes sure the listener is running.
pub fn install_signal_handler(handler: SignalHandlerRef) {
    let fanout = global();
    fanout.install(handler);
    ensure_listener(fanout);
}

/// Uninstalls `handler` from the process-wide fan-out (no-op if absent).
pub fn uninstall_signal_handler(handler: &SignalHandlerRef) {
    global().uninstall(handler);
}

fn ensure_listener(fanout: &Arc<SignalFanout>) {
    let mut listener = LISTENER.lock().unwrap_or_else(PoisonError::into_inner);
    if listener.as_ref().is_some_and(|h| !h.is_finished()) {
        return;
    }
    match fanout.spawn_listener() {
        Ok(handle) => *listener = Some(handle),
        Err(e) => {
            tracing::warn!(target: "loopvisor", "signal listener not started: {e}");
        }
    }
}
