//! # Fault isolation boundary.
//!
//! [`isolate`] polls a future under `catch_unwind` and turns a panic into a
//! [`Caught`] value: the recovered payload plus the stack captured **at the
//! panic site**, before unwinding.
//!
//! ## How the stack is captured
//! ```text
//! isolate(fut)
//!   └─ catch_unwind(Guarded(fut))
//!        └─ poll: DEPTH += 1 ─► fut.poll() ─► panic!
//!                                  └─ hook: DEPTH > 0 → STACK = Backtrace::force_capture()
//!        ◄─ Err(payload)       (same thread, same poll)
//!   └─ take_stack()  ─► STACK
//! ```
//!
//! The hook is installed once per process and chains to the previous hook for
//! panics raised outside any boundary, so ordinary panics keep their usual
//! report.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

use futures::FutureExt;

use crate::error::FaultPayload;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A panic recovered by [`isolate`].
pub(crate) struct Caught {
    pub payload: FaultPayload,
    pub stack: String,
}

/// Installs the stack-capturing panic hook (idempotent).
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if DEPTH.with(Cell::get) > 0 {
                let stack = Backtrace::force_capture().to_string();
                STACK.with(|s| *s.borrow_mut() = Some(stack));
            } else {
                previous(info);
            }
        }));
    });
}

/// Captures the current stack as a string.
pub(crate) fn capture_stack() -> String {
    Backtrace::force_capture().to_string()
}

/// Polls `fut` to completion, converting a panic into [`Caught`].
pub(crate) async fn isolate<F>(fut: F) -> Result<F::Output, Caught>
where
    F: Future + Unpin,
{
    install_hook();
    match AssertUnwindSafe(Guarded { inner: fut }).catch_unwind().await {
        Ok(out) => Ok(out),
        Err(payload) => Err(Caught {
            payload: FaultPayload::from_panic(payload),
            stack: take_stack(),
        }),
    }
}

/// Stack recorded by the hook for the last panic on this thread.
fn take_stack() -> String {
    STACK
        .with(|s| s.borrow_mut().take())
        .unwrap_or_else(capture_stack)
}

/// Marks every poll of the inner future as running inside a boundary.
struct Guarded<F> {
    inner: F,
}

impl<F: Future + Unpin> Future for Guarded<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _depth = DepthGuard::enter();
        Pin::new(&mut self.inner).poll(cx)
    }
}

/// Restores `DEPTH` on exit, including during unwinding.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
