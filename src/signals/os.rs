//! # OS signal subscription.
//!
//! [`Signal`] names the signals the listener subscribes to, and
//! [`listen`] drives one task that receives every one of them and hands each
//! delivery to a callback.
//!
//! ## Signals
//! **Unix platforms:** every signal in [`Signal::ALL`]. `SIGKILL`, `SIGSTOP`
//! and the synchronous fault signals (`SIGSEGV`, `SIGBUS`, `SIGILL`, `SIGFPE`)
//! cannot be caught and are not part of the set.
//!
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`], reported as
//! [`Signal::Interrupt`].
//!
//! Once subscribed, a signal no longer has its default action: `SIGINT` and
//! `SIGTERM` stop killing the process and must be handled, typically by a
//! handler calling [`Application::exit`](crate::Application::exit).

use std::fmt;
use std::io;
#[cfg(any(unix, test))]
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

/// A catchable process signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    User1,
    User2,
    Pipe,
    Alarm,
    Terminate,
    Child,
    WindowChange,
    Io,
}

impl Signal {
    /// Every signal the listener subscribes to.
    pub const ALL: [Signal; 11] = [
        Signal::Hangup,
        Signal::Interrupt,
        Signal::Quit,
        Signal::User1,
        Signal::User2,
        Signal::Pipe,
        Signal::Alarm,
        Signal::Terminate,
        Signal::Child,
        Signal::WindowChange,
        Signal::Io,
    ];

    /// Conventional `SIG*` name.
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
            Signal::Pipe => "SIGPIPE",
            Signal::Alarm => "SIGALRM",
            Signal::Terminate => "SIGTERM",
            Signal::Child => "SIGCHLD",
            Signal::WindowChange => "SIGWINCH",
            Signal::Io => "SIGIO",
        }
    }

    /// True for signals that conventionally ask the process to stop.
    pub fn is_shutdown(self) -> bool {
        matches!(self, Signal::Interrupt | Signal::Terminate | Signal::Quit)
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Hangup => SignalKind::hangup(),
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
            Signal::Pipe => SignalKind::pipe(),
            Signal::Alarm => SignalKind::alarm(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Child => SignalKind::child(),
            Signal::WindowChange => SignalKind::window_change(),
            Signal::Io => SignalKind::io(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ensure_runtime() -> io::Result<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Polls `sources` round-robin, starting right after the one that fired last,
/// so a signal delivered in a burst cannot starve the others.
///
/// `Ready(None)` means a source closed.
#[cfg(any(unix, test))]
fn poll_rotating<S>(
    sources: &mut [(Signal, S)],
    cursor: &mut usize,
    cx: &mut Context<'_>,
    mut poll_one: impl FnMut(&mut S, &mut Context<'_>) -> Poll<Option<()>>,
) -> Poll<Option<Signal>> {
    let len = sources.len();
    for step in 0..len {
        let idx = (*cursor + step) % len;
        let (sig, source) = &mut sources[idx];
        match poll_one(source, cx) {
            Poll::Ready(Some(())) => {
                *cursor = (idx + 1) % len;
                return Poll::Ready(Some(*sig));
            }
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }
    }
    Poll::Pending
}

/// Subscribes to every signal and spawns one task calling `on_signal` for
/// each delivery.
///
/// Returns `Err` outside a tokio runtime or if registration fails.
#[cfg(unix)]
pub(crate) fn listen<F>(on_signal: F) -> io::Result<JoinHandle<()>>
where
    F: Fn(Signal) + Send + 'static,
{
    use tokio::signal::unix::signal;

    ensure_runtime()?;
    let mut streams = Signal::ALL
        .iter()
        .map(|&sig| Ok((sig, signal(sig.kind())?)))
        .collect::<io::Result<Vec<_>>>()?;

    Ok(tokio::spawn(async move {
        let mut cursor = 0;
        loop {
            let next = std::future::poll_fn(|cx| {
                poll_rotating(&mut streams, &mut cursor, cx, |stream, cx| stream.poll_recv(cx))
            })
            .await;

            match next {
                Some(sig) => on_signal(sig),
                None => break,
            }
        }
    }))
}

/// Subscribes to Ctrl-C and spawns one task calling `on_signal` for each delivery.
///
/// Returns `Err` outside a tokio runtime.
#[cfg(not(unix))]
pub(crate) fn listen<F>(on_signal: F) -> io::Result<JoinHandle<()>>
where
    F: Fn(Signal) + Send + 'static,
{
    ensure_runtime()?;
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            on_signal(Signal::Interrupt);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Signal::ALL.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Signal::ALL.len());
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
    }

    fn next(sources: &mut [(Signal, bool)], cursor: &mut usize) -> Poll<Option<Signal>> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        poll_rotating(sources, cursor, &mut cx, |ready, _| match *ready {
            true => Poll::Ready(Some(())),
            false => Poll::Pending,
        })
    }

    #[test]
    fn test_busy_signal_does_not_starve_the_rest() {
        let mut sources = [
            (Signal::Hangup, true),
            (Signal::Interrupt, false),
            (Signal::Terminate, true),
        ];
        let mut cursor = 0;

        assert_eq!(next(&mut sources, &mut cursor), Poll::Ready(Some(Signal::Hangup)));
        assert_eq!(next(&mut sources, &mut cursor), Poll::Ready(Some(Signal::Terminate)));
        assert_eq!(next(&mut sources, &mut cursor), Poll::Ready(Some(Signal::Hangup)));

        sources[0].1 = false;
        sources[2].1 = false;
        assert_eq!(next(&mut sources, &mut cursor), Poll::Pending);
        assert_eq!(next(&mut [], &mut cursor), Poll::Pending);
    }

    #[test]
    fn test_listen_requires_runtime() {
        assert!(listen(|_| {}).is_err());
    }
}
