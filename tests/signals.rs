//! Signal fan-out: handler bookkeeping and delivery of real OS signals.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use loopvisor::{Signal, SignalFanout, SignalHandler, SignalHandlerRef};

#[derive(Default)]
struct Counter {
    hits: AtomicUsize,
}

impl SignalHandler for Counter {
    fn handle_signal(&self, _signal: Signal) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Forwards every signal into a channel.
struct Forward(mpsc::UnboundedSender<Signal>);

impl SignalHandler for Forward {
    fn handle_signal(&self, signal: Signal) {
        let _ = self.0.send(signal);
    }
}

#[test]
fn two_handlers_then_one() {
    let fanout = SignalFanout::new();
    let first = Arc::new(Counter::default());
    let second = Arc::new(Counter::default());
    let first_ref: SignalHandlerRef = first.clone();
    let second_ref: SignalHandlerRef = second.clone();

    fanout.install(first_ref.clone());
    fanout.install(second_ref.clone());
    assert_eq!(fanout.len(), 2);

    fanout.dispatch(Signal::User1);
    assert_eq!(first.hits.load(Ordering::SeqCst), 1);
    assert_eq!(second.hits.load(Ordering::SeqCst), 1);

    fanout.uninstall(&first_ref);
    assert!(!fanout.contains(&first_ref));
    assert!(fanout.contains(&second_ref));

    fanout.dispatch(Signal::User1);
    assert_eq!(first.hits.load(Ordering::SeqCst), 1);
    assert_eq!(second.hits.load(Ordering::SeqCst), 2);
}

#[test]
fn shutdown_signals() {
    assert!(Signal::Interrupt.is_shutdown());
    assert!(Signal::Terminate.is_shutdown());
    assert!(!Signal::User1.is_shutdown());
    assert!(!Signal::WindowChange.is_shutdown());
}

#[cfg(unix)]
#[tokio::test]
async fn os_signal_reaches_every_handler() {
    let fanout = Arc::new(SignalFanout::new());
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    fanout.install(Arc::new(Forward(tx_a)));
    fanout.install(Arc::new(Forward(tx_b)));

    let listener = fanout.spawn_listener().expect("listener starts inside a runtime");

    let sent = std::process::Command::new("kill")
        .arg("-USR1")
        .arg(std::process::id().to_string())
        .status();
    if !sent.is_ok_and(|s| s.success()) {
        eprintln!("skipping: `kill` is not available");
        listener.abort();
        return;
    }

    // The `kill` child also raises SIGCHLD, so skip anything else.
    for rx in [&mut rx_a, &mut rx_b] {
        let got = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(sig) = rx.recv().await {
                if sig == Signal::User1 {
                    return true;
                }
            }
            false
        })
        .await
        .expect("signal delivered in time");
        assert!(got);
    }
    listener.abort();
}
