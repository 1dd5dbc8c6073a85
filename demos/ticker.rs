//! # Example: ticker
//!
//! One loop, restarted after a panic, ending the application from inside.
//!
//! Demonstrates how to:
//! - Implement [`Loop`] on top of [`BaseLoop`].
//! - Restart a loop after it panicked, driven by the fault stream.
//! - Call [`Application::exit`] from inside a loop and wait for the
//!   shutdown with [`ExitSignal`](loopvisor::ExitSignal).
//! - Route Ctrl-C / SIGTERM to `exit()` through the signal fan-out.
//!
//! ## Flow
//! ```text
//! control loop ──► "2 seconds" ──► mainLoop panics (bad duration)
//!      ◄── Fault::Runtime ──┘
//!      ├─► start("mainLoop")
//!      └─► "2s" ──► mainLoop re-arms its ticker
//!                        └─► tick ─► exit() ─► pause/terminate ─► ExitSignal
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example ticker
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, Interval, interval_at};
use tracing_subscriber::EnvFilter;

use loopvisor::{
    Application, BaseLoop, Config, Control, Loop, Rendezvous, Signal, SignalHandler,
    SignalHandlerRef, install_signal_handler, print, uninstall_signal_handler,
};

/// Parses `"<n>ms"`, `"<n>s"` or `"<n>m"`.
fn parse_duration(text: &str) -> Option<Duration> {
    let split = text.find(|c: char| !c.is_ascii_digit())?;
    let (n, unit) = text.split_at(split);
    let n: u64 = n.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => Some(Duration::from_secs(n * 60)),
        _ => None,
    }
}

fn every(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}

struct TickerState {
    durations: mpsc::UnboundedReceiver<String>,
    ticker: Interval,
}

/// Exits the application when its ticker fires.
struct TickerLoop {
    base: BaseLoop,
    app: Weak<Application>,
    durations: mpsc::UnboundedSender<String>,
    state: Mutex<TickerState>,
}

impl TickerLoop {
    fn new(app: &Arc<Application>) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            base: BaseLoop::new(),
            app: Arc::downgrade(app),
            durations: tx,
            state: Mutex::new(TickerState {
                durations: rx,
                ticker: every(Duration::from_secs(10)),
            }),
        })
    }

    fn send(&self, duration: &str) {
        let _ = self.durations.send(duration.to_string());
    }
}

#[async_trait]
impl Loop for TickerLoop {
    async fn run(&self) {
        let mut state = self.state.lock().await;
        let TickerState { durations, ticker } = &mut *state;

        loop {
            tokio::select! {
                ctl = self.base.control() => match ctl {
                    Control::Pause(ack) => ack.ack(),
                    Control::Terminate(ack) => {
                        ack.ack();
                        return;
                    }
                },
                _ = ticker.tick() => {
                    if let Some(app) = self.app.upgrade() {
                        app.exit();
                    }
                }
                Some(text) = durations.recv() => {
                    let Some(period) = parse_duration(&text) else {
                        panic!("cannot parse duration {text:?}");
                    };
                    *ticker = every(period);
                    print(format_args!("new duration received, running for {text}..."));
                }
            }
        }
    }

    fn pause_signal(&self) -> &Rendezvous {
        self.base.pause_signal()
    }

    fn terminate_signal(&self) -> &Rendezvous {
        self.base.terminate_signal()
    }
}

/// Turns Ctrl-C and SIGTERM into an orderly shutdown.
struct ExitOnShutdown(Weak<Application>);

impl SignalHandler for ExitOnShutdown {
    fn handle_signal(&self, signal: Signal) {
        if signal.is_shutdown()
            && let Some(app) = self.0.upgrade()
        {
            print(format_args!("{signal} received"));
            app.exit();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Config {
        verbose: true,
        ..Config::default()
    };
    let app = Application::new(cfg);
    let mut faults = app.take_faults().context("fault stream already taken")?;
    let mut exited = app.exit_signal();

    let main_loop = TickerLoop::new(&app);
    app.register("mainLoop", main_loop.clone()).await?;

    let on_signal: SignalHandlerRef = Arc::new(ExitOnShutdown(Arc::downgrade(&app)));
    install_signal_handler(on_signal.clone());

    let runner = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run().await })
    };

    print(format_args!("sending a wrong duration to mainLoop"));
    main_loop.send("2 seconds");

    loop {
        tokio::select! {
            _ = exited.wait() => {
                print(format_args!("very last message before exiting"));
                break;
            }
            Some(fault) = faults.recv() => {
                print(format_args!("a fault was received: \"{fault}\""));
                app.start("mainLoop").await?;
                main_loop.send("2s");
            }
        }
    }

    uninstall_signal_handler(&on_signal);
    runner.await?;
    Ok(())
}
