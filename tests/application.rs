//! End-to-end behavior of `Application`: registration, run, faults and the
//! two-phase shutdown.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use loopvisor::{
    Application, BaseLoop, Config, Control, Event, EventKind, Fault, Loop, LoopError, Phase,
    Rendezvous,
};

const LIMIT: Duration = Duration::from_secs(5);

// ---- Test loops ----

enum Cmd {
    Next,
    Count(oneshot::Sender<i64>),
}

/// Adds 2 on every `Next`, reports its total on `Count`.
struct CountLoop {
    base: BaseLoop,
    count: AtomicI64,
    paused: AtomicUsize,
    terminated: AtomicUsize,
    tx: mpsc::UnboundedSender<Cmd>,
    rx: Mutex<mpsc::UnboundedReceiver<Cmd>>,
}

impl CountLoop {
    fn arc(initial: i64) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            base: BaseLoop::new(),
            count: AtomicI64::new(initial),
            paused: AtomicUsize::new(0),
            terminated: AtomicUsize::new(0),
            tx,
            rx: Mutex::new(rx),
        })
    }

    fn next(&self) {
        let _ = self.tx.send(Cmd::Next);
    }

    async fn count(&self) -> i64 {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(Cmd::Count(tx));
        rx.await.expect("loop answers count queries")
    }
}

#[async_trait]
impl Loop for CountLoop {
    async fn run(&self) {
        let mut cmds = self.rx.lock().await;
        loop {
            tokio::select! {
                ctl = self.base.control() => match ctl {
                    Control::Pause(ack) => {
                        self.paused.fetch_add(1, Ordering::SeqCst);
                        ack.ack();
                    }
                    Control::Terminate(ack) => {
                        self.terminated.fetch_add(1, Ordering::SeqCst);
                        ack.ack();
                        return;
                    }
                },
                Some(cmd) = cmds.recv() => match cmd {
                    Cmd::Next => {
                        self.count.fetch_add(2, Ordering::SeqCst);
                    }
                    Cmd::Count(reply) => {
                        let _ = reply.send(self.count.load(Ordering::SeqCst));
                    }
                },
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

enum Raise {
    Message,
    Error,
}

/// Panics on demand, either with a string or with an error value.
struct PanicLoop {
    base: BaseLoop,
    tx: mpsc::UnboundedSender<Raise>,
    rx: Mutex<mpsc::UnboundedReceiver<Raise>>,
}

impl PanicLoop {
    fn arc() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            base: BaseLoop::new(),
            tx,
            rx: Mutex::new(rx),
        })
    }

    fn raise(&self, how: Raise) {
        let _ = self.tx.send(how);
    }
}

#[async_trait]
impl Loop for PanicLoop {
    async fn run(&self) {
        let mut raises = self.rx.lock().await;
        loop {
            tokio::select! {
                ctl = self.base.control() => match ctl {
                    Control::Pause(ack) => ack.ack(),
                    Control::Terminate(ack) => {
                        ack.ack();
                        return;
                    }
                },
                Some(how) = raises.recv() => match how {
                    Raise::Message => panic!("That's an error!"),
                    Raise::Error => {
                        let err: Box<dyn std::error::Error + Send + Sync> =
                            "That's an error!".into();
                        std::panic::panic_any(err);
                    }
                },
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

/// Shared instrumentation for the shutdown barrier.
#[derive(Default)]
struct BarrierCounters {
    paused: AtomicUsize,
    paused_at_first_terminate: OnceLock<usize>,
}

struct BarrierLoop {
    base: BaseLoop,
    counters: Arc<BarrierCounters>,
}

#[async_trait]
impl Loop for BarrierLoop {
    async fn run(&self) {
        loop {
            match self.base.control().await {
                Control::Pause(ack) => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    self.counters.paused.fetch_add(1, Ordering::SeqCst);
                    ack.ack();
                }
                Control::Terminate(ack) => {
                    self.counters
                        .paused_at_first_terminate
                        .get_or_init(|| self.counters.paused.load(Ordering::SeqCst));
                    ack.ack();
                    return;
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

/// Never looks at its control points.
struct DeafLoop {
    base: BaseLoop,
}

#[async_trait]
impl Loop for DeafLoop {
    async fn run(&self) {
        std::future::pending::<()>().await;
    }

    fn pause_signal(&self) -> &Rendezvous {
        self.base.pause_signal()
    }

    fn terminate_signal(&self) -> &Rendezvous {
        self.base.terminate_signal()
    }
}

// ---- Helpers ----

fn spawn_run(app: &Arc<Application>) -> JoinHandle<()> {
    let app = Arc::clone(app);
    tokio::spawn(async move { app.run().await })
}

async fn wait_running(app: &Application) {
    timeout(LIMIT, async {
        while !app.is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("application did not start");
}

async fn drain_until_exit(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    timeout(LIMIT, async {
        while let Ok(ev) = rx.recv().await {
            let done = ev.kind == EventKind::ApplicationExited;
            seen.push(ev);
            if done {
                break;
            }
        }
    })
    .await
    .expect("ApplicationExited was not published");
    seen
}

// ---- Tests ----

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn counters_run_and_shut_down() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let odd = CountLoop::arc(0);
    let even = CountLoop::arc(1);
    app.register("oddLoop", odd.clone()).await?;
    app.register("evenLoop", even.clone()).await?;
    assert_eq!(app.running_count(), 2);

    let runner = spawn_run(&app);

    odd.next();
    odd.next();
    assert_eq!(timeout(LIMIT, odd.count()).await?, 4);

    even.next();
    even.next();
    assert_eq!(timeout(LIMIT, even.count()).await?, 5);

    app.exit();
    timeout(LIMIT, runner).await??;

    for lp in [&odd, &even] {
        assert_eq!(lp.paused.load(Ordering::SeqCst), 1);
        assert_eq!(lp.terminated.load(Ordering::SeqCst), 1);
    }
    assert_eq!(app.running_count(), 0);
    assert!(app.names().await.is_empty());
    assert_eq!(app.phase(), Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let first = CountLoop::arc(0);
    app.register("oddLoop", first.clone()).await?;

    let err = app
        .register("oddLoop", CountLoop::arc(7))
        .await
        .expect_err("second registration must fail");
    assert_eq!(
        err,
        LoopError::DuplicateName {
            name: "oddLoop".into()
        }
    );
    assert_eq!(app.running_count(), 1);

    let kept = app.lookup("oddLoop").await?;
    let first_ref: Arc<dyn Loop> = first;
    assert!(Arc::ptr_eq(&kept, &first_ref));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_run_reports_rerun_fault() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let mut faults = app.take_faults().expect("fault stream available once");
    assert!(app.take_faults().is_none());
    app.register("oddLoop", CountLoop::arc(0)).await?;

    let runner = spawn_run(&app);
    wait_running(&app).await;

    timeout(LIMIT, app.run()).await?;
    let fault = timeout(LIMIT, faults.recv())
        .await?
        .expect("fault stream open");
    assert!(fault.is_rerun());
    assert_eq!(fault.as_label(), "fault_rerun");
    assert!(!fault.envelope().stack().is_empty());
    assert_eq!(fault.to_string(), "run cannot be called more than once");

    // The rejected call left the running cycle alone.
    assert_eq!(app.phase(), Phase::Running);
    assert_eq!(app.running_count(), 1);

    app.exit();
    timeout(LIMIT, runner).await??;
    assert!(faults.try_recv().is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panics_are_reported_and_loop_restarts() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let mut faults = app.take_faults().expect("fault stream available once");
    let panicky = PanicLoop::arc();
    app.register("panicLoop", panicky.clone()).await?;

    let runner = spawn_run(&app);

    for (round, how) in [Raise::Message, Raise::Error].into_iter().enumerate() {
        panicky.raise(how);
        let fault = timeout(LIMIT, faults.recv())
            .await?
            .expect("fault stream open");
        assert!(matches!(fault, Fault::Runtime(_)));
        assert_eq!(fault.to_string(), "That's an error!");
        assert_eq!(fault.envelope().name(), Some("panicLoop"));
        assert!(!fault.envelope().stack().is_empty());

        if round == 0 {
            let err = app.start("panicLoo").await.expect_err("unknown name");
            assert!(matches!(err, LoopError::NotFound { .. }));
        }
        // Still registered; restart it.
        assert_eq!(app.running_count(), 1);
        app.start("panicLoop").await?;
    }

    app.exit();
    timeout(LIMIT, runner).await??;
    assert_eq!(app.running_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_loop_pauses_before_any_terminates() -> anyhow::Result<()> {
    const N: usize = 6;

    let app = Application::new(Config::default());
    let counters = Arc::new(BarrierCounters::default());
    for i in 0..N {
        let lp = Arc::new(BarrierLoop {
            base: BaseLoop::new(),
            counters: counters.clone(),
        });
        app.register(&format!("loop-{i}"), lp).await?;
    }
    let mut events = app.subscribe();

    let runner = spawn_run(&app);
    wait_running(&app).await;
    app.exit();
    timeout(LIMIT, runner).await??;

    assert_eq!(counters.paused_at_first_terminate.get(), Some(&N));

    let seen = drain_until_exit(&mut events).await;
    let last_paused = seen
        .iter()
        .filter(|e| e.kind == EventKind::LoopPaused)
        .map(|e| e.seq)
        .max()
        .expect("pause events");
    let first_terminate = seen
        .iter()
        .filter(|e| e.kind == EventKind::TerminateRequested)
        .map(|e| e.seq)
        .min()
        .expect("terminate events");
    assert!(last_paused < first_terminate);

    let count = |kind| seen.iter().filter(|e| e.kind == kind).count();
    assert_eq!(count(EventKind::LoopStarting), N);
    assert_eq!(count(EventKind::LoopPaused), N);
    assert_eq!(count(EventKind::LoopTerminated), N);
    assert_eq!(count(EventKind::ExitRequested), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exit_is_one_shot_per_cycle() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let mut exited = app.exit_signal();
    app.register("first", CountLoop::arc(0)).await?;

    let runner = spawn_run(&app);
    wait_running(&app).await;
    app.exit();
    assert!(app.is_closing());
    app.exit();
    assert_eq!(timeout(LIMIT, exited.wait()).await?, Some(1));
    timeout(LIMIT, runner).await??;
    assert!(!app.is_closing());

    // A finished application can run again with new loops.
    app.register("second", CountLoop::arc(0)).await?;
    let runner = spawn_run(&app);
    wait_running(&app).await;
    app.exit();
    assert_eq!(timeout(LIMIT, exited.wait()).await?, Some(2));
    timeout(LIMIT, runner).await??;
    assert_eq!(exited.completed(), 2);
    assert_eq!(app.running_count(), 0);

    // Once a cycle has completed, exit() arms the next one instead of being ignored.
    let mut events = app.subscribe();
    app.exit();
    assert!(app.is_closing());
    assert_eq!(events.try_recv()?.kind, EventKind::ExitRequested);

    let third = CountLoop::arc(0);
    app.register("third", third.clone()).await?;
    timeout(LIMIT, app.run()).await?;
    assert_eq!(third.terminated.load(Ordering::SeqCst), 1);
    assert_eq!(exited.completed(), 3);
    assert!(!app.is_closing());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undrained_faults_do_not_stall_shutdown() -> anyhow::Result<()> {
    const PANICS: usize = 4;

    let app = Application::new(Config::default());
    assert!(PANICS > app.config().fault_capacity);
    let mut faults = app.take_faults().expect("fault stream available once");
    let panicky = PanicLoop::arc();
    app.register("panicLoop", panicky.clone()).await?;
    let mut events = app.subscribe();

    let runner = spawn_run(&app);
    for _ in 0..PANICS {
        panicky.raise(Raise::Message);
        timeout(LIMIT, async {
            while events.recv().await?.kind != EventKind::LoopPanicked {}
            anyhow::Ok(())
        })
        .await??;
        app.start("panicLoop").await?;
    }

    // Nobody has read a single fault; shutdown must still complete.
    app.exit();
    timeout(LIMIT, runner).await??;
    assert_eq!(app.running_count(), 0);
    assert_eq!(app.phase(), Phase::Idle);
    assert!(faults.try_recv().is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exit_before_run_shuts_down_right_away() -> anyhow::Result<()> {
    let app = Application::new(Config::default());
    let lp = CountLoop::arc(0);
    app.register("early", lp.clone()).await?;

    app.exit();
    timeout(LIMIT, app.run()).await?;

    assert_eq!(lp.terminated.load(Ordering::SeqCst), 1);
    assert_eq!(app.running_count(), 0);
    assert_eq!(app.phase(), Phase::Idle);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ack_timeout_skips_a_deaf_loop() -> anyhow::Result<()> {
    let cfg = Config {
        ack_timeout: Duration::from_millis(50),
        ..Config::default()
    };
    let app = Application::new(cfg);
    let good = CountLoop::arc(0);
    app.register("good", good.clone()).await?;
    app.register(
        "deaf",
        Arc::new(DeafLoop {
            base: BaseLoop::new(),
        }),
    )
    .await?;
    let mut events = app.subscribe();

    let runner = spawn_run(&app);
    wait_running(&app).await;
    app.exit();
    timeout(LIMIT, runner).await??;

    assert_eq!(good.terminated.load(Ordering::SeqCst), 1);
    assert_eq!(app.running_count(), 0);

    let seen = drain_until_exit(&mut events).await;
    let timed_out: Vec<_> = seen
        .iter()
        .filter(|e| e.kind == EventKind::AckTimedOut)
        .map(|e| (e.name.as_deref(), e.reason.as_deref()))
        .collect();
    assert_eq!(
        timed_out,
        vec![(Some("deaf"), Some("pause")), (Some("deaf"), Some("terminate"))]
    );
    Ok(())
}
