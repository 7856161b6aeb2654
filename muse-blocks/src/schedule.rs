//! The loops that drive self-scheduled blocks.
//!
//! - [`poll`]: probe on a fixed interval, signal only on change. With an
//!   animation frame rate it also wakes (and signals) every frame while the
//!   block is animating, without probing on those frames.
//! - [`subscribe`]: follow a line-oriented child process and signal on
//!   every event the block accepts, plus animation frames if the source
//!   asks for them.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::block::Block;
use crate::signal::{emit, SignalStream};

/// How often a polled block wakes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Interval between probes while nothing animates.
    pub idle: Duration,
    /// Frame interval while [`Block::animating`] is true.
    pub animate: Option<Duration>,
    /// When false, wake-ups only check for animation and never probe.
    /// Such blocks are refreshed through `notify`.
    pub probe: bool,
}

impl Cadence {
    pub const fn every(idle: Duration) -> Self {
        Self {
            idle,
            animate: None,
            probe: true,
        }
    }

    pub const fn animated(idle: Duration, frame: Duration) -> Self {
        Self {
            idle,
            animate: Some(frame),
            probe: true,
        }
    }

    /// Animate faded colors after a `notify`, without probing on its own.
    pub const fn notify_only(frame: Duration) -> Self {
        Self {
            idle: Duration::from_millis(250),
            animate: Some(frame),
            probe: false,
        }
    }

    /// The next wake-up: the next update, or an earlier frame while animating.
    fn next_wake(&self, animating: bool, now: Instant, next_update: Instant) -> Instant {
        match self.animate {
            Some(frame) if animating => (now + frame).min(next_update),
            _ => next_update,
        }
    }
}

/// Spawn a polling loop for `block`.
pub fn poll<B: Block>(
    block: Arc<B>,
    cadence: Cadence,
    mut shutdown: broadcast::Receiver<()>,
) -> SignalStream {
    let (tx, rx) = mpsc::channel(1);
    let name: Arc<str> = Arc::from(block.name());

    let task = tokio::spawn(async move {
        let mut last = block.content();
        let mut next_update = Instant::now() + cadence.idle;
        loop {
            let was_animating = block.animating();
            let wake = cadence.next_wake(was_animating, Instant::now(), next_update);
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep_until(wake) => {}
            }

            // Frame wake-ups only re-read content; updates keep the idle pace.
            let due = Instant::now() >= next_update;
            if due {
                next_update = Instant::now() + cadence.idle;
            }

            let current = if due && cadence.probe {
                let target = Arc::clone(&block);
                match tokio::task::spawn_blocking(move || {
                    target.update();
                    target.content()
                })
                .await
                {
                    Ok(content) => content,
                    Err(err) => {
                        tracing::warn!(block = %name, error = %err, "block update task failed");
                        continue;
                    }
                }
            } else {
                block.content()
            };

            // One more frame after animation stops so the settled color is drawn.
            let animating = block.animating() || was_animating;
            if current != last || (animating && cadence.animate.is_some()) {
                last = current;
                if !emit(&tx, &name) {
                    break;
                }
            }
        }
        tracing::debug!(block = %name, "poll loop stopped");
    });

    SignalStream::new(rx, task)
}

/// A long-running child process whose stdout is a stream of events, one
/// per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub program: String,
    pub args: Vec<String>,
    /// Wait before restarting the process after it exits or fails to start.
    pub backoff: Duration,
    /// Signal at this interval while the block is animating, between events.
    pub frame: Option<Duration>,
}

impl EventSource {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            backoff: Duration::from_secs(5),
            frame: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_frames(mut self, frame: Duration) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// Spawn a loop that follows `source` and feeds each line to `apply`.
/// `apply` updates the block's state and returns whether the visible
/// output changed. It runs on the blocking pool, so it may run commands.
pub fn subscribe<B, F>(
    block: Arc<B>,
    source: EventSource,
    mut shutdown: broadcast::Receiver<()>,
    apply: F,
) -> SignalStream
where
    B: Block,
    F: Fn(&B, &str) -> bool + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let name: Arc<str> = Arc::from(block.name());
    let apply = Arc::new(apply);

    let task = tokio::spawn(async move {
        'outer: loop {
            let child = Command::new(&source.program)
                .args(&source.args)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::null())
                .kill_on_drop(true)
                .spawn();

            match child {
                Ok(mut child) => {
                    if let Some(stdout) = child.stdout.take() {
                        let mut lines = BufReader::new(stdout).lines();
                        loop {
                            let frame = source.frame.filter(|_| block.animating());
                            tokio::select! {
                                _ = shutdown.recv() => break 'outer,
                                _ = tokio::time::sleep(frame.unwrap_or_default()), if frame.is_some() => {
                                    if !emit(&tx, &name) {
                                        break 'outer;
                                    }
                                }
                                line = lines.next_line() => match line {
                                    Ok(Some(line)) => {
                                        let target = Arc::clone(&block);
                                        let apply = Arc::clone(&apply);
                                        let changed = tokio::task::spawn_blocking(move || apply(&target, &line)).await;
                                        match changed {
                                            Ok(true) => {
                                                if !emit(&tx, &name) {
                                                    break 'outer;
                                                }
                                            }
                                            Ok(false) => {}
                                            Err(err) => {
                                                tracing::warn!(block = %name, error = %err, "event handler failed");
                                            }
                                        }
                                    }
                                    Ok(None) => break,
                                    Err(err) => {
                                        tracing::debug!(block = %name, error = %err, "event stream read failed");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    tracing::debug!(block = %name, program = %source.program, "event source exited");
                }
                Err(err) => {
                    tracing::warn!(
                        block = %name,
                        program = %source.program,
                        error = %err,
                        "could not start event source",
                    );
                }
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(source.backoff) => {}
            }
        }
        tracing::debug!(block = %name, "subscription stopped");
    });

    SignalStream::new(rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use muse_format::BlockContent;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Shows `value`; `update()` copies `next` into `value`.
    struct Counter {
        next: AtomicU32,
        value: AtomicU32,
        updates: AtomicUsize,
        animating: AtomicBool,
    }

    impl Counter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                next: AtomicU32::new(0),
                value: AtomicU32::new(0),
                updates: AtomicUsize::new(0),
                animating: AtomicBool::new(false),
            })
        }
    }

    impl Block for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn update(&self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.value
                .store(self.next.load(Ordering::SeqCst), Ordering::SeqCst);
        }

        fn content(&self) -> BlockContent {
            BlockContent {
                primary: self.value.load(Ordering::SeqCst).to_string(),
                ..BlockContent::default()
            }
        }

        fn animating(&self) -> bool {
            self.animating.load(Ordering::SeqCst)
        }

        fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
            poll(
                self,
                Cadence::animated(Duration::from_secs(1), Duration::from_millis(50)),
                shutdown,
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_signals_only_on_change() {
        let block = Counter::new();
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut stream = poll(
            Arc::clone(&block),
            Cadence::every(Duration::from_secs(1)),
            shutdown_tx.subscribe(),
        );

        let quiet = tokio::time::timeout(Duration::from_secs(5), stream.recv()).await;
        assert!(quiet.is_err(), "unchanged content must not signal");
        assert!(block.updates.load(Ordering::SeqCst) >= 4);

        block.next.store(7, Ordering::SeqCst);
        let signal = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("signal after change")
            .expect("stream open");
        assert_eq!(&*signal.block, "counter");

        let _ = shutdown_tx.send(());
        let (_, task) = stream.into_parts();
        task.expect("poll task").await.expect("clean exit");
    }

    #[tokio::test(start_paused = true)]
    async fn animation_uses_the_fast_tick_then_stops() {
        let block = Counter::new();
        block.animating.store(true, Ordering::SeqCst);
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut stream = Arc::clone(&block).start_broadcast(shutdown_tx.subscribe());

        // 50 ms frames: about ten in half a second, none of them updates.
        let mut frames = 0;
        let window = tokio::time::sleep(Duration::from_millis(520));
        tokio::pin!(window);
        loop {
            tokio::select! {
                _ = &mut window => break,
                signal = stream.recv() => {
                    signal.expect("stream open");
                    frames += 1;
                }
            }
        }
        assert!((9..=11).contains(&frames), "expected a frame per fast tick, got {frames}");
        assert_eq!(block.updates.load(Ordering::SeqCst), 0);

        // One settling frame after the animation ends, then quiet.
        block.animating.store(false, Ordering::SeqCst);
        let mut trailing = 0;
        while tokio::time::timeout(Duration::from_millis(1500), stream.recv())
            .await
            .is_ok()
        {
            trailing += 1;
            if trailing > 5 {
                break;
            }
        }
        assert_eq!(trailing, 1);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test(start_paused = true)]
    async fn long_animation_keeps_the_update_interval() {
        let block = Counter::new();
        block.animating.store(true, Ordering::SeqCst);
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut stream = poll(
            Arc::clone(&block),
            Cadence::animated(Duration::from_secs(5), Duration::from_millis(1000 / 15)),
            shutdown_tx.subscribe(),
        );

        let mut frames = 0;
        let window = tokio::time::sleep(Duration::from_secs(10) + Duration::from_millis(10));
        tokio::pin!(window);
        loop {
            tokio::select! {
                _ = &mut window => break,
                signal = stream.recv() => {
                    signal.expect("stream open");
                    frames += 1;
                }
            }
        }

        let updates = block.updates.load(Ordering::SeqCst);
        assert_eq!(updates, 2, "one update per 5 s while animating, got {updates}");
        assert!(frames >= 140, "frames keep flowing between updates, got {frames}");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn subscribe_emits_frames_while_animating() {
        let block = Counter::new();
        block.animating.store(true, Ordering::SeqCst);
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut stream = subscribe(
            Arc::clone(&block),
            EventSource::new("sh", &["-c", "echo event; sleep 30"])
                .with_frames(Duration::from_millis(20)),
            shutdown_tx.subscribe(),
            |_, _| true,
        );

        for _ in 0..5 {
            tokio::time::timeout(Duration::from_secs(5), stream.recv())
                .await
                .expect("event or frame")
                .expect("open");
        }

        block.animating.store(false, Ordering::SeqCst);
        // Drain a frame that may already be queued.
        let _ = tokio::time::timeout(Duration::from_millis(100), stream.recv()).await;
        let quiet = tokio::time::timeout(Duration::from_millis(300), stream.recv()).await;
        assert!(quiet.is_err(), "no frames once the animation ends");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn subscribe_applies_each_line() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let block = Counter::new();
        let (shutdown_tx, _) = broadcast::channel(1);

        let sink = Arc::clone(&seen);
        let mut stream = subscribe(
            block,
            EventSource::new("sh", &["-c", "printf 'a\\nskip\\nb\\n'; sleep 30"]),
            shutdown_tx.subscribe(),
            move |_, line| {
                sink.lock().expect("lock").push(line.to_string());
                line != "skip"
            },
        );

        tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .expect("signal")
            .expect("open");
        for _ in 0..100 {
            if seen.lock().expect("lock").len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(*seen.lock().expect("lock"), ["a", "skip", "b"]);

        let _ = shutdown_tx.send(());
        let (_, task) = stream.into_parts();
        tokio::time::timeout(Duration::from_secs(5), task.expect("task"))
            .await
            .expect("stops on shutdown")
            .expect("clean exit");
    }

    #[tokio::test]
    async fn missing_program_retries_until_shutdown() {
        let block = Counter::new();
        let (shutdown_tx, _) = broadcast::channel(1);
        let stream = subscribe(
            block,
            EventSource::new("muse-status-no-such-program", &[])
                .with_backoff(Duration::from_millis(10)),
            shutdown_tx.subscribe(),
            |_, _| true,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = shutdown_tx.send(());
        let (_, task) = stream.into_parts();
        tokio::time::timeout(Duration::from_secs(5), task.expect("task"))
            .await
            .expect("stops on shutdown")
            .expect("clean exit");
    }
}
