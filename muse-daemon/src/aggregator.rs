//! Zones of blocks, the single render path, and command handling.

use std::sync::Arc;

use muse_blocks::{Block, Signal, SignalStream};
use muse_core::Theme;
use muse_format::{render_line, RenderError, ZoneViews};
use tokio::io::AsyncWrite;
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::error::DaemonError;
use crate::hub::{ClientId, Hub};
use crate::protocol::Command;

/// Capacity of the in-process line feed (`--stdout`).
const LINE_FEED_CAPACITY: usize = 64;

/// Blocks refreshed whenever another block signals: a workspace change
/// usually means the focused window changed.
const FOLLOW_UPS: &[(&str, &str)] = &[("bspwm", "window"), ("i3", "window")];

/// Blocks per zone, in rendering order.
#[derive(Default, Clone)]
pub struct Zones {
    pub left: Vec<Arc<dyn Block>>,
    pub center: Vec<Arc<dyn Block>>,
    pub right: Vec<Arc<dyn Block>>,
}

impl Zones {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Block>> {
        self.left.iter().chain(&self.center).chain(&self.right)
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.center.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the zones and turns block state into status lines.
pub struct Aggregator {
    zones: Zones,
    theme: Arc<Theme>,
}

impl Aggregator {
    /// Runs `update()` once on every block, so the first render never sees
    /// unprobed state. Blocking.
    pub fn new(zones: Zones, theme: Arc<Theme>) -> Self {
        for block in zones.iter() {
            block.update();
        }
        Self { zones, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    pub fn views(&self) -> ZoneViews {
        let views = |blocks: &[Arc<dyn Block>]| {
            blocks
                .iter()
                .map(|block| block.view(&self.theme))
                .collect::<Vec<_>>()
        };
        ZoneViews {
            left: views(&self.zones.left),
            center: views(&self.zones.center),
            right: views(&self.zones.right),
        }
    }

    pub fn render(&self) -> Result<String, RenderError> {
        render_line(&self.views(), &self.theme)
    }

    /// Update every block called `name`. False if none matched. Blocking.
    pub fn notify(&self, name: &str) -> bool {
        let mut matched = false;
        for block in self.zones.iter().filter(|block| block.name() == name) {
            block.update();
            matched = true;
        }
        matched
    }

    /// Notify the blocks that follow any of `signalled`. Blocking.
    pub fn follow_up<'a>(&self, signalled: impl IntoIterator<Item = &'a str>) {
        let signalled: Vec<&str> = signalled.into_iter().collect();
        for (leader, follower) in FOLLOW_UPS {
            if signalled.contains(leader) {
                self.notify(follower);
            }
        }
    }

    pub fn start_broadcasts(&self, shutdown: &broadcast::Sender<()>) -> Vec<SignalStream> {
        self.zones
            .iter()
            .map(|block| Arc::clone(block).start_broadcast(shutdown.subscribe()))
            .collect()
    }
}

/// The aggregator plus its clients. Every render goes through
/// [`Daemon::publish`], which holds the hub lock while rendering and
/// writing, so all clients see the same lines in the same order.
pub struct Daemon<W> {
    aggregator: Arc<Aggregator>,
    hub: Mutex<Hub<W>>,
    lines: broadcast::Sender<String>,
}

impl<W: AsyncWrite + Unpin + Send> Daemon<W> {
    pub fn new(aggregator: Aggregator) -> Self {
        let hub = Hub::new(aggregator.theme().mode);
        let (lines, _) = broadcast::channel(LINE_FEED_CAPACITY);
        Self {
            aggregator: Arc::new(aggregator),
            hub: Mutex::new(hub),
            lines,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Every published line, unframed, for in-process consumers.
    pub fn subscribe_lines(&self) -> broadcast::Receiver<String> {
        self.lines.subscribe()
    }

    pub async fn current(&self) -> Option<String> {
        self.hub.lock().await.current().map(str::to_string)
    }

    /// Render all zones once and send the line everywhere.
    pub async fn publish(&self) -> Result<(), DaemonError> {
        let mut hub = self.hub.lock().await;
        let line = self.aggregator.render()?;
        // No in-process consumer is fine.
        let _ = self.lines.send(line.clone());
        hub.broadcast(line).await;
        Ok(())
    }

    pub async fn attach(&self, writer: W) -> Option<ClientId> {
        self.hub.lock().await.attach(writer).await
    }

    pub async fn detach(&self, id: ClientId) {
        self.hub.lock().await.detach(id);
    }

    /// Handle one inbound line from `client`. Protocol errors are answered
    /// to that client only.
    pub async fn handle_command(&self, client: ClientId, line: &str) -> Result<(), DaemonError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match Command::parse(line) {
            Ok(Command::Notify(name)) => {
                let aggregator = Arc::clone(&self.aggregator);
                let target = name.clone();
                let matched = tokio::task::spawn_blocking(move || aggregator.notify(&target))
                    .await
                    .map_err(|err| DaemonError::TaskJoin(format!("notify {name}: {err}")))?;
                if matched {
                    tracing::debug!(block = %name, "notified");
                    self.publish().await?;
                } else {
                    tracing::debug!(block = %name, "notify for unknown block");
                }
            }
            Err(err) => {
                tracing::debug!(client, error = %err, "rejected command");
                self.hub.lock().await.reply(client, &err.to_string()).await;
            }
        }
        Ok(())
    }

    /// Re-render on every block signal until shutdown or until every block
    /// stream has closed. Signals queued behind the one being handled are
    /// folded into the same render.
    pub async fn run_signals(
        &self,
        mut signals: mpsc::Receiver<Signal>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), DaemonError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                signal = signals.recv() => {
                    let Some(signal) = signal else { break };
                    let mut batch = vec![signal.block];
                    while let Ok(queued) = signals.try_recv() {
                        batch.push(queued.block);
                    }
                    tracing::trace!(block = %batch[0], folded = batch.len() - 1, "re-render");
                    let aggregator = Arc::clone(&self.aggregator);
                    let follow_up = tokio::task::spawn_blocking(move || {
                        aggregator.follow_up(batch.iter().map(|name| &**name));
                    });
                    if let Err(err) = follow_up.await {
                        tracing::warn!(error = %err, "follow-up refresh failed");
                    }
                    if let Err(err) = self.publish().await {
                        tracing::error!(error = %err, "render failed");
                    }
                }
            }
        }
        Ok(())
    }
}
