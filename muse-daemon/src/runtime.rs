use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use muse_blocks::build;
use muse_core::{BlockSpec, StatusConfig, Theme, ZoneLayout};
use muse_format::StreamFramer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::aggregator::{Aggregator, Daemon, Zones};
use crate::error::{io_err, DaemonError};
use crate::fanin::fan_in;

/// Capacity of the merged block signal channel.
const SIGNAL_CAPACITY: usize = 32;

/// How long block tasks get to wind down after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

type SocketDaemon = Daemon<OwnedWriteHalf>;

#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub config: StatusConfig,
    pub socket: PathBuf,
    /// Also write the framed stream to stdout.
    pub stdout: bool,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(options: DaemonOptions) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(options))
}

/// Build the configured blocks. A block that fails to construct is logged
/// and left out; the rest of the bar still runs.
pub fn build_zones(layout: &ZoneLayout, theme: &Theme) -> Zones {
    let build_zone = |zone: &'static str, specs: &[BlockSpec]| {
        specs
            .iter()
            .filter_map(|spec| match build(spec, theme) {
                Ok(block) => Some(block),
                Err(err) => {
                    tracing::warn!(zone, kind = spec.kind(), error = %err, "skipping block");
                    None
                }
            })
            .collect::<Vec<_>>()
    };

    Zones {
        left: build_zone("left", &layout.left),
        center: build_zone("center", &layout.center),
        right: build_zone("right", &layout.right),
    }
}

/// Run the daemon until ctrl-c, SIGTERM, or a fatal server error.
pub async fn run(options: DaemonOptions) -> Result<(), DaemonError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut terminate = tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            )
            .map_err(|e| io_err("SIGTERM handler", e))?;
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                _ = terminate.recv() => {
                    tracing::info!("received SIGTERM, shutting down daemon");
                    let _ = shutdown.send(());
                    Ok(())
                }
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::TaskJoin(format!("ctrl-c handler: {err}"))),
                    }
                }
            }
        })
    };

    let theme = Arc::new(options.config.theme());
    let layout = options.config.blocks.clone();
    let aggregator = tokio::task::spawn_blocking(move || {
        let zones = build_zones(&layout, &theme);
        Aggregator::new(zones, theme)
    })
    .await
    .map_err(|err| DaemonError::TaskJoin(format!("block setup: {err}")))?;

    tracing::info!(
        blocks = aggregator.zones().len(),
        mode = %aggregator.theme().mode,
        socket = %options.socket.display(),
        "daemon starting",
    );

    let result = serve(aggregator, &options.socket, options.stdout, shutdown_tx.clone()).await;
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;
    result
}

/// Serve status lines on `socket` until `shutdown` fires. The socket file
/// is removed on the way out.
pub async fn serve(
    aggregator: Aggregator,
    socket: &Path,
    stdout: bool,
    shutdown: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let mut shutdown_rx = shutdown.subscribe();
    let daemon = Arc::new(SocketDaemon::new(aggregator));

    let stdout_handle = stdout.then(|| {
        let daemon = Arc::clone(&daemon);
        let shutdown = shutdown.subscribe();
        tokio::spawn(async move { stdout_task(daemon, shutdown).await })
    });

    daemon.publish().await?;

    if let Some(parent) = socket.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    prepare_socket_for_bind(socket)?;
    let listener = UnixListener::bind(socket).map_err(|e| io_err(socket, e))?;
    set_socket_permissions(socket)?;
    tracing::info!(socket = %socket.display(), "listening");

    let (receivers, block_tasks): (Vec<_>, Vec<_>) = daemon
        .aggregator()
        .start_broadcasts(&shutdown)
        .into_iter()
        .map(|stream| stream.into_parts())
        .unzip();
    let (signals, forwarders) = fan_in(receivers, SIGNAL_CAPACITY);

    let render_handle = {
        let daemon = Arc::clone(&daemon);
        let shutdown = shutdown.subscribe();
        tokio::spawn(async move { daemon.run_signals(signals, shutdown).await })
    };

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let daemon = Arc::clone(&daemon);
                let shutdown = shutdown.subscribe();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(stream, daemon, shutdown).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    drop(listener);
    if socket.exists() {
        let _ = fs::remove_file(socket);
    }

    handle_join("renderer", render_handle.await)?;
    if let Some(handle) = stdout_handle {
        handle_join("stdout", handle.await)?;
    }
    for task in block_tasks.into_iter().flatten().chain(forwarders) {
        wind_down(task).await;
    }
    tracing::info!("daemon stopped");
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    daemon: Arc<SocketDaemon>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let (reader, writer) = stream.into_split();
    let Some(id) = daemon.attach(writer).await else {
        return Ok(());
    };

    let mut lines = BufReader::new(reader).lines();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let Err(err) = daemon.handle_command(id, &line).await {
                            tracing::error!(client = id, error = %err, "command failed");
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::debug!(client = id, error = %err, "client read failed");
                        break;
                    }
                }
            }
        }
    }

    daemon.detach(id).await;
    tracing::debug!(client = id, "client detached");
    Ok(())
}

async fn stdout_task(
    daemon: Arc<SocketDaemon>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut feed = daemon.subscribe_lines();
    let mut framer = StreamFramer::new(daemon.aggregator().theme().mode);
    let mut out = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            line = feed.recv() => {
                let line = match line {
                    Ok(line) => line,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "stdout fell behind");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                out.write_all(framer.frame(&line).as_bytes())
                    .await
                    .map_err(|e| io_err("stdout", e))?;
                out.flush().await.map_err(|e| io_err("stdout", e))?;
            }
        }
    }
    Ok(())
}

async fn wind_down(task: JoinHandle<()>) {
    match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "block task ended abnormally"),
        Err(_) => tracing::warn!("block task did not stop in time"),
    }
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::TaskJoin(format!("{task}: {err}"))),
    }
}

/// Logs go to stderr; stdout may carry the status stream.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stale_socket_file_is_removed() {
        let tmp = TempDir::new().expect("tempdir");
        let socket = tmp.path().join("muse-status.sock");
        fs::write(&socket, b"").expect("stale file");
        prepare_socket_for_bind(&socket).expect("stale socket cleared");
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn live_socket_is_not_stolen() {
        let tmp = TempDir::new().expect("tempdir");
        let socket = tmp.path().join("muse-status.sock");
        let _listener = UnixListener::bind(&socket).expect("bind");
        let err = prepare_socket_for_bind(&socket).expect_err("in use");
        assert!(err.to_string().contains("daemon socket already in use"));
        assert!(socket.exists());
    }

    #[tokio::test]
    async fn cancelled_task_is_a_join_error() {
        let handle = tokio::spawn(std::future::pending::<Result<(), DaemonError>>());
        handle.abort();
        let err = handle_join("renderer", handle.await).expect_err("cancelled");
        assert!(matches!(err, DaemonError::TaskJoin(ref what) if what.starts_with("renderer: ")));
    }

    #[tokio::test]
    async fn task_errors_pass_through_handle_join() {
        let handle = tokio::spawn(async { Err(DaemonError::NoSocketDir) });
        let err = handle_join("stdout", handle.await).expect_err("inner error");
        assert!(matches!(err, DaemonError::NoSocketDir));
    }

    #[test]
    fn failing_blocks_are_left_out() {
        let layout = ZoneLayout {
            left: vec![BlockSpec::Date],
            center: vec![BlockSpec::Weather {
                ipstack_key: String::new(),
                openweathermap_key: String::new(),
                units: "metric".to_string(),
            }],
            right: Vec::new(),
        };
        let zones = build_zones(&layout, &Theme::default());
        assert_eq!(zones.left.len(), 1);
        assert!(zones.center.is_empty());
        assert!(zones.right.is_empty());
    }
}
