//! Fan-out to connected clients.

use std::io;
use std::time::Duration;

use muse_core::FormatMode;
use muse_format::StreamFramer;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub type ClientId = u64;

/// Writes to a client that take longer than this drop the client.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

struct Client<W> {
    id: ClientId,
    writer: W,
    framer: StreamFramer,
}

/// The current status line plus every connected client, each with its own
/// stream framing.
pub struct Hub<W> {
    mode: FormatMode,
    current: Option<String>,
    clients: Vec<Client<W>>,
    next_id: ClientId,
    write_timeout: Duration,
}

impl<W: AsyncWrite + Unpin> Hub<W> {
    pub fn new(mode: FormatMode) -> Self {
        Self {
            mode,
            current: None,
            clients: Vec::new(),
            next_id: 0,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Register a client and greet it with the current line. `None` if the
    /// greeting could not be written.
    pub async fn attach(&mut self, writer: W) -> Option<ClientId> {
        let id = self.next_id;
        self.next_id += 1;
        let mut client = Client {
            id,
            writer,
            framer: StreamFramer::new(self.mode),
        };

        if let Some(line) = &self.current {
            let framed = client.framer.frame(line);
            if let Err(err) = write_bounded(&mut client.writer, &framed, self.write_timeout).await {
                tracing::debug!(client = id, error = %err, "could not greet client");
                return None;
            }
        }
        tracing::debug!(client = id, "client attached");
        self.clients.push(client);
        Some(id)
    }

    pub fn detach(&mut self, id: ClientId) {
        self.clients.retain(|client| client.id != id);
    }

    /// Make `line` current and write it to every client in attach order.
    /// Clients whose write fails or times out are dropped.
    pub async fn broadcast(&mut self, line: String) {
        let timeout = self.write_timeout;
        let mut failed = Vec::new();
        for client in &mut self.clients {
            let framed = client.framer.frame(&line);
            if let Err(err) = write_bounded(&mut client.writer, &framed, timeout).await {
                tracing::debug!(client = client.id, error = %err, "dropping client");
                failed.push(client.id);
            }
        }
        self.clients.retain(|client| !failed.contains(&client.id));
        self.current = Some(line);
    }

    /// Write an unframed message to one client only.
    pub async fn reply(&mut self, id: ClientId, message: &str) {
        let timeout = self.write_timeout;
        let Some(client) = self.clients.iter_mut().find(|client| client.id == id) else {
            return;
        };
        let line = format!("{message}\n");
        if let Err(err) = write_bounded(&mut client.writer, &line, timeout).await {
            tracing::debug!(client = id, error = %err, "dropping client");
            self.detach(id);
        }
    }
}

async fn write_bounded<W: AsyncWrite + Unpin>(
    writer: &mut W,
    text: &str,
    timeout: Duration,
) -> io::Result<()> {
    let write = async {
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await
    };
    match tokio::time::timeout(timeout, write).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "client write timed out")),
    }
}
