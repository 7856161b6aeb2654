//! The line protocol spoken on the daemon socket.
//!
//! Clients send newline-terminated commands; the only verb is
//! `notify <block>`. Every connection also receives the status stream,
//! starting with the current line.

use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::error::{io_err, DaemonError};

/// How long a command client waits for the daemon to finish with it.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Refresh the named block now and rebroadcast. Unknown names match
    /// nothing.
    Notify(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unhandled command: {0}")]
    Unhandled(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']).trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match verb {
            "notify" => Ok(Command::Notify(rest.trim().to_string())),
            other => Err(ProtocolError::Unhandled(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Notify(block) => write!(f, "notify {block}"),
        }
    }
}

fn connect(socket: &Path) -> Result<UnixStream, DaemonError> {
    if !socket.exists() {
        return Err(DaemonError::DaemonNotRunning {
            socket: socket.to_path_buf(),
        });
    }

    UnixStream::connect(socket).map_err(|err| {
        if matches!(
            err.kind(),
            ErrorKind::NotFound | ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset
        ) {
            DaemonError::DaemonNotRunning {
                socket: socket.to_path_buf(),
            }
        } else {
            io_err(socket, err)
        }
    })
}

/// Send one raw line and wait for the daemon to close the connection.
/// An error reply from the daemon becomes [`DaemonError::Protocol`]; status
/// lines received meanwhile are ignored.
pub fn send_line(socket: &Path, line: &str) -> Result<(), DaemonError> {
    let mut stream = connect(socket)?;
    stream
        .write_all(format!("{}\n", line.trim_end()).as_bytes())
        .map_err(|e| io_err(socket, e))?;
    stream.flush().map_err(|e| io_err(socket, e))?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(|e| io_err(socket, e))?;
    stream
        .set_read_timeout(Some(REPLY_TIMEOUT))
        .map_err(|e| io_err(socket, e))?;

    let reader = BufReader::new(stream);
    for received in reader.lines() {
        match received {
            Ok(received) => {
                if let Some(verb) = received.strip_prefix("unhandled command: ") {
                    return Err(DaemonError::Protocol(format!("unhandled command: {verb}")));
                }
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::debug!("daemon kept the connection open; not waiting further");
                break;
            }
            Err(err) => return Err(io_err(socket, err)),
        }
    }
    Ok(())
}

pub fn send_command(socket: &Path, command: &Command) -> Result<(), DaemonError> {
    send_line(socket, &command.to_string())
}

/// Connect as a status client. Yields every line the daemon streams,
/// already framed for the configured bar.
pub fn subscribe(
    socket: &Path,
) -> Result<impl Iterator<Item = std::io::Result<String>>, DaemonError> {
    let stream = connect(socket)?;
    Ok(BufReader::new(stream).lines())
}
