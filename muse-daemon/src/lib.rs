//! The status daemon: aggregates blocks, renders, and streams status lines
//! to every client connected to its Unix socket.

pub mod aggregator;
mod error;
pub mod fanin;
pub mod hub;
pub mod paths;
pub mod protocol;
mod runtime;

pub use aggregator::{Aggregator, Daemon, Zones};
pub use error::DaemonError;
pub use fanin::fan_in;
pub use hub::{ClientId, Hub};
pub use protocol::{send_command, send_line, subscribe, Command, ProtocolError};
pub use runtime::{build_zones, run, serve, start_blocking, DaemonOptions};
