//! Status blocks: the [`Block`] trait, the scheduling loops that drive
//! blocks, and the concrete blocks themselves.
//!
//! A block owns its display state behind a lock, refreshes it with
//! [`Block::update`], and, once started, emits a [`Signal`] whenever its
//! visible output changes.

pub mod block;
pub mod blocks;
mod error;
pub mod factory;
pub mod probe;
pub mod schedule;
pub mod signal;

pub use block::Block;
pub use error::BlockError;
pub use factory::build;
pub use schedule::{Cadence, EventSource};
pub use signal::{Signal, SignalStream};
