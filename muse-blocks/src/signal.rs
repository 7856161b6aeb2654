use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// "Re-render me." Carries the sender's name for diagnostics only; the
/// aggregator always re-renders every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub block: Arc<str>,
}

/// The receiving end of one block's signals, plus the loop producing them.
#[derive(Debug)]
pub struct SignalStream {
    signals: mpsc::Receiver<Signal>,
    task: Option<JoinHandle<()>>,
}

impl SignalStream {
    pub fn new(signals: mpsc::Receiver<Signal>, task: JoinHandle<()>) -> Self {
        Self {
            signals,
            task: Some(task),
        }
    }

    /// A stream that is already closed: `recv` returns `None` at once. For
    /// blocks only refreshed by `notify`; the fan-in drops it immediately.
    pub fn idle() -> Self {
        let (_tx, signals) = mpsc::channel(1);
        Self {
            signals,
            task: None,
        }
    }

    pub async fn recv(&mut self) -> Option<Signal> {
        self.signals.recv().await
    }

    pub fn into_parts(self) -> (mpsc::Receiver<Signal>, Option<JoinHandle<()>>) {
        (self.signals, self.task)
    }
}

/// Queue a signal without waiting. A full queue already holds a pending
/// re-render, so the new one is dropped. Returns false once the receiver
/// is gone.
pub(crate) fn emit(tx: &mpsc::Sender<Signal>, block: &Arc<str>) -> bool {
    match tx.try_send(Signal {
        block: Arc::clone(block),
    }) {
        Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_stream_is_closed() {
        let mut stream = SignalStream::idle();
        assert_eq!(stream.recv().await, None);
        let (_, task) = stream.into_parts();
        assert!(task.is_none());
    }

    #[tokio::test]
    async fn emit_keeps_one_pending_signal() {
        let (tx, mut rx) = mpsc::channel(1);
        let name: Arc<str> = Arc::from("date");
        assert!(emit(&tx, &name));
        assert!(emit(&tx, &name));
        assert_eq!(rx.recv().await.map(|s| s.block), Some(Arc::clone(&name)));
        assert!(rx.try_recv().is_err());
        drop(rx);
        assert!(!emit(&tx, &name));
    }
}
