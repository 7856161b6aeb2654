use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Merge many receivers into one. One forwarding task per source relays
/// into a shared sink; the sink closes once every source has closed.
pub fn fan_in<T: Send + 'static>(
    sources: Vec<mpsc::Receiver<T>>,
    capacity: usize,
) -> (mpsc::Receiver<T>, Vec<JoinHandle<()>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let forwarders = sources
        .into_iter()
        .map(|mut source| {
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(item) = source.recv().await {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    (rx, forwarders)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merges_and_closes_after_all_sources() {
        let (a_tx, a_rx) = mpsc::channel(4);
        let (b_tx, b_rx) = mpsc::channel(4);
        let (mut merged, forwarders) = fan_in(vec![a_rx, b_rx], 8);

        a_tx.send(1).await.expect("send");
        b_tx.send(2).await.expect("send");
        a_tx.send(3).await.expect("send");

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(merged.recv().await.expect("item"));
        }
        seen.sort_unstable();
        assert_eq!(seen, [1, 2, 3]);

        drop(a_tx);
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), merged.recv())
                .await
                .is_err(),
            "still open while one source lives"
        );

        drop(b_tx);
        assert_eq!(merged.recv().await, None);
        for forwarder in forwarders {
            forwarder.await.expect("forwarder exits");
        }
    }

    #[tokio::test]
    async fn no_sources_closes_immediately() {
        let (mut merged, forwarders) = fan_in::<()>(Vec::new(), 1);
        assert!(forwarders.is_empty());
        assert_eq!(merged.recv().await, None);
    }
}
