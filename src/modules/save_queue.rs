// Background writer that serializes document saves.
//
// Saves are fire-and-forget for the caller. The worker writes one snapshot
// at a time; snapshots that pile up while a write is in flight are coalesced
// so only the newest one reaches storage. Failures are logged, never retried.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::modules::storage::Storage;

enum SaveCommand {
    Write(String),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone, Debug)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveCommand>,
}

impl SaveQueue {
    /// Starts the writer task. Must be called inside a tokio runtime.
    /// The task ends once every `SaveQueue` clone has been dropped.
    pub fn spawn(storage: Arc<dyn Storage>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(storage, rx));
        (Self { tx }, handle)
    }

    pub fn submit(&self, json: String) {
        if self.tx.send(SaveCommand::Write(json)).is_err() {
            log::warn!("[SaveQueue] Writer has stopped, dropping save");
        }
    }

    /// Resolves once everything submitted before this call has been written.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(SaveCommand::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }
}

async fn run_writer(storage: Arc<dyn Storage>, mut rx: mpsc::UnboundedReceiver<SaveCommand>) {
    while let Some(first) = rx.recv().await {
        let mut latest = None;
        let mut acks = Vec::new();

        let mut next = Some(first);
        while let Some(command) = next {
            match command {
                SaveCommand::Write(json) => latest = Some(json),
                SaveCommand::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some(json) = latest {
            write_snapshot(storage.clone(), json).await;
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
    log::debug!("[SaveQueue] Writer stopped");
}

async fn write_snapshot(storage: Arc<dyn Storage>, json: String) {
    let bytes = json.len();
    match tokio::task::spawn_blocking(move || storage.save(&json)).await {
        Ok(Ok(())) => log::debug!("[SaveQueue] Saved document ({} bytes)", bytes),
        Ok(Err(e)) => log::warn!("[SaveQueue] Save failed: {}", e),
        Err(e) => log::warn!("[SaveQueue] Save task panicked: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrganizerError;
    use crate::modules::storage::MemoryStorage;

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn load(&self) -> crate::error::Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _json: &str) -> crate::error::Result<()> {
            Err(OrganizerError::Persistence(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_flush_waits_for_pending_saves() {
        let storage = Arc::new(MemoryStorage::new());
        let (queue, _handle) = SaveQueue::spawn(storage.clone());

        queue.submit("one".to_string());
        queue.submit("two".to_string());
        queue.submit("three".to_string());
        queue.flush().await;

        assert_eq!(storage.contents().as_deref(), Some("three"));
        assert!(storage.save_count() >= 1 && storage.save_count() <= 3);
    }

    #[tokio::test]
    async fn test_flush_without_saves_returns() {
        let storage = Arc::new(MemoryStorage::new());
        let (queue, _handle) = SaveQueue::spawn(storage.clone());

        queue.flush().await;
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_worker_alive() {
        let (queue, handle) = SaveQueue::spawn(Arc::new(BrokenStorage));

        queue.submit("lost".to_string());
        queue.flush().await;
        assert!(!handle.is_finished());

        drop(queue);
        handle.await.unwrap();
    }
}
