// Document Store: the in-memory document plus its round-trip to storage.
// Every committed mutation is followed by a save; there is no manual save step.

use std::sync::Arc;

use crate::error::Result;
use crate::modules::hierarchy::Change;
use crate::modules::save_queue::SaveQueue;
use crate::modules::storage::Storage;
use crate::state::Document;

pub struct DocumentStore {
    document: Document,
    storage: Arc<dyn Storage>,
    queue: Option<SaveQueue>,
    saves_requested: usize,
}

impl DocumentStore {
    /// Loads the document from `storage`. Absent, unreadable or malformed
    /// data all start an empty document. Pins naming no existing tab are
    /// dropped. Saves run inline until a queue is attached with
    /// [`DocumentStore::with_queue`].
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let mut document = match storage.load() {
            Ok(Some(json)) => Document::parse_or_empty(&json),
            Ok(None) => {
                log::info!("[DocumentStore] No saved data found, starting empty");
                Document::default()
            }
            Err(e) => {
                log::warn!("[DocumentStore] Failed to load saved data: {}, starting empty", e);
                Document::default()
            }
        };
        let dangling = document.sort_order.prune(&document.tabs);
        if dangling > 0 {
            log::warn!("[DocumentStore] Dropped {} pins for missing tabs", dangling);
        }
        log::info!("[DocumentStore] Loaded {} tabs", document.tabs.len());

        Self {
            document,
            storage,
            queue: None,
            saves_requested: 0,
        }
    }

    pub fn with_queue(mut self, queue: SaveQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of saves issued since load.
    pub fn saves_requested(&self) -> usize {
        self.saves_requested
    }

    /// Runs a mutation and saves on success. On error nothing is saved.
    pub fn apply<T>(&mut self, action: &str, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let out = f(&mut self.document)?;
        log::info!("[DocumentStore] {}", action);
        self.persist();
        Ok(out)
    }

    /// Like [`DocumentStore::apply`], but skips the save when the mutation
    /// reports [`Change::Unchanged`].
    pub fn apply_if_changed(
        &mut self,
        action: &str,
        f: impl FnOnce(&mut Document) -> Result<Change>,
    ) -> Result<Change> {
        let change = f(&mut self.document)?;
        if change.is_applied() {
            log::info!("[DocumentStore] {}", action);
            self.persist();
        } else {
            log::debug!("[DocumentStore] {}: no change, skipping save", action);
        }
        Ok(change)
    }

    /// Waits for queued saves to reach storage. Inline saves are already done.
    pub async fn flush(&self) {
        if let Some(queue) = &self.queue {
            queue.flush().await;
        }
    }

    // Failures are logged; the in-memory document stays authoritative.
    fn persist(&mut self) {
        self.saves_requested += 1;
        let json = match self.document.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("[DocumentStore] Failed to serialize document: {}", e);
                return;
            }
        };

        match &self.queue {
            Some(queue) => queue.submit(json),
            None => {
                if let Err(e) = self.storage.save(&json) {
                    log::warn!("[DocumentStore] Save failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrganizerError;
    use crate::modules::hierarchy::{self, BookmarkPosition};
    use crate::modules::sort_order::Pin;
    use crate::modules::storage::MemoryStorage;
    use crate::state::{Bookmark, Group, Tab};

    struct ReadOnlyStorage(String);

    impl Storage for ReadOnlyStorage {
        fn load(&self) -> Result<Option<String>> {
            Ok(Some(self.0.clone()))
        }

        fn save(&self, _json: &str) -> Result<()> {
            Err(OrganizerError::Persistence(std::io::Error::other("read-only")))
        }
    }

    fn seeded_storage() -> Arc<MemoryStorage> {
        let mut doc = Document::default();
        doc.tabs.push(Tab::grouped(
            "Dev",
            vec![Group {
                name: "A".to_string(),
                bookmarks: vec![
                    Bookmark::new("a0", "https://a0/", ""),
                    Bookmark::new("a1", "https://a1/", ""),
                    Bookmark::new("a2", "https://a2/", ""),
                ],
            }],
        ));
        Arc::new(MemoryStorage::with_contents(doc.to_json().unwrap()))
    }

    #[test]
    fn test_absent_and_malformed_data_start_empty() {
        let empty = DocumentStore::load(Arc::new(MemoryStorage::new()));
        assert_eq!(empty.document(), &Document::default());

        let garbage = DocumentStore::load(Arc::new(MemoryStorage::with_contents("{\"tabs\": 7}")));
        assert_eq!(garbage.document(), &Document::default());
    }

    #[test]
    fn test_load_drops_pins_for_missing_tabs() {
        let json = r#"{
            "tabSortOrder": {"Dev": "top-2", "Gone": "top-1", "Old": "bottom-1"},
            "tabs": [{"name": "Dev", "groups": []}]
        }"#;
        let storage = Arc::new(MemoryStorage::with_contents(json));
        let mut store = DocumentStore::load(storage.clone());

        let pins: Vec<_> = store.document().sort_order.iter().map(|(n, p)| (n.to_string(), p)).collect();
        assert_eq!(pins, [("Dev".to_string(), Pin::top(2))]);
        assert_eq!(storage.save_count(), 0);

        store.apply("add tab", |doc| hierarchy::add_tab(doc, "Gone")).unwrap();
        let saved = Document::from_json(&storage.contents().unwrap()).unwrap();
        assert_eq!(saved.sort_order.get("Gone"), None);
        assert_eq!(saved.sort_order.len(), 1);
    }

    #[test]
    fn test_apply_saves_after_mutation() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = DocumentStore::load(storage.clone());

        store.apply("add tab", |doc| hierarchy::add_tab(doc, "Home")).unwrap();

        assert_eq!(storage.save_count(), 1);
        let saved = Document::from_json(&storage.contents().unwrap()).unwrap();
        assert_eq!(&saved, store.document());
    }

    #[test]
    fn test_failed_mutation_is_not_saved() {
        let storage = seeded_storage();
        let mut store = DocumentStore::load(storage.clone());
        let before = store.document().clone();

        let result = store.apply("delete tab", |doc| hierarchy::delete_tab(doc, 9));
        assert!(result.is_err());
        assert_eq!(store.document(), &before);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_noop_move_skips_save() {
        let storage = seeded_storage();
        let mut store = DocumentStore::load(storage.clone());
        let bytes_before = storage.contents();

        let position = BookmarkPosition::new(0, 2);
        let change = store
            .apply_if_changed("move bookmark", |doc| {
                hierarchy::move_bookmark(doc.tab_mut("Dev")?, position, position)
            })
            .unwrap();

        assert_eq!(change, Change::Unchanged);
        assert_eq!(storage.save_count(), 0);
        assert_eq!(store.saves_requested(), 0);
        assert_eq!(storage.contents(), bytes_before);
    }

    #[test]
    fn test_save_failure_keeps_in_memory_state() {
        let mut store = DocumentStore::load(Arc::new(ReadOnlyStorage("{}".to_string())));

        store.apply("add tab", |doc| hierarchy::add_tab(doc, "Kept")).unwrap();
        assert_eq!(store.document().tabs.len(), 1);
        assert_eq!(store.saves_requested(), 1);
    }

    #[tokio::test]
    async fn test_queued_saves_reach_storage_on_flush() {
        let storage = Arc::new(MemoryStorage::new());
        let (queue, _handle) = SaveQueue::spawn(storage.clone());
        let mut store = DocumentStore::load(storage.clone()).with_queue(queue);

        for name in ["One", "Two", "Three"] {
            store.apply("add tab", |doc| hierarchy::add_tab(doc, name)).unwrap();
        }
        store.flush().await;

        let saved = Document::from_json(&storage.contents().unwrap()).unwrap();
        assert_eq!(&saved, store.document());
        assert_eq!(store.saves_requested(), 3);
    }
}
