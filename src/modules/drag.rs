// Drag interaction controller.
// Turns a finished drag gesture into exactly one sort-order or hierarchy
// mutation on the document store. Gesture state machine:
//
//   Idle --begin_*--> Dragging --drop_*--> (mutation) --> Idle
//                         \----cancel----------------------/

use crate::error::{OrganizerError, Result};
use crate::modules::document_store::DocumentStore;
use crate::modules::hierarchy::{self, BookmarkPosition, Change};
use crate::modules::sort_order::{self, Zone};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragItem {
    Tab { name: String },
    Bookmark { tab: String, from: BookmarkPosition },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragItem),
}

/// Empty pinned zones the view must materialize as drop targets while a
/// tab is being dragged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropZones {
    pub top: bool,
    pub bottom: bool,
}

/// Where a dragged tab was released: the zone of the container it landed
/// in and its index inside that container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabDrop {
    pub zone: Zone,
    pub index: usize,
}

impl TabDrop {
    pub fn new(zone: Zone, index: usize) -> Self {
        Self { zone, index }
    }

    /// Drop on the placeholder of an empty zone: the first slot.
    pub fn placeholder(zone: Zone) -> Self {
        Self::new(zone, 0)
    }
}

/// Vertical extent of a sibling bookmark in the drop container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SiblingBox {
    pub top: f32,
    pub height: f32,
}

impl SiblingBox {
    fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Where a dragged bookmark was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookmarkDrop {
    pub to: BookmarkPosition,
}

impl BookmarkDrop {
    pub fn at(group: usize, index: usize) -> Self {
        Self {
            to: BookmarkPosition::new(group, index),
        }
    }

    /// Resolves the insertion index from the pointer position.
    ///
    /// `siblings` are the bookmarks of the target container in display
    /// order, excluding the one being dragged. The bookmark goes before the
    /// closest sibling whose midpoint is below the pointer, or last if none
    /// is. Because the dragged element is excluded, the index is already
    /// relative to the list after removal.
    pub fn from_pointer(group: usize, pointer_y: f32, siblings: &[SiblingBox]) -> Self {
        let index = siblings
            .iter()
            .enumerate()
            .filter(|(_, b)| pointer_y - b.midpoint() < 0.0)
            .max_by(|(_, a), (_, b)| b.midpoint().total_cmp(&a.midpoint()))
            .map_or(siblings.len(), |(i, _)| i);
        Self::at(group, index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// The document changed and a save was issued.
    Committed,
    /// Nothing changed; the view still recomputes and redraws.
    Refreshed,
    /// No-op drop; no save and no redraw.
    Skipped,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Starts a tab drag and reports which empty zones need drop targets.
    pub fn begin_tab_drag(&mut self, store: &DocumentStore, name: &str) -> Result<DropZones> {
        let doc = store.document();
        doc.tab(name)?;

        let zoned = sort_order::partition(&doc.tabs, &doc.sort_order);
        let zones = DropZones {
            top: zoned.top.is_empty(),
            bottom: zoned.bottom.is_empty(),
        };

        log::debug!("[Drag] Tab drag started: {}", name);
        self.state = DragState::Dragging(DragItem::Tab {
            name: name.to_string(),
        });
        Ok(zones)
    }

    pub fn begin_bookmark_drag(&mut self, store: &DocumentStore, tab: &str, from: BookmarkPosition) -> Result<()> {
        let bookmarks = store.document().tab(tab)?.bookmarks(from.group)?;
        if from.index >= bookmarks.len() {
            return Err(OrganizerError::out_of_range("bookmark", from.index, bookmarks.len()));
        }

        log::debug!("[Drag] Bookmark drag started: {} {:?}", tab, from);
        self.state = DragState::Dragging(DragItem::Bookmark {
            tab: tab.to_string(),
            from,
        });
        Ok(())
    }

    /// Drag released outside any drop target.
    pub fn cancel(&mut self) {
        if self.state != DragState::Idle {
            log::debug!("[Drag] Drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Applies a tab drop. The drop container's zone decides the target,
    /// not the zone the drag started from.
    pub fn drop_tab(&mut self, store: &mut DocumentStore, target: TabDrop) -> Result<DropOutcome> {
        let name = match std::mem::take(&mut self.state) {
            DragState::Dragging(DragItem::Tab { name }) => name,
            other => {
                log::debug!("[Drag] Tab drop without a tab drag ({:?}), ignoring", other);
                return Ok(DropOutcome::Skipped);
            }
        };

        let action = format!("move tab '{}' to {} #{}", name, target.zone, target.index + 1);
        let change = store.apply_if_changed(&action, |doc| {
            doc.tab(&name)?;
            let before = doc.sort_order.clone();

            match target.zone.pin_zone() {
                Some(zone) => {
                    sort_order::place_pin(&doc.tabs, &mut doc.sort_order, &name, zone, target.index);
                }
                None => {
                    doc.sort_order.remove(&name);
                    sort_order::renormalize(&doc.tabs, &mut doc.sort_order);
                }
            }

            Ok(if doc.sort_order == before {
                Change::Unchanged
            } else {
                Change::Applied
            })
        })?;

        Ok(match change {
            Change::Applied => DropOutcome::Committed,
            Change::Unchanged => DropOutcome::Refreshed,
        })
    }

    /// Applies a bookmark drop inside the tab the drag started in.
    pub fn drop_bookmark(&mut self, store: &mut DocumentStore, target: BookmarkDrop) -> Result<DropOutcome> {
        let (tab, from) = match std::mem::take(&mut self.state) {
            DragState::Dragging(DragItem::Bookmark { tab, from }) => (tab, from),
            other => {
                log::debug!("[Drag] Bookmark drop without a bookmark drag ({:?}), ignoring", other);
                return Ok(DropOutcome::Skipped);
            }
        };

        if from == target.to {
            log::debug!("[Drag] Bookmark dropped where it started, skipping");
            return Ok(DropOutcome::Skipped);
        }

        let action = format!("move bookmark in '{}' from {:?} to {:?}", tab, from, target.to);
        let change = store.apply_if_changed(&action, |doc| {
            hierarchy::move_bookmark(doc.tab_mut(&tab)?, from, target.to)
        })?;

        Ok(match change {
            Change::Applied => DropOutcome::Committed,
            Change::Unchanged => DropOutcome::Skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sort_order::Pin;
    use crate::modules::storage::MemoryStorage;
    use crate::state::{Bookmark, Document, Group, Tab};
    use rstest::rstest;
    use std::sync::Arc;

    fn store_with(doc: Document) -> (DocumentStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::with_contents(doc.to_json().unwrap()));
        (DocumentStore::load(storage.clone()), storage)
    }

    fn tab_store() -> (DocumentStore, Arc<MemoryStorage>) {
        let mut doc = Document::default();
        for name in ["Archive", "Home", "Mail", "Work"] {
            doc.tabs.push(Tab::grouped(name, Vec::new()));
        }
        doc.sort_order.set_pin("Home", Some(Pin::top(1)));
        doc.sort_order.set_pin("Work", Some(Pin::top(2)));
        store_with(doc)
    }

    fn bookmark_store() -> (DocumentStore, Arc<MemoryStorage>) {
        let group = |name: &str, items: &[&str]| Group {
            name: name.to_string(),
            bookmarks: items.iter().map(|i| Bookmark::new(*i, format!("https://{}/", i), "")).collect(),
        };
        let mut doc = Document::default();
        doc.tabs.push(Tab::grouped("Dev", vec![group("A", &["a0", "a1", "a2"]), group("B", &["b0"])]));
        store_with(doc)
    }

    fn ordered(store: &DocumentStore) -> Vec<String> {
        let doc = store.document();
        sort_order::ordered_tabs(&doc.tabs, &doc.sort_order)
            .into_iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn group_names(store: &DocumentStore, group: usize) -> Vec<String> {
        store.document().tabs[0]
            .bookmarks(group)
            .unwrap()
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }

    // --- tab drags ---

    #[test]
    fn test_begin_tab_drag_reports_empty_zones() {
        let (store, _) = tab_store();
        let mut drag = DragController::new();

        let zones = drag.begin_tab_drag(&store, "Mail").unwrap();
        assert_eq!(zones, DropZones { top: false, bottom: true });
        assert!(matches!(drag.state(), DragState::Dragging(DragItem::Tab { name }) if name == "Mail"));
    }

    #[test]
    fn test_drop_tab_into_top_zone() {
        let (mut store, storage) = tab_store();
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "Mail").unwrap();
        let outcome = drag.drop_tab(&mut store, TabDrop::new(Zone::Top, 0)).unwrap();

        // Mail and Home both hold top-1; Home comes first in the tab array
        assert_eq!(outcome, DropOutcome::Committed);
        assert_eq!(drag.state(), &DragState::Idle);
        assert_eq!(ordered(&store), ["Home", "Mail", "Work", "Archive"]);
        assert_eq!(store.document().sort_order.get("Mail"), Some(Pin::top(2)));
        assert_eq!(store.document().sort_order.get("Work"), Some(Pin::top(3)));
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn test_drop_tab_rank_tie_uses_array_order() {
        let mut doc = Document::default();
        for (name, rank) in [("A", 1), ("B", 2), ("C", 3)] {
            doc.tabs.push(Tab::grouped(name, Vec::new()));
            doc.sort_order.set_pin(name, Some(Pin::top(rank)));
        }
        let (mut store, _) = store_with(doc);
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "C").unwrap();
        drag.drop_tab(&mut store, TabDrop::new(Zone::Top, 0)).unwrap();

        assert_eq!(ordered(&store), ["A", "C", "B"]);
        assert_eq!(store.document().sort_order.get("C"), Some(Pin::top(2)));
        assert_eq!(store.document().sort_order.get("B"), Some(Pin::top(3)));
    }

    #[test]
    fn test_drop_tab_on_bottom_placeholder() {
        let (mut store, _) = tab_store();
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "Home").unwrap();
        assert_eq!(TabDrop::placeholder(Zone::Bottom), TabDrop::new(Zone::Bottom, 0));
        drag.drop_tab(&mut store, TabDrop::placeholder(Zone::Bottom)).unwrap();

        assert_eq!(store.document().sort_order.get("Home"), Some(Pin::bottom(1)));
        assert_eq!(store.document().sort_order.get("Work"), Some(Pin::top(1)));
        assert_eq!(ordered(&store), ["Work", "Archive", "Mail", "Home"]);
    }

    #[test]
    fn test_drop_tab_into_alphabetical_unpins() {
        let (mut store, _) = tab_store();
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "Home").unwrap();
        drag.drop_tab(&mut store, TabDrop::new(Zone::Alphabetical, 3)).unwrap();

        assert_eq!(store.document().sort_order.get("Home"), None);
        assert_eq!(store.document().sort_order.get("Work"), Some(Pin::top(1)));
        assert_eq!(ordered(&store), ["Work", "Archive", "Home", "Mail"]);
    }

    #[test]
    fn test_drop_tab_in_place_refreshes_without_save() {
        let (mut store, storage) = tab_store();
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "Work").unwrap();
        let outcome = drag.drop_tab(&mut store, TabDrop::new(Zone::Top, 1)).unwrap();

        assert_eq!(outcome, DropOutcome::Refreshed);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_drop_without_drag_is_skipped() {
        let (mut store, storage) = tab_store();
        let mut drag = DragController::new();

        let outcome = drag.drop_tab(&mut store, TabDrop::new(Zone::Top, 0)).unwrap();
        assert_eq!(outcome, DropOutcome::Skipped);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_cancel_returns_to_idle_without_mutation() {
        let (store, storage) = tab_store();
        let before = store.document().clone();
        let mut drag = DragController::new();

        drag.begin_tab_drag(&store, "Mail").unwrap();
        drag.cancel();

        assert_eq!(drag.state(), &DragState::Idle);
        assert_eq!(store.document(), &before);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_begin_drag_on_unknown_tab_fails() {
        let (store, _) = tab_store();
        let mut drag = DragController::new();
        assert!(matches!(drag.begin_tab_drag(&store, "Nope"), Err(OrganizerError::TabNotFound(_))));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    // --- bookmark drags ---

    #[test]
    fn test_bookmark_drop_across_groups() {
        let (mut store, storage) = bookmark_store();
        let mut drag = DragController::new();

        drag.begin_bookmark_drag(&store, "Dev", BookmarkPosition::new(0, 0)).unwrap();
        let outcome = drag.drop_bookmark(&mut store, BookmarkDrop::at(1, 1)).unwrap();

        assert_eq!(outcome, DropOutcome::Committed);
        assert_eq!(group_names(&store, 0), ["a1", "a2"]);
        assert_eq!(group_names(&store, 1), ["b0", "a0"]);
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn test_bookmark_drop_in_place_is_skipped() {
        let (mut store, storage) = bookmark_store();
        let mut drag = DragController::new();

        drag.begin_bookmark_drag(&store, "Dev", BookmarkPosition::new(0, 2)).unwrap();
        let outcome = drag.drop_bookmark(&mut store, BookmarkDrop::at(0, 2)).unwrap();

        assert_eq!(outcome, DropOutcome::Skipped);
        assert_eq!(drag.state(), &DragState::Idle);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_stale_bookmark_drop_leaves_document() {
        let (mut store, storage) = bookmark_store();
        let before = store.document().clone();
        let mut drag = DragController::new();

        drag.begin_bookmark_drag(&store, "Dev", BookmarkPosition::new(0, 0)).unwrap();
        let result = drag.drop_bookmark(&mut store, BookmarkDrop::at(7, 0));

        assert!(matches!(result, Err(OrganizerError::IndexOutOfRange { .. })));
        assert_eq!(drag.state(), &DragState::Idle);
        assert_eq!(store.document(), &before);
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn test_begin_bookmark_drag_validates_position() {
        let (store, _) = bookmark_store();
        let mut drag = DragController::new();
        assert!(drag.begin_bookmark_drag(&store, "Dev", BookmarkPosition::new(1, 1)).is_err());
        assert!(drag.begin_bookmark_drag(&store, "Dev", BookmarkPosition::new(2, 0)).is_err());
        assert_eq!(drag.state(), &DragState::Idle);
    }

    // --- insertion index from pointer ---

    fn boxes() -> Vec<SiblingBox> {
        // midpoints at 10, 30, 50
        [0.0, 20.0, 40.0]
            .into_iter()
            .map(|top| SiblingBox { top, height: 20.0 })
            .collect()
    }

    #[rstest]
    #[case(-5.0, 0)]
    #[case(9.0, 0)]
    #[case(10.0, 1)]
    #[case(29.0, 1)]
    #[case(45.0, 2)]
    #[case(50.0, 3)]
    #[case(500.0, 3)]
    fn test_insertion_index_from_pointer(#[case] pointer_y: f32, #[case] expected: usize) {
        assert_eq!(BookmarkDrop::from_pointer(0, pointer_y, &boxes()).to.index, expected);
    }

    #[test]
    fn test_insertion_index_into_empty_group() {
        assert_eq!(BookmarkDrop::from_pointer(3, 12.0, &[]), BookmarkDrop::at(3, 0));
    }
}
