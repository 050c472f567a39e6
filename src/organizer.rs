// View-facing facade. The view calls these entry points and re-renders from
// the slice each one returns. Tabs are addressed by name, their stable key.

use std::sync::Arc;

use crate::error::{OrganizerError, Result};
use crate::modules::document_store::DocumentStore;
use crate::modules::drag::{BookmarkDrop, DragController, DragState, DropOutcome, DropZones, TabDrop};
use crate::modules::hierarchy::{self, BookmarkPosition};
use crate::modules::icons::{DirectoryIcons, IconAsset, IconCatalog};
use crate::modules::sort_order::{self, Pin, ZonedTabs};
use crate::modules::storage::FileStorage;
use crate::settings::Settings;
use crate::state::{BookmarkDraft, Document, Tab};

pub struct Organizer {
    store: DocumentStore,
    drag: DragController,
    icons: Box<dyn IconCatalog>,
    default_icon: String,
    current_tab: Option<String>,
}

impl Organizer {
    pub fn new(store: DocumentStore, icons: Box<dyn IconCatalog>, default_icon: impl Into<String>) -> Self {
        Self {
            store,
            drag: DragController::new(),
            icons,
            default_icon: default_icon.into(),
            current_tab: None,
        }
    }

    /// File-backed organizer with inline saves.
    pub fn open(settings: &Settings) -> Self {
        let store = DocumentStore::load(Arc::new(FileStorage::new(settings.data_path())));
        Self::new(
            store,
            Box::new(DirectoryIcons::new(&settings.icons_dir)),
            settings.default_icon.clone(),
        )
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub async fn flush(&self) {
        self.store.flush().await;
    }

    // --- views ---

    pub fn ordered_tabs(&self) -> Vec<&Tab> {
        let doc = self.store.document();
        sort_order::ordered_tabs(&doc.tabs, &doc.sort_order)
    }

    pub fn zoned_tabs(&self) -> ZonedTabs<'_> {
        let doc = self.store.document();
        sort_order::partition(&doc.tabs, &doc.sort_order)
    }

    /// Ordered tabs whose name contains `query`, ignoring case.
    pub fn filter_tabs(&self, query: &str) -> Vec<&Tab> {
        let query = query.trim().to_lowercase();
        self.ordered_tabs()
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&query))
            .collect()
    }

    /// The selected tab, or the first tab in display order when none is selected.
    pub fn current_tab_view(&self) -> Option<&Tab> {
        let doc = self.store.document();
        self.current_tab
            .as_deref()
            .and_then(|name| doc.tab(name).ok())
            .or_else(|| self.ordered_tabs().into_iter().next())
    }

    pub fn select_tab(&mut self, name: &str) -> Result<&Tab> {
        self.store.document().tab(name)?;
        self.current_tab = Some(name.to_string());
        self.store.document().tab(name)
    }

    pub fn pin(&self, tab: &str) -> Option<Pin> {
        self.store.document().sort_order.get(tab)
    }

    pub fn icons(&self) -> Vec<IconAsset> {
        self.icons.icons().unwrap_or_else(|e| {
            log::warn!("[Organizer] Failed to list icons: {}", e);
            Vec::new()
        })
    }

    // --- tabs ---

    pub fn add_tab(&mut self, name: &str) -> Result<Vec<&Tab>> {
        self.store
            .apply(&format!("add tab '{}'", name.trim()), |doc| hierarchy::add_tab(doc, name))?;
        Ok(self.ordered_tabs())
    }

    pub fn rename_tab(&mut self, name: &str, new_name: &str) -> Result<Vec<&Tab>> {
        let action = format!("rename tab '{}' to '{}'", name, new_name.trim());
        self.store.apply_if_changed(&action, |doc| {
            let index = doc
                .tab_index(name)
                .ok_or_else(|| OrganizerError::TabNotFound(name.to_string()))?;
            let change = hierarchy::rename_tab(doc, index, new_name)?;
            sort_order::renormalize(&doc.tabs, &mut doc.sort_order);
            Ok(change)
        })?;

        if self.current_tab.as_deref() == Some(name) {
            self.current_tab = Some(new_name.trim().to_string());
        }
        Ok(self.ordered_tabs())
    }

    /// Deletes a tab. If it was selected, selection falls back to the first tab.
    pub fn delete_tab(&mut self, name: &str) -> Result<Vec<&Tab>> {
        self.store.apply(&format!("delete tab '{}'", name), |doc| {
            let index = doc
                .tab_index(name)
                .ok_or_else(|| OrganizerError::TabNotFound(name.to_string()))?;
            hierarchy::delete_tab(doc, index)?;
            sort_order::renormalize(&doc.tabs, &mut doc.sort_order);
            Ok(())
        })?;

        if self.current_tab.as_deref() == Some(name) {
            self.current_tab = None;
        }
        Ok(self.ordered_tabs())
    }

    /// Sets or clears a pin explicitly, then closes rank gaps.
    pub fn pin_tab(&mut self, name: &str, pin: Option<Pin>) -> Result<Vec<&Tab>> {
        let action = match pin {
            Some(pin) => format!("pin tab '{}' at {}", name, pin),
            None => format!("unpin tab '{}'", name),
        };
        self.store.apply_if_changed(&action, |doc| {
            doc.tab(name)?;
            let before = doc.sort_order.clone();
            doc.sort_order.set_pin(name, pin);
            sort_order::renormalize(&doc.tabs, &mut doc.sort_order);
            Ok(if doc.sort_order == before {
                hierarchy::Change::Unchanged
            } else {
                hierarchy::Change::Applied
            })
        })?;
        Ok(self.ordered_tabs())
    }

    // --- groups ---

    pub fn add_group(&mut self, tab: &str, name: &str) -> Result<&Tab> {
        self.store.apply(&format!("add group '{}' to '{}'", name.trim(), tab), |doc| {
            hierarchy::add_group(doc.tab_mut(tab)?, name)
        })?;
        self.store.document().tab(tab)
    }

    pub fn rename_group(&mut self, tab: &str, group: usize, name: &str) -> Result<&Tab> {
        self.store.apply_if_changed(&format!("rename group {} in '{}'", group, tab), |doc| {
            hierarchy::rename_group(doc.tab_mut(tab)?, group, name)
        })?;
        self.store.document().tab(tab)
    }

    pub fn delete_group(&mut self, tab: &str, group: usize) -> Result<&Tab> {
        self.store.apply(&format!("delete group {} in '{}'", group, tab), |doc| {
            hierarchy::delete_group(doc.tab_mut(tab)?, group)
        })?;
        self.store.document().tab(tab)
    }

    // --- bookmarks ---

    pub fn add_bookmark(&mut self, tab: &str, group: usize, draft: BookmarkDraft) -> Result<&Tab> {
        let bookmark = draft.into_bookmark(&self.default_icon);
        self.store
            .apply(&format!("add bookmark '{}' to '{}'", bookmark.name, tab), |doc| {
                hierarchy::add_bookmark(doc.tab_mut(tab)?, group, bookmark)
            })?;
        self.store.document().tab(tab)
    }

    pub fn edit_bookmark(&mut self, tab: &str, position: BookmarkPosition, draft: BookmarkDraft) -> Result<&Tab> {
        let bookmark = draft.into_bookmark(&self.default_icon);
        self.store
            .apply(&format!("edit bookmark {:?} in '{}'", position, tab), |doc| {
                hierarchy::edit_bookmark(doc.tab_mut(tab)?, position, bookmark)
            })?;
        self.store.document().tab(tab)
    }

    pub fn delete_bookmark(&mut self, tab: &str, position: BookmarkPosition) -> Result<&Tab> {
        self.store
            .apply(&format!("delete bookmark {:?} in '{}'", position, tab), |doc| {
                hierarchy::delete_bookmark(doc.tab_mut(tab)?, position)
            })?;
        self.store.document().tab(tab)
    }

    /// Moves a bookmark; moving onto its own position saves nothing.
    pub fn move_bookmark(&mut self, tab: &str, from: BookmarkPosition, to: BookmarkPosition) -> Result<&Tab> {
        self.store
            .apply_if_changed(&format!("move bookmark in '{}' from {:?} to {:?}", tab, from, to), |doc| {
                hierarchy::move_bookmark(doc.tab_mut(tab)?, from, to)
            })?;
        self.store.document().tab(tab)
    }

    // --- drag and drop ---

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn begin_tab_drag(&mut self, name: &str) -> Result<DropZones> {
        self.drag.begin_tab_drag(&self.store, name)
    }

    pub fn begin_bookmark_drag(&mut self, tab: &str, from: BookmarkPosition) -> Result<()> {
        self.drag.begin_bookmark_drag(&self.store, tab, from)
    }

    pub fn drop_tab(&mut self, target: TabDrop) -> Result<DropOutcome> {
        self.drag.drop_tab(&mut self.store, target)
    }

    pub fn drop_bookmark(&mut self, target: BookmarkDrop) -> Result<DropOutcome> {
        self.drag.drop_bookmark(&mut self.store, target)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }
}
