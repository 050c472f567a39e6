// Shared data model: tabs, groups, bookmarks and the persisted document.
// These types are used by every module and by main.rs, and carry no I/O.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OrganizerError, Result};
use crate::modules::sort_order::SortOrder;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "isImg", default)]
    pub is_image: bool,
}

impl Bookmark {
    pub fn new(name: impl Into<String>, url: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            icon: icon.into(),
            is_image: true,
        }
    }
}

/// User input for a bookmark before the icon fallback is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
}

impl BookmarkDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Trims the fields and falls back to `default_icon` when no icon was picked.
    pub fn into_bookmark(self, default_icon: &str) -> Bookmark {
        let icon = self
            .icon
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| default_icon.to_string());
        Bookmark::new(self.name.trim(), self.url.trim(), icon)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bookmarks: Vec::new(),
        }
    }
}

/// A tab holds either named groups of bookmarks or, in the older flat
/// shape, bookmarks directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabContent {
    Grouped(Vec<Group>),
    Flat(Vec<Bookmark>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TabWire", into = "TabWire")]
pub struct Tab {
    pub name: String,
    pub content: TabContent,
}

impl Tab {
    pub fn grouped(name: impl Into<String>, groups: Vec<Group>) -> Self {
        Self {
            name: name.into(),
            content: TabContent::Grouped(groups),
        }
    }

    pub fn flat(name: impl Into<String>, bookmarks: Vec<Bookmark>) -> Self {
        Self {
            name: name.into(),
            content: TabContent::Flat(bookmarks),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.content, TabContent::Flat(_))
    }

    pub fn bookmark_count(&self) -> usize {
        match &self.content {
            TabContent::Grouped(groups) => groups.iter().map(|g| g.bookmarks.len()).sum(),
            TabContent::Flat(bookmarks) => bookmarks.len(),
        }
    }

    /// Bookmark list addressed by group index. A flat tab exposes its
    /// bookmarks as the single pseudo-group 0.
    pub fn bookmarks(&self, group: usize) -> Result<&Vec<Bookmark>> {
        match &self.content {
            TabContent::Grouped(groups) => groups
                .get(group)
                .map(|g| &g.bookmarks)
                .ok_or_else(|| OrganizerError::out_of_range("group", group, groups.len())),
            TabContent::Flat(bookmarks) if group == 0 => Ok(bookmarks),
            TabContent::Flat(_) => Err(OrganizerError::out_of_range("group", group, 1)),
        }
    }

    pub fn bookmarks_mut(&mut self, group: usize) -> Result<&mut Vec<Bookmark>> {
        match &mut self.content {
            TabContent::Grouped(groups) => {
                let len = groups.len();
                groups
                    .get_mut(group)
                    .map(|g| &mut g.bookmarks)
                    .ok_or_else(|| OrganizerError::out_of_range("group", group, len))
            }
            TabContent::Flat(bookmarks) if group == 0 => Ok(bookmarks),
            TabContent::Flat(_) => Err(OrganizerError::out_of_range("group", group, 1)),
        }
    }
}

// On-disk shape of a tab: whichever of `groups` / `bookmarks` is present.
#[derive(Serialize, Deserialize)]
struct TabWire {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bookmarks: Option<Vec<Bookmark>>,
}

impl From<TabWire> for Tab {
    fn from(wire: TabWire) -> Self {
        match (wire.groups, wire.bookmarks) {
            (Some(groups), Some(bookmarks)) => {
                // groups take precedence when a tab carries both
                if !bookmarks.is_empty() {
                    log::warn!(
                        "[Document] Tab '{}' has both groups and direct bookmarks; ignoring {} direct bookmarks",
                        wire.name,
                        bookmarks.len()
                    );
                }
                Tab::grouped(wire.name, groups)
            }
            (Some(groups), None) => Tab::grouped(wire.name, groups),
            (None, Some(bookmarks)) => Tab::flat(wire.name, bookmarks),
            (None, None) => Tab::grouped(wire.name, Vec::new()),
        }
    }
}

impl From<Tab> for TabWire {
    fn from(tab: Tab) -> Self {
        match tab.content {
            TabContent::Grouped(groups) => TabWire {
                name: tab.name,
                groups: Some(groups),
                bookmarks: None,
            },
            TabContent::Flat(bookmarks) => TabWire {
                name: tab.name,
                groups: None,
                bookmarks: Some(bookmarks),
            },
        }
    }
}

/// The unit of persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "tabSortOrder", default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

impl Document {
    pub fn tab_index(&self, name: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.name == name)
    }

    pub fn tab(&self, name: &str) -> Result<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| OrganizerError::TabNotFound(name.to_string()))
    }

    pub fn tab_mut(&mut self, name: &str) -> Result<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| OrganizerError::TabNotFound(name.to_string()))
    }

    /// Parses a persisted document. Tab names must be unique.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.check_unique_names()?;
        Ok(doc)
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        match self.tabs.iter().find(|t| !seen.insert(t.name.as_str())) {
            Some(dup) => Err(OrganizerError::DuplicateName(dup.name.clone())),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a persisted document, starting empty when it is malformed.
    pub fn parse_or_empty(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("[Document] Failed to parse saved data: {}, starting empty", e);
                Self::default()
            }
        }
    }
}
