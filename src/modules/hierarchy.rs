// Structural edits on tabs, groups and bookmarks - pure logic, no I/O.
// Every operation validates its indices before touching the document, so an
// error always leaves the document exactly as it was.

use crate::error::{OrganizerError, Result};
use crate::state::{Bookmark, Document, Group, Tab, TabContent};

/// Whether an operation actually modified the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

impl Change {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Bookmark slot inside one tab. For flat tabs `group` is always 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BookmarkPosition {
    pub group: usize,
    pub index: usize,
}

impl BookmarkPosition {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

fn clean_name(name: &str, what: &'static str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OrganizerError::EmptyName(what));
    }
    Ok(name.to_string())
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(OrganizerError::out_of_range(what, index, len))
    }
}

fn check_bookmark(bookmark: &Bookmark) -> Result<()> {
    if bookmark.name.trim().is_empty() {
        return Err(OrganizerError::EmptyName("bookmark"));
    }
    if bookmark.url.trim().is_empty() {
        return Err(OrganizerError::EmptyName("bookmark url"));
    }
    Ok(())
}

fn groups_mut(tab: &mut Tab) -> Result<&mut Vec<Group>> {
    match &mut tab.content {
        TabContent::Grouped(groups) => Ok(groups),
        TabContent::Flat(_) => Err(OrganizerError::unsupported(format!(
            "tab '{}' holds bookmarks directly and has no groups",
            tab.name
        ))),
    }
}

// --- tabs ---

/// Appends a new, empty grouped tab. Returns its index.
pub fn add_tab(doc: &mut Document, name: &str) -> Result<usize> {
    let name = clean_name(name, "tab")?;
    if doc.tab_index(&name).is_some() {
        return Err(OrganizerError::DuplicateName(name));
    }
    doc.tabs.push(Tab::grouped(name, Vec::new()));
    Ok(doc.tabs.len() - 1)
}

/// Renames a tab. Pins are keyed by name, so the old name's pin is dropped
/// and the tab returns to the alphabetical zone.
pub fn rename_tab(doc: &mut Document, tab_index: usize, new_name: &str) -> Result<Change> {
    check_index("tab", tab_index, doc.tabs.len())?;
    let new_name = clean_name(new_name, "tab")?;

    if doc.tabs[tab_index].name == new_name {
        return Ok(Change::Unchanged);
    }
    if doc.tab_index(&new_name).is_some() {
        return Err(OrganizerError::DuplicateName(new_name));
    }

    let old_name = std::mem::replace(&mut doc.tabs[tab_index].name, new_name);
    doc.sort_order.remove(&old_name);
    Ok(Change::Applied)
}

/// Removes a tab with all its groups and bookmarks, and its pin.
pub fn delete_tab(doc: &mut Document, tab_index: usize) -> Result<Tab> {
    check_index("tab", tab_index, doc.tabs.len())?;
    let tab = doc.tabs.remove(tab_index);
    doc.sort_order.remove(&tab.name);
    Ok(tab)
}

// --- groups ---

pub fn add_group(tab: &mut Tab, name: &str) -> Result<usize> {
    let name = clean_name(name, "group")?;
    let groups = groups_mut(tab)?;
    groups.push(Group::new(name));
    Ok(groups.len() - 1)
}

pub fn rename_group(tab: &mut Tab, group_index: usize, name: &str) -> Result<Change> {
    let name = clean_name(name, "group")?;
    let groups = groups_mut(tab)?;
    check_index("group", group_index, groups.len())?;

    let group = &mut groups[group_index];
    if group.name == name {
        return Ok(Change::Unchanged);
    }
    group.name = name;
    Ok(Change::Applied)
}

/// Removes a group and its bookmarks.
pub fn delete_group(tab: &mut Tab, group_index: usize) -> Result<Group> {
    let groups = groups_mut(tab)?;
    check_index("group", group_index, groups.len())?;
    Ok(groups.remove(group_index))
}

// --- bookmarks ---

/// Appends a bookmark to a group (or to a flat tab via group 0). Returns its index.
pub fn add_bookmark(tab: &mut Tab, group_index: usize, bookmark: Bookmark) -> Result<usize> {
    check_bookmark(&bookmark)?;
    let bookmarks = tab.bookmarks_mut(group_index)?;
    bookmarks.push(bookmark);
    Ok(bookmarks.len() - 1)
}

/// Replaces the bookmark at `position`, returning the previous one.
pub fn edit_bookmark(tab: &mut Tab, position: BookmarkPosition, bookmark: Bookmark) -> Result<Bookmark> {
    check_bookmark(&bookmark)?;
    let bookmarks = tab.bookmarks_mut(position.group)?;
    check_index("bookmark", position.index, bookmarks.len())?;
    Ok(std::mem::replace(&mut bookmarks[position.index], bookmark))
}

pub fn delete_bookmark(tab: &mut Tab, position: BookmarkPosition) -> Result<Bookmark> {
    let bookmarks = tab.bookmarks_mut(position.group)?;
    check_index("bookmark", position.index, bookmarks.len())?;
    Ok(bookmarks.remove(position.index))
}

/// Moves a bookmark with remove-then-insert semantics.
///
/// `to.index` is an insertion index into the destination list as it looks
/// after the bookmark has been removed from its source. Within one group
/// the valid range is therefore `0..len`, across groups `0..=len`.
///
/// Flat tabs only support moves inside pseudo-group 0.
pub fn move_bookmark(tab: &mut Tab, from: BookmarkPosition, to: BookmarkPosition) -> Result<Change> {
    if tab.is_flat() && (from.group != 0 || to.group != 0) {
        return Err(OrganizerError::unsupported(format!(
            "tab '{}' holds bookmarks directly; bookmarks cannot move between groups",
            tab.name
        )));
    }
    if from == to {
        return Ok(Change::Unchanged);
    }

    let source_len = tab.bookmarks(from.group)?.len();
    check_index("bookmark", from.index, source_len)?;

    let target_len = if from.group == to.group {
        source_len - 1
    } else {
        tab.bookmarks(to.group)?.len()
    };
    if to.index > target_len {
        return Err(OrganizerError::out_of_range("insertion", to.index, target_len + 1));
    }

    let bookmark = tab.bookmarks_mut(from.group)?.remove(from.index);
    tab.bookmarks_mut(to.group)?.insert(to.index, bookmark);
    Ok(Change::Applied)
}
