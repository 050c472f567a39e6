// Tab sort order - pure logic, no I/O.
// Display order is top-pinned tabs, then unpinned tabs by name, then bottom-pinned tabs.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::state::Tab;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinZone {
    Top,
    Bottom,
}

impl PinZone {
    fn prefix(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// Display bucket of a tab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    Top,
    Alphabetical,
    Bottom,
}

impl Zone {
    pub fn pin_zone(self) -> Option<PinZone> {
        match self {
            Self::Top => Some(PinZone::Top),
            Self::Alphabetical => None,
            Self::Bottom => Some(PinZone::Bottom),
        }
    }
}

impl From<PinZone> for Zone {
    fn from(zone: PinZone) -> Self {
        match zone {
            PinZone::Top => Self::Top,
            PinZone::Bottom => Self::Bottom,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Alphabetical => "alphabetical",
            Self::Bottom => "bottom",
        })
    }
}

impl FromStr for Zone {
    type Err = InvalidPin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "alphabetical" => Ok(Self::Alphabetical),
            "bottom" => Ok(Self::Bottom),
            other => Err(InvalidPin(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pin token '{0}'")]
pub struct InvalidPin(pub String);

/// Positional override: a zone plus a 1-based rank inside it.
/// Persisted as `"top-<rank>"` / `"bottom-<rank>"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pin {
    pub zone: PinZone,
    pub rank: u32,
}

impl Pin {
    pub fn top(rank: u32) -> Self {
        Self {
            zone: PinZone::Top,
            rank,
        }
    }

    pub fn bottom(rank: u32) -> Self {
        Self {
            zone: PinZone::Bottom,
            rank,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.zone.prefix(), self.rank)
    }
}

impl FromStr for Pin {
    type Err = InvalidPin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (zone, rank) = if let Some(rank) = s.strip_prefix("top-") {
            (PinZone::Top, rank)
        } else if let Some(rank) = s.strip_prefix("bottom-") {
            (PinZone::Bottom, rank)
        } else {
            return Err(InvalidPin(s.to_string()));
        };

        if rank.is_empty() || !rank.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPin(s.to_string()));
        }
        match rank.parse::<u32>() {
            Ok(rank) if rank > 0 => Ok(Self { zone, rank }),
            _ => Err(InvalidPin(s.to_string())),
        }
    }
}

/// Pins keyed by tab name. Tabs without an entry sort alphabetically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortOrder {
    pins: BTreeMap<String, Pin>,
}

impl SortOrder {
    pub fn get(&self, tab_name: &str) -> Option<Pin> {
        self.pins.get(tab_name).copied()
    }

    pub fn zone_of(&self, tab_name: &str) -> Zone {
        self.get(tab_name).map_or(Zone::Alphabetical, |p| p.zone.into())
    }

    /// Sets or clears a tab's pin. `None` removes the entry entirely.
    /// Returns the previous pin.
    pub fn set_pin(&mut self, tab_name: &str, pin: Option<Pin>) -> Option<Pin> {
        match pin {
            Some(pin) => self.pins.insert(tab_name.to_string(), pin),
            None => self.pins.remove(tab_name),
        }
    }

    pub fn remove(&mut self, tab_name: &str) -> Option<Pin> {
        self.pins.remove(tab_name)
    }

    /// Drops pins whose tab is not in `tabs`. Returns how many were dropped.
    pub fn prune(&mut self, tabs: &[Tab]) -> usize {
        let before = self.pins.len();
        self.pins.retain(|name, _| tabs.iter().any(|t| &t.name == name));
        before - self.pins.len()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Pin)> {
        self.pins.iter().map(|(name, pin)| (name.as_str(), *pin))
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.pins.iter().map(|(name, pin)| (name, pin.to_string())))
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    // Values that are not pin strings (legacy numbers, corrupted tokens)
    // mean "unpinned" and are dropped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        let pins = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, value)| match value.as_str().map(str::parse::<Pin>) {
                Some(Ok(pin)) => Some((name, pin)),
                _ => {
                    log::debug!("[SortOrder] Treating '{}' = {} as unpinned", name, value);
                    None
                }
            })
            .collect();
        Ok(Self { pins })
    }
}

/// Locale-style name comparison: case-insensitive first, then lowercase
/// before uppercase at the first letter that differs only by case.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| {
        for (x, y) in a.chars().zip(b.chars()) {
            if x != y {
                return match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(&y),
                };
            }
        }
        a.len().cmp(&b.len())
    })
}

/// Tabs split into display zones, each already in display order.
#[derive(Debug, Default)]
pub struct ZonedTabs<'a> {
    pub top: Vec<&'a Tab>,
    pub alphabetical: Vec<&'a Tab>,
    pub bottom: Vec<&'a Tab>,
}

impl<'a> ZonedTabs<'a> {
    pub fn zone(&self, zone: Zone) -> &[&'a Tab] {
        match zone {
            Zone::Top => &self.top,
            Zone::Alphabetical => &self.alphabetical,
            Zone::Bottom => &self.bottom,
        }
    }

    pub fn into_ordered(self) -> Vec<&'a Tab> {
        let mut ordered = self.top;
        ordered.extend(self.alphabetical);
        ordered.extend(self.bottom);
        ordered
    }
}

/// Buckets tabs by pin zone.
///
/// Top and bottom sort ascending by rank; equal ranks keep the order the
/// tabs have in `tabs`. The alphabetical bucket sorts with [`compare_names`].
pub fn partition<'a>(tabs: &'a [Tab], sort_order: &SortOrder) -> ZonedTabs<'a> {
    let mut top: Vec<(u32, &Tab)> = Vec::new();
    let mut bottom: Vec<(u32, &Tab)> = Vec::new();
    let mut alphabetical: Vec<&Tab> = Vec::new();

    for tab in tabs {
        match sort_order.get(&tab.name) {
            Some(Pin { zone: PinZone::Top, rank }) => top.push((rank, tab)),
            Some(Pin { zone: PinZone::Bottom, rank }) => bottom.push((rank, tab)),
            None => alphabetical.push(tab),
        }
    }

    // sort_by_key is stable, ties keep array order
    top.sort_by_key(|(rank, _)| *rank);
    bottom.sort_by_key(|(rank, _)| *rank);
    alphabetical.sort_by(|a, b| compare_names(&a.name, &b.name));

    ZonedTabs {
        top: top.into_iter().map(|(_, t)| t).collect(),
        alphabetical,
        bottom: bottom.into_iter().map(|(_, t)| t).collect(),
    }
}

/// Display order of `tabs`. Pure; an empty sort order sorts everything by name.
pub fn ordered_tabs<'a>(tabs: &'a [Tab], sort_order: &SortOrder) -> Vec<&'a Tab> {
    partition(tabs, sort_order).into_ordered()
}

/// Reassigns ranks 1..N within each pinned zone, keeping the current
/// relative order. Returns true if any pin changed.
///
/// Algorithm:
/// 1. Collect the tabs pinned in the zone, in tab array order
/// 2. Stable-sort them by current rank
/// 3. Rewrite ranks as their position + 1
pub fn renormalize(tabs: &[Tab], sort_order: &mut SortOrder) -> bool {
    let mut changed = false;

    for zone in [PinZone::Top, PinZone::Bottom] {
        let mut pinned: Vec<(u32, &str)> = tabs
            .iter()
            .filter_map(|tab| {
                sort_order
                    .get(&tab.name)
                    .filter(|pin| pin.zone == zone)
                    .map(|pin| (pin.rank, tab.name.as_str()))
            })
            .collect();
        pinned.sort_by_key(|(rank, _)| *rank);

        for (position, (rank, name)) in pinned.into_iter().enumerate() {
            let new_rank = position as u32 + 1;
            if rank != new_rank {
                sort_order.set_pin(name, Some(Pin { zone, rank: new_rank }));
                changed = true;
            }
        }
    }

    changed
}

/// Pins `tab_name` at slot `index` of `zone`: the old pin is cleared, the
/// tab gets rank `index + 1`, then the zones are renormalized. A tab that
/// already holds that rank keeps its place when it comes earlier in `tabs`.
/// Returns the tab's pin after renormalization.
pub fn place_pin(
    tabs: &[Tab],
    sort_order: &mut SortOrder,
    tab_name: &str,
    zone: PinZone,
    index: usize,
) -> Pin {
    sort_order.set_pin(tab_name, None);

    let rank = u32::try_from(index).unwrap_or(u32::MAX - 1).saturating_add(1);
    let pin = Pin { zone, rank };
    sort_order.set_pin(tab_name, Some(pin));
    renormalize(tabs, sort_order);
    sort_order.get(tab_name).unwrap_or(pin)
}
