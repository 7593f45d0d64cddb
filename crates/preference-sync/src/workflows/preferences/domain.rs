use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog item referenced by a preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque handle to the visual row representing an entry or an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowHandle(pub u64);

/// Submission-facing shadow of a preference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub index: usize,
    pub item_id: Option<ItemId>,
    pub rank: Option<u32>,
}

impl FieldRecord {
    pub(crate) fn bound(item_id: ItemId, rank: u32) -> Self {
        Self {
            index: index_for_rank(rank),
            item_id: Some(item_id),
            rank: Some(rank),
        }
    }

    pub(crate) fn empty(index: usize) -> Self {
        Self {
            index,
            item_id: None,
            rank: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_id.is_none()
    }

    /// Rewrites the positional index and rank field for a new rank.
    pub(crate) fn renumber(&mut self, rank: u32) {
        self.index = index_for_rank(rank);
        self.rank = Some(rank);
    }
}

pub(crate) fn index_for_rank(rank: u32) -> usize {
    rank.saturating_sub(1) as usize
}

/// Whether the up and down move controls of an entry are currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveControls {
    pub up_enabled: bool,
    pub down_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// One ranked choice, owning both its display row and its field record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceEntry {
    item_id: ItemId,
    rank: u32,
    row: RowHandle,
    record: FieldRecord,
    controls: MoveControls,
}

impl PreferenceEntry {
    pub(crate) fn new(item_id: ItemId, rank: u32, row: RowHandle) -> Self {
        let record = FieldRecord::bound(item_id.clone(), rank);
        Self {
            item_id,
            rank,
            row,
            record,
            controls: MoveControls::default(),
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn row(&self) -> RowHandle {
        self.row
    }

    pub fn record(&self) -> &FieldRecord {
        &self.record
    }

    pub fn controls(&self) -> MoveControls {
        self.controls
    }

    pub(crate) fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
        self.record.renumber(rank);
    }

    pub(crate) fn set_controls(&mut self, controls: MoveControls) {
        self.controls = controls;
    }

    pub fn view(&self) -> EntryView {
        EntryView {
            item_id: self.item_id.clone(),
            rank: self.rank,
            row: self.row,
            index: self.record.index,
            can_move_up: self.controls.up_enabled,
            can_move_down: self.controls.down_enabled,
        }
    }
}

/// Serializable snapshot of an entry handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub item_id: ItemId,
    pub rank: u32,
    pub row: RowHandle,
    pub index: usize,
    pub can_move_up: bool,
    pub can_move_down: bool,
}

/// A pre-rendered, unfilled slot inside the reserved band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptySlot {
    pub row: RowHandle,
    pub record: FieldRecord,
}

impl EmptySlot {
    pub fn rank(&self) -> u32 {
        self.record.index as u32 + 1
    }
}

/// Positional band `[initial_count, min_count)` of slots reserved for entries
/// expected to exist before the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReservedBand {
    pub initial_count: usize,
    pub min_count: usize,
}

impl ReservedBand {
    pub fn new(initial_count: usize, min_count: usize) -> Self {
        Self {
            initial_count,
            min_count,
        }
    }

    pub fn positions(&self) -> std::ops::Range<usize> {
        self.initial_count..self.min_count.max(self.initial_count)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.positions().contains(&index)
    }
}

/// Where a relocated row lands relative to its anchor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
}

/// Structural edit the presentation layer applies to its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RowOp {
    Insert {
        row: RowHandle,
        rank: u32,
    },
    Relabel {
        row: RowHandle,
        rank: u32,
    },
    Relocate {
        row: RowHandle,
        anchor: RowHandle,
        placement: Placement,
    },
    Delete {
        row: RowHandle,
    },
}

/// Error raised by the preference list manager. Every variant leaves the list unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferenceError {
    #[error("item {0} is already in the preference list")]
    DuplicateEntry(ItemId),
    #[error("item {0} is not in the preference list")]
    EntryNotFound(ItemId),
    #[error("item {item_id} cannot move {} past the end of the list", .direction.label())]
    BoundaryViolation {
        item_id: ItemId,
        direction: MoveDirection,
    },
}
