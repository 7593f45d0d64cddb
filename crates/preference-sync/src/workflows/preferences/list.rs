use super::boundary;
use super::domain::{
    EmptySlot, EntryView, FieldRecord, ItemId, MoveDirection, Placement, PreferenceEntry,
    PreferenceError, ReservedBand, RowHandle, RowOp,
};
use super::submission::{check_ranked, SubmissionError};

/// Ordered preference entries kept in lock-step with their rows and field records.
///
/// Entries are stored in rank order, so the entry at index `i` always has rank `i + 1`
/// and a field record at positional index `i`. Every mutation appends the row edits it
/// performed to a journal the session drains with [`PreferenceList::take_row_ops`].
#[derive(Debug, Clone, Default)]
pub struct PreferenceList {
    band: ReservedBand,
    entries: Vec<PreferenceEntry>,
    empty_slots: Vec<EmptySlot>,
    next_row: u64,
    row_ops: Vec<RowOp>,
}

impl PreferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty list whose reserved band is pre-rendered as empty slots.
    pub fn with_band(band: ReservedBand) -> Self {
        let mut list = Self {
            band,
            ..Self::default()
        };
        list.render_band();
        list
    }

    /// Seeds the list from an existing `(item, rank)` snapshot.
    ///
    /// The seeded entry count becomes the band's `initial_count`; positions up to
    /// `min_count` are rendered as empty slots.
    pub fn with_initial<I>(min_count: usize, records: I) -> Result<Self, SubmissionError>
    where
        I: IntoIterator<Item = (ItemId, u32)>,
    {
        let mut records: Vec<(ItemId, u32)> = records.into_iter().collect();
        check_ranked(records.iter().map(|(item_id, rank)| (item_id, *rank)))?;
        records.sort_by_key(|(_, rank)| *rank);

        let mut list = Self {
            band: ReservedBand::new(records.len(), min_count),
            ..Self::default()
        };
        for (item_id, rank) in records {
            let row = list.allocate_row();
            list.entries.push(PreferenceEntry::new(item_id, rank, row));
        }
        list.render_band();
        boundary::recompute(&mut list.entries);
        list.row_ops.clear();
        Ok(list)
    }

    fn render_band(&mut self) {
        for index in self.band.positions() {
            if index < self.entries.len() {
                continue;
            }
            let row = self.allocate_row();
            self.empty_slots.push(EmptySlot {
                row,
                record: FieldRecord::empty(index),
            });
        }
    }

    fn allocate_row(&mut self) -> RowHandle {
        self.next_row += 1;
        RowHandle(self.next_row)
    }

    pub fn band(&self) -> ReservedBand {
        self.band
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the total-count record; always the number of entries.
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[PreferenceEntry] {
        &self.entries
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&PreferenceEntry> {
        self.entries.iter().find(|entry| entry.item_id() == item_id)
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.get(item_id).is_some()
    }

    pub fn entry_at(&self, rank: u32) -> Option<&PreferenceEntry> {
        let index = (rank as usize).checked_sub(1)?;
        self.entries.get(index)
    }

    pub fn empty_slots(&self) -> &[EmptySlot] {
        &self.empty_slots
    }

    pub fn field_records(&self) -> Vec<FieldRecord> {
        self.entries
            .iter()
            .map(|entry| entry.record().clone())
            .collect()
    }

    pub fn views(&self) -> Vec<EntryView> {
        self.entries.iter().map(PreferenceEntry::view).collect()
    }

    pub fn take_row_ops(&mut self) -> Vec<RowOp> {
        std::mem::take(&mut self.row_ops)
    }

    fn position_of(&self, item_id: &ItemId) -> Result<usize, PreferenceError> {
        self.entries
            .iter()
            .position(|entry| entry.item_id() == item_id)
            .ok_or_else(|| PreferenceError::EntryNotFound(item_id.clone()))
    }

    /// Appends `item_id` at the next contiguous rank.
    ///
    /// An empty reserved slot sitting at that rank is filled in place, reusing its row.
    pub fn add(&mut self, item_id: ItemId) -> Result<&PreferenceEntry, PreferenceError> {
        if self.contains(&item_id) {
            return Err(PreferenceError::DuplicateEntry(item_id));
        }

        let index = self.entries.len();
        let rank = index as u32 + 1;

        // Slots never sit below the entry count, so only the slot at `index` can match.
        let reusable = self
            .empty_slots
            .iter()
            .position(|slot| slot.record.index == index);

        let row = match reusable {
            Some(slot_index) => {
                let slot = self.empty_slots.remove(slot_index);
                self.row_ops.push(RowOp::Relabel {
                    row: slot.row,
                    rank,
                });
                slot.row
            }
            None => {
                let row = self.allocate_row();
                self.row_ops.push(RowOp::Insert { row, rank });
                row
            }
        };

        self.entries.push(PreferenceEntry::new(item_id, rank, row));
        boundary::recompute(&mut self.entries);
        Ok(&self.entries[index])
    }

    /// Removes `item_id` and closes the gap by renumbering every later entry.
    pub fn remove(&mut self, item_id: &ItemId) -> Result<PreferenceEntry, PreferenceError> {
        let index = self.position_of(item_id)?;
        let removed = self.entries.remove(index);
        self.row_ops.push(RowOp::Delete { row: removed.row() });

        for entry in &mut self.entries[index..] {
            let rank = entry.rank() - 1;
            entry.set_rank(rank);
            self.row_ops.push(RowOp::Relabel {
                row: entry.row(),
                rank,
            });
        }

        boundary::recompute(&mut self.entries);
        Ok(removed)
    }

    pub fn move_up(&mut self, item_id: &ItemId) -> Result<(), PreferenceError> {
        self.shift(item_id, MoveDirection::Up)
    }

    pub fn move_down(&mut self, item_id: &ItemId) -> Result<(), PreferenceError> {
        self.shift(item_id, MoveDirection::Down)
    }

    /// Swaps the entry with its neighbour in `direction`; no other entry is touched.
    pub fn shift(&mut self, item_id: &ItemId, direction: MoveDirection) -> Result<(), PreferenceError> {
        let index = self.position_of(item_id)?;
        if !boundary::can_move(&self.entries, index, direction) {
            return Err(PreferenceError::BoundaryViolation {
                item_id: item_id.clone(),
                direction,
            });
        }

        let (partner, placement) = match direction {
            MoveDirection::Up => (index - 1, Placement::Before),
            MoveDirection::Down => (index + 1, Placement::After),
        };

        let moved_rank = self.entries[index].rank();
        let partner_rank = self.entries[partner].rank();
        self.entries[index].set_rank(partner_rank);
        self.entries[partner].set_rank(moved_rank);
        self.entries.swap(index, partner);

        let moved = &self.entries[partner];
        let displaced = &self.entries[index];
        self.row_ops.push(RowOp::Relocate {
            row: moved.row(),
            anchor: displaced.row(),
            placement,
        });
        self.row_ops.push(RowOp::Relabel {
            row: moved.row(),
            rank: moved.rank(),
        });
        self.row_ops.push(RowOp::Relabel {
            row: displaced.row(),
            rank: displaced.rank(),
        });

        boundary::recompute(&mut self.entries);
        Ok(())
    }
}
