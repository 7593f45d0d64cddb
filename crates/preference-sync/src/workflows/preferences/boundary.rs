//! Move legality derived from position in the ordered entry sequence.

use super::domain::{MoveControls, MoveDirection, PreferenceEntry};

/// Controls for the entry at `index` in a list of `len` entries.
pub fn controls_for(index: usize, len: usize) -> MoveControls {
    MoveControls {
        up_enabled: index > 0,
        down_enabled: index + 1 < len,
    }
}

/// Whether the entry at `index` may move in `direction`.
pub fn can_move(entries: &[PreferenceEntry], index: usize, direction: MoveDirection) -> bool {
    if index >= entries.len() {
        return false;
    }
    let controls = controls_for(index, entries.len());
    match direction {
        MoveDirection::Up => controls.up_enabled,
        MoveDirection::Down => controls.down_enabled,
    }
}

/// Disables up on the first entry and down on the last; enables everything else.
pub fn recompute(entries: &mut [PreferenceEntry]) {
    let len = entries.len();
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.set_controls(controls_for(index, len));
    }
}
