//! Ranked preference editing kept in lock-step with the field records used for submission.
//!
//! [`PreferenceList`] owns the ordered entries and re-establishes rank contiguity, display
//! order, and record indices after every add, remove, or move. [`PreferenceSession`] is the
//! command surface on top of it: it dispatches [`PreferenceCommand`]s, notifies the
//! presentation sink, and produces [`SubmissionSnapshot`]s.

pub mod boundary;
pub mod domain;
pub mod import;
pub mod list;
pub mod router;
pub mod session;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    EmptySlot, EntryView, FieldRecord, ItemId, MoveControls, MoveDirection, Placement,
    PreferenceEntry, PreferenceError, ReservedBand, RowHandle, RowOp,
};
pub use import::{PreferenceCsvImporter, PreferenceImportError};
pub use list::PreferenceList;
pub use router::{preference_router, SharedSession};
pub use session::{
    ChangeKind, ChangeNotification, ChangeSink, CommandOutcome, PreferenceCommand,
    PreferenceSession, RecordingSink, SessionView, TracingSink,
};
pub use submission::{
    PreferenceLimits, SubmissionError, SubmissionSnapshot, SubmissionWindow, DEFAULT_FORM_PREFIX,
    MAX_NUM_FORMS_DEFAULT,
};
