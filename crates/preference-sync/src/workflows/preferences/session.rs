use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    EmptySlot, EntryView, ItemId, MoveDirection, PreferenceError, ReservedBand, RowOp,
};
use super::list::PreferenceList;
use super::submission::{PreferenceLimits, SubmissionError, SubmissionSnapshot, SubmissionWindow};

/// Externally invocable command against the preference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "item_id", rename_all = "snake_case")]
pub enum PreferenceCommand {
    Add(ItemId),
    Remove(ItemId),
    MoveUp(ItemId),
    MoveDown(ItemId),
}

impl PreferenceCommand {
    pub fn item_id(&self) -> &ItemId {
        match self {
            Self::Add(item_id)
            | Self::Remove(item_id)
            | Self::MoveUp(item_id)
            | Self::MoveDown(item_id) => item_id,
        }
    }

    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Add(_) => ChangeKind::Added,
            Self::Remove(_) => ChangeKind::Removed,
            Self::MoveUp(_) => ChangeKind::MovedUp,
            Self::MoveDown(_) => ChangeKind::MovedDown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    MovedUp,
    MovedDown,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::MovedUp => "moved_up",
            Self::MovedDown => "moved_down",
        }
    }
}

/// Published to the presentation layer after every applied command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub kind: ChangeKind,
    pub item_id: ItemId,
    pub entries: Vec<EntryView>,
    pub row_ops: Vec<RowOp>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied(ChangeNotification),
    /// A move past the first or last position; nothing changed and nothing was published.
    Ignored {
        item_id: ItemId,
        direction: MoveDirection,
    },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Presentation collaborator receiving change notifications.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, notification: &ChangeNotification);
}

/// Keeps every notification in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ChangeNotification>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ChangeNotification> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl ChangeSink for RecordingSink {
    fn publish(&self, notification: &ChangeNotification) {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(notification.clone());
    }
}

/// Logs each notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn publish(&self, notification: &ChangeNotification) {
        info!(
            kind = notification.kind.label(),
            item_id = %notification.item_id,
            total_count = notification.total_count,
            row_ops = notification.row_ops.len(),
            "preference list changed"
        );
    }
}

/// Serializable state of the whole session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub entries: Vec<EntryView>,
    pub empty_slots: Vec<EmptySlot>,
    pub total_count: usize,
    pub band: ReservedBand,
    pub limits: PreferenceLimits,
}

/// One editing session: the preference list, its presentation sink, and submission rules.
pub struct PreferenceSession<S> {
    list: PreferenceList,
    sink: S,
    limits: PreferenceLimits,
    window: Option<SubmissionWindow>,
}

impl<S: ChangeSink> PreferenceSession<S> {
    /// Takes ownership of `list`; row edits made before the session existed are discarded.
    pub fn new(mut list: PreferenceList, sink: S) -> Self {
        list.take_row_ops();
        Self {
            list,
            sink,
            limits: PreferenceLimits::default(),
            window: None,
        }
    }

    pub fn with_limits(mut self, limits: PreferenceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Gates submission on `window`; without one, snapshots can be taken at any time.
    pub fn with_window(mut self, window: SubmissionWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn list(&self) -> &PreferenceList {
        &self.list
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs `command` to completion and notifies the sink when it changed the list.
    pub fn dispatch(
        &mut self,
        command: PreferenceCommand,
    ) -> Result<CommandOutcome, PreferenceError> {
        let kind = command.kind();
        let result = match &command {
            PreferenceCommand::Add(item_id) => self.list.add(item_id.clone()).map(|_| ()),
            PreferenceCommand::Remove(item_id) => self.list.remove(item_id).map(|_| ()),
            PreferenceCommand::MoveUp(item_id) => self.list.move_up(item_id),
            PreferenceCommand::MoveDown(item_id) => self.list.move_down(item_id),
        };

        match result {
            Ok(()) => {
                let notification = ChangeNotification {
                    kind,
                    item_id: command.item_id().clone(),
                    entries: self.list.views(),
                    row_ops: self.list.take_row_ops(),
                    total_count: self.list.total_count(),
                };
                self.sink.publish(&notification);
                Ok(CommandOutcome::Applied(notification))
            }
            Err(PreferenceError::BoundaryViolation { item_id, direction }) => {
                debug!(%item_id, direction = direction.label(), "ignoring move past list boundary");
                Ok(CommandOutcome::Ignored { item_id, direction })
            }
            Err(err) => {
                warn!(kind = kind.label(), error = %err, "preference command rejected");
                Err(err)
            }
        }
    }

    pub fn add(&mut self, item_id: impl Into<ItemId>) -> Result<CommandOutcome, PreferenceError> {
        self.dispatch(PreferenceCommand::Add(item_id.into()))
    }

    pub fn remove(&mut self, item_id: impl Into<ItemId>) -> Result<CommandOutcome, PreferenceError> {
        self.dispatch(PreferenceCommand::Remove(item_id.into()))
    }

    pub fn move_up(&mut self, item_id: impl Into<ItemId>) -> Result<CommandOutcome, PreferenceError> {
        self.dispatch(PreferenceCommand::MoveUp(item_id.into()))
    }

    pub fn move_down(
        &mut self,
        item_id: impl Into<ItemId>,
    ) -> Result<CommandOutcome, PreferenceError> {
        self.dispatch(PreferenceCommand::MoveDown(item_id.into()))
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            entries: self.list.views(),
            empty_slots: self.list.empty_slots().to_vec(),
            total_count: self.list.total_count(),
            band: self.list.band(),
            limits: self.limits,
        }
    }

    pub fn submission(&self) -> Result<SubmissionSnapshot, SubmissionError> {
        self.submission_at(Utc::now())
    }

    /// Snapshot of the field records as of `now`, audited against the configured limits.
    pub fn submission_at(&self, now: DateTime<Utc>) -> Result<SubmissionSnapshot, SubmissionError> {
        if self.window.is_some_and(|window| !window.is_open(now)) {
            return Err(SubmissionError::WindowClosed);
        }
        let snapshot = SubmissionSnapshot::new(
            self.list.field_records(),
            self.list.band().initial_count,
            self.limits,
            now,
        );
        snapshot.validate(self.limits)?;
        Ok(snapshot)
    }
}
