//! Local view of a user's lists and the reversible changes applied to it.

use crate::models::{LibraryEntry, Status};
use std::collections::BTreeMap;

/// One book in one list.
pub(crate) type Slot = (String, Status);
pub(crate) type Entries = BTreeMap<Slot, LocalEntry>;

pub(crate) fn slot(book_id: &str, status: Status) -> Slot {
    (book_id.to_string(), status)
}

/// How far a local entry is from the store's view of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Confirmed,
    PendingAdd,
    PendingUpdate,
    /// Kept around so a failed removal can restore it; hidden from readers.
    PendingRemove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalEntry {
    pub(crate) entry: LibraryEntry,
    pub(crate) phase: Phase,
}
impl LocalEntry {
    pub(crate) fn confirmed(entry: LibraryEntry) -> Self {
        Self { entry, phase: Phase::Confirmed }
    }

    pub(crate) fn pending(entry: LibraryEntry, phase: Phase) -> Self {
        Self { entry, phase }
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.phase != Phase::PendingRemove
    }
}

/// Whether a book is in a list, as the user currently sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Absent,
    PresentConfirmed,
    /// Shown as present; the store hasn't acknowledged the change yet.
    PresentOptimistic,
    /// Shown as absent; the store hasn't acknowledged the removal yet.
    AbsentOptimistic,
}
impl Membership {
    pub(crate) fn of(local: Option<&LocalEntry>) -> Self {
        match local.map(|local| local.phase) {
            None => Self::Absent,
            Some(Phase::Confirmed) => Self::PresentConfirmed,
            Some(Phase::PendingAdd | Phase::PendingUpdate) => Self::PresentOptimistic,
            Some(Phase::PendingRemove) => Self::AbsentOptimistic,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::PresentConfirmed | Self::PresentOptimistic)
    }
}

#[derive(Debug, Clone)]
struct Change {
    slot: Slot,
    before: Option<LocalEntry>,
    after: Option<LocalEntry>,
}

/// A reversible change to the local entries: every touched slot with its
/// value before and after.
#[derive(Debug, Clone, Default)]
pub(crate) struct Mutation {
    changes: Vec<Change>,
}
impl Mutation {
    pub(crate) fn set(mut self, slot: Slot, before: Option<LocalEntry>, after: Option<LocalEntry>) -> Self {
        self.changes.push(Change { slot, before, after });
        self
    }

    pub(crate) fn apply(&self, entries: &mut Entries) {
        for change in &self.changes {
            write(entries, &change.slot, change.after.clone());
        }
    }

    pub(crate) fn rollback(&self, entries: &mut Entries) {
        for change in self.changes.iter().rev() {
            write(entries, &change.slot, change.before.clone());
        }
    }
}

fn write(entries: &mut Entries, slot: &Slot, value: Option<LocalEntry>) {
    match value {
        Some(local) => {
            entries.insert(slot.clone(), local);
        },
        None => {
            entries.remove(slot);
        },
    }
}
