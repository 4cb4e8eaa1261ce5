//! Optimistic list membership.
//!
//! Every change is shown locally before the store is asked to make it, then
//! either confirmed with the store's copy or rolled back. At most one change
//! per book and list is in flight; a second one is refused rather than
//! queued.

use crate::error::{Error, ErrorKind, Result};
use crate::models::{EntryId, EntryUpdate, LibraryEntry, NewEntry, Status, UserId};
use crate::mutation::{Entries, LocalEntry, Membership, Mutation, Phase, Slot, slot};
use crate::notify::Notifier;
use crate::session::Session;
use crate::store::StoreHandle;
use exn::OptionExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::UtcDateTime;
use tome_catalog::models::CatalogEntry;
use tracing::instrument;

type Generations = HashMap<Slot, u64>;

#[derive(Debug, Default)]
struct State {
    entries: Entries,
    in_flight: HashSet<Slot>,
    /// Bumped every time one of our own changes touches a slot.
    generations: Generations,
}
impl State {
    fn touch(&mut self, slots: &[Slot]) {
        for slot in slots {
            *self.generations.entry(slot.clone()).or_default() += 1;
        }
    }

    fn generation(generations: &Generations, slot: &Slot) -> u64 {
        generations.get(slot).copied().unwrap_or_default()
    }

    /// Whether the store's copy of a slot, read after `seen` was taken, must
    /// not replace the local one: a change of ours is unresolved, or one
    /// resolved while the read was out.
    fn is_held(&self, slot: &Slot, seen: &Generations) -> bool {
        self.in_flight.contains(slot) || Self::generation(&self.generations, slot) != Self::generation(seen, slot)
    }

    /// Replaces a book's entries with the store's, except for held slots.
    fn replace_book(&mut self, book_id: &str, fresh: Vec<LibraryEntry>, seen: &Generations) {
        for status in Status::ALL {
            let slot = slot(book_id, status);
            if self.is_held(&slot, seen) {
                continue;
            }
            match fresh.iter().find(|entry| entry.status == status) {
                Some(entry) => self.entries.insert(slot, LocalEntry::confirmed(entry.clone())),
                None => self.entries.remove(&slot),
            };
        }
    }
}

// The lock is never held across an await, so a poisoned lock only means a
// panic elsewhere; the entries themselves are still consistent.
fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Claim on a set of slots for the duration of one change.
///
/// Dropping it without [`settle`](Self::settle) rolls back whatever was
/// applied, which also covers the caller's future being cancelled.
struct Flight<'a> {
    state: &'a Mutex<State>,
    slots: Vec<Slot>,
    applied: Option<Mutation>,
}
impl Flight<'_> {
    fn apply(&mut self, mutation: Mutation) {
        let mut state = lock(self.state);
        mutation.apply(&mut state.entries);
        state.touch(&self.slots);
        self.applied = Some(mutation);
    }

    fn settle(mut self, confirm: impl FnOnce(&mut Entries)) {
        let mut state = lock(self.state);
        self.applied = None;
        confirm(&mut state.entries);
        state.touch(&self.slots);
    }
}
impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if let Some(mutation) = self.applied.take() {
            mutation.rollback(&mut state.entries);
            state.touch(&self.slots);
            tracing::debug!(slots = ?self.slots, "Rolled back optimistic change");
        }
        for slot in &self.slots {
            state.in_flight.remove(slot);
        }
    }
}

/// Keeps one user's lists in sync with the store.
pub struct Reconciler {
    store: StoreHandle,
    session: Session,
    notifier: Notifier,
    state: Mutex<State>,
    next_temp: AtomicU64,
}

impl Reconciler {
    pub fn new(store: StoreHandle, session: Session, notifier: Notifier) -> Self {
        Self {
            store,
            session,
            notifier,
            state: Mutex::default(),
            next_temp: AtomicU64::new(0),
        }
    }

    /// Replaces the local view with every entry the user has, keeping any
    /// unresolved changes. Returns the number of entries now visible.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn load(&self) -> Result<usize> {
        let user = self.session.require_user()?.clone();
        let seen = lock(&self.state).generations.clone();
        let entries = self.store.list(&user, None).await?;
        let mut state = lock(&self.state);
        let mut local = std::mem::take(&mut state.entries);
        local.retain(|slot, _| state.is_held(slot, &seen));
        for entry in entries {
            let slot = slot(entry.book_id(), entry.status);
            if !state.is_held(&slot, &seen) {
                local.insert(slot, LocalEntry::confirmed(entry));
            }
        }
        state.entries = local;
        Ok(state.entries.values().filter(|local| local.is_visible()).count())
    }

    pub fn membership(&self, book_id: &str, status: Status) -> Membership {
        Membership::of(lock(&self.state).entries.get(&slot(book_id, status)))
    }

    pub fn is_in(&self, book_id: &str, status: Status) -> bool {
        self.membership(book_id, status).is_present()
    }

    /// The entries a book currently has, one per list it is shown in.
    pub fn entries_for(&self, book_id: &str) -> Vec<LibraryEntry> {
        let state = lock(&self.state);
        Status::ALL
            .iter()
            .filter_map(|status| state.entries.get(&slot(book_id, *status)))
            .filter(|local| local.is_visible())
            .map(|local| local.entry.clone())
            .collect()
    }

    /// Visible entries, newest first, optionally limited to one list.
    pub fn entries(&self, status: Option<Status>) -> Vec<LibraryEntry> {
        let mut entries: Vec<_> = lock(&self.state)
            .entries
            .values()
            .filter(|local| local.is_visible() && status.is_none_or(|status| local.entry.status == status))
            .map(|local| local.entry.clone())
            .collect();
        entries.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        entries
    }

    /// Adds the book to the list if it isn't shown there, removes it if it is.
    ///
    /// The outcome is visible through [`membership`](Self::membership) as
    /// soon as this is polled; the returned membership is the settled one.
    #[instrument(skip(self, book), fields(book = %book.id))]
    pub async fn toggle(&self, book: &CatalogEntry, status: Status) -> Result<Membership> {
        let user = self.session.require_user()?.clone();
        let target = slot(&book.id, status);
        let flight = self.begin(vec![target.clone()])?;
        let current = lock(&self.state).entries.get(&target).cloned();
        match current {
            None => self.add(flight, user, book, status).await,
            Some(current) => self.remove(flight, user, target, current).await,
        }
    }

    async fn add(
        &self,
        mut flight: Flight<'_>,
        user: UserId,
        book: &CatalogEntry,
        status: Status,
    ) -> Result<Membership> {
        let target = slot(&book.id, status);
        let temp = EntryId::Pending(self.next_temp.fetch_add(1, Ordering::Relaxed) + 1);
        let placeholder = LibraryEntry::new(temp, user.clone(), book.clone(), status, UtcDateTime::now());
        flight.apply(Mutation::default().set(
            target.clone(),
            None,
            Some(LocalEntry::pending(placeholder, Phase::PendingAdd)),
        ));
        tracing::debug!("Optimistically added");

        let request = NewEntry { user_id: user.clone(), book: book.clone(), status };
        match self.store.insert(request).await {
            Ok(saved) => {
                flight.settle(|entries| {
                    entries.insert(target, LocalEntry::confirmed(saved));
                });
                self.notifier.success(format!("Added to {}", status.label()));
                self.refresh(&user, &book.id).await;
                Ok(self.membership(&book.id, status))
            },
            Err(e) => self.fail(flight, e),
        }
    }

    async fn remove(
        &self,
        mut flight: Flight<'_>,
        user: UserId,
        target: Slot,
        current: LocalEntry,
    ) -> Result<Membership> {
        let id = current
            .entry
            .id
            .persisted()
            .map(str::to_string)
            .ok_or_raise(|| ErrorKind::InvalidData("entry was never saved"))?;
        let status = current.entry.status;
        let removing = LocalEntry::pending(current.entry.clone(), Phase::PendingRemove);
        flight.apply(Mutation::default().set(target.clone(), Some(current), Some(removing)));
        tracing::debug!("Optimistically removed");

        match self.store.delete(&user, &id).await {
            Ok(()) => {
                flight.settle(|entries| {
                    entries.remove(&target);
                });
                self.notifier.success(format!("Removed from {}", status.label()));
                Ok(Membership::Absent)
            },
            Err(e) => self.fail(flight, e),
        }
    }

    /// Applies a partial update to the entry a book has in one list.
    ///
    /// Changing the status moves the entry to the other list, keeping its
    /// id and everything else about it.
    #[instrument(skip(self, update))]
    pub async fn update(&self, book_id: &str, status: Status, update: EntryUpdate) -> Result<LibraryEntry> {
        let user = self.session.require_user()?.clone();
        let from = slot(book_id, status);
        let to = slot(book_id, update.status.unwrap_or(status));
        let mut slots = vec![from.clone()];
        if to != from {
            slots.push(to.clone());
        }
        let mut flight = self.begin(slots)?;
        let (current, occupant) = {
            let state = lock(&self.state);
            (state.entries.get(&from).cloned(), state.entries.get(&to).cloned())
        };
        let current = current.ok_or_raise(|| ErrorKind::NotInList(status))?;
        if to != from && occupant.is_some() {
            exn::bail!(ErrorKind::AlreadyInList);
        }
        let id = current
            .entry
            .id
            .persisted()
            .map(str::to_string)
            .ok_or_raise(|| ErrorKind::InvalidData("entry was never saved"))?;

        let mut optimistic = current.entry.clone();
        update.apply_to(&mut optimistic, UtcDateTime::now());
        let optimistic = LocalEntry::pending(optimistic, Phase::PendingUpdate);
        let mutation = if to == from {
            Mutation::default().set(from, Some(current), Some(optimistic))
        } else {
            Mutation::default().set(from, Some(current), None).set(to.clone(), None, Some(optimistic))
        };
        flight.apply(mutation);
        tracing::debug!("Optimistically updated");

        match self.store.update(&user, &id, &update).await {
            Ok(saved) => {
                flight.settle(|entries| {
                    entries.insert(to, LocalEntry::confirmed(saved.clone()));
                });
                Ok(saved)
            },
            Err(e) => self.fail(flight, e),
        }
    }

    /// Marks a book as read.
    ///
    /// A book that is being read is moved to the read list in place, with
    /// full progress and today's date as its finish date. Otherwise the book
    /// is added to the read list.
    pub async fn mark_as_read(&self, book: &CatalogEntry) -> Result<Membership> {
        self.session.require_user()?;
        let (read, reading, reading_in_flight) = {
            let state = lock(&self.state);
            let reading = slot(&book.id, Status::Reading);
            (
                Membership::of(state.entries.get(&slot(&book.id, Status::Read))),
                Membership::of(state.entries.get(&reading)),
                state.in_flight.contains(&reading),
            )
        };
        if read.is_present() {
            return Ok(read);
        }
        if reading_in_flight {
            exn::bail!(ErrorKind::MutationInFlight);
        }
        if reading != Membership::PresentConfirmed {
            return self.toggle(book, Status::Read).await;
        }
        let update = EntryUpdate::default()
            .status(Status::Read)
            .progress(100)
            .date_finished(UtcDateTime::now().date());
        self.update(&book.id, Status::Reading, update).await?;
        self.notifier.success(format!("Added to {}", Status::Read.label()));
        Ok(self.membership(&book.id, Status::Read))
    }

    /// Counts another read-through of a book in the read list.
    ///
    /// Not optimistic: the count is public next to reviews, so it only
    /// changes once the store has accepted it.
    #[instrument(skip(self))]
    pub async fn mark_as_reread(&self, book_id: &str) -> Result<LibraryEntry> {
        let user = self.session.require_user()?.clone();
        let target = slot(book_id, Status::Read);
        let flight = self.begin(vec![target.clone()])?;
        let current = lock(&self.state).entries.get(&target).cloned();
        let current = current.ok_or_raise(|| ErrorKind::NotInList(Status::Read))?;
        let id = current
            .entry
            .id
            .persisted()
            .map(str::to_string)
            .ok_or_raise(|| ErrorKind::InvalidData("entry was never saved"))?;
        let update = EntryUpdate::default().read_count(current.entry.read_count.saturating_add(1));
        match self.store.update(&user, &id, &update).await {
            Ok(saved) => {
                flight.settle(|entries| {
                    entries.insert(target, LocalEntry::confirmed(saved.clone()));
                });
                Ok(saved)
            },
            Err(e) => self.fail(flight, e),
        }
    }

    /// Rating, notes, finish date and visibility of a review. Any other
    /// field set on `review` is ignored.
    pub async fn update_review(&self, book_id: &str, status: Status, review: EntryUpdate) -> Result<LibraryEntry> {
        let review = EntryUpdate { status: None, progress: None, read_count: None, ..review };
        self.update(book_id, status, review).await
    }

    /// Reading progress in percent, clamped to `0..=100`.
    pub async fn update_progress(&self, book_id: &str, progress: i32) -> Result<LibraryEntry> {
        self.update(book_id, Status::Reading, EntryUpdate::default().progress(progress)).await
    }

    fn begin(&self, slots: Vec<Slot>) -> Result<Flight<'_>> {
        let mut state = lock(&self.state);
        if slots.iter().any(|slot| state.in_flight.contains(slot)) {
            exn::bail!(ErrorKind::MutationInFlight);
        }
        state.in_flight.extend(slots.iter().cloned());
        Ok(Flight { state: &self.state, slots, applied: None })
    }

    /// Rolls back, tells the user (once), and hands the error back.
    fn fail<T>(&self, flight: Flight<'_>, err: Error) -> Result<T> {
        drop(flight);
        tracing::warn!(error = ?err, "Library change rejected");
        let kind: &ErrorKind = &err;
        self.notifier.error(kind.to_string());
        Err(err)
    }

    /// Picks up entries for the book that were changed elsewhere. Best
    /// effort: the change itself already succeeded.
    async fn refresh(&self, user: &UserId, book_id: &str) {
        let seen = lock(&self.state).generations.clone();
        match self.store.entries_for_book(user, book_id).await {
            Ok(fresh) => lock(&self.state).replace_book(book_id, fresh, &seen),
            Err(e) => tracing::warn!(book_id, error = ?e, "Failed to refresh book entries"),
        }
    }
}
