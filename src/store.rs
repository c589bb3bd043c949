//! Observable toast collection with per-toast dismissal timers.
//!
//! Each toast is either *active* (a dismissal timer is pending) or *paused*
//! (hovered, no timer, remaining time frozen). Every mutation happens under a
//! single lock and publishes a fresh [`Snapshot`] before the lock is released,
//! so subscribers never observe a half-applied change. Calls that find nothing
//! to do still publish, with unchanged contents.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::Result;
use crate::clock::{Clock, TokioClock};
use crate::scheduler::{Scheduler, TimerHandle, TokioScheduler};
use crate::toast::{Toast, ToastId, ToastInput};

/// Immutable view of the collection, oldest toast first.
#[derive(Clone, Debug)]
pub struct Snapshot {
    toasts: Arc<[Toast]>,
    version: u64,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            toasts: Arc::from(Vec::new()),
            version: 0,
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Whether the toast container should be mounted at all.
    pub fn show(&self) -> bool {
        !self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|toast| toast.id == id)
    }

    pub fn ids(&self) -> Vec<ToastId> {
        self.toasts.iter().map(|toast| toast.id).collect()
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.toasts, &other.toasts)
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Snapshot", 3)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("show", &self.show())?;
        state.serialize_field("toasts", &*self.toasts)?;
        state.end()
    }
}

#[derive(Clone, Copy, Debug)]
enum Removal {
    Expired,
    Dismissed,
    Replaced,
}

impl Removal {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Dismissed => "dismissed",
            Self::Replaced => "replaced",
        }
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending dismissal owned by an active toast.
///
/// `generation` is unique per store, so a fire that outlived its timer (the
/// toast was removed and the id reused) is recognised and ignored.
struct ArmedTimer {
    handle: TimerHandle,
    generation: u64,
}

struct Entry {
    toast: Toast,
    timer: Option<ArmedTimer>,
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    generation: u64,
    version: u64,
}

impl State {
    fn position(&self, id: ToastId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.toast.id == id)
    }
}

struct Shared {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<State>,
    publisher: watch::Sender<Snapshot>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in state.entries.drain(..) {
            if let Some(timer) = entry.timer {
                self.scheduler.cancel(timer.handle);
            }
        }
    }
}

/// Handle to a toast collection. Clones share the same collection.
#[derive(Clone)]
pub struct ToastStore {
    shared: Arc<Shared>,
}

impl ToastStore {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        let (publisher, _) = watch::channel(Snapshot::empty());
        Self {
            shared: Arc::new(Shared {
                clock,
                scheduler,
                state: Mutex::new(State::default()),
                publisher,
            }),
        }
    }

    /// Store driven by the tokio runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside of a tokio runtime.
    pub fn on_current_runtime() -> Result<Self> {
        let scheduler = TokioScheduler::new()?;
        Ok(Self::new(Arc::new(TokioClock), Arc::new(scheduler)))
    }

    /// Appends a toast and starts its countdown.
    ///
    /// An id that is already present is replaced: the old toast's timer is
    /// canceled and the new toast goes to the back as a fresh entry.
    pub fn add_toast(&self, input: ToastInput) {
        let mut state = self.lock();
        let now = self.shared.clock.now();
        let id = input.id;

        if let Some(pos) = state.position(id) {
            let old = state.entries.remove(pos);
            self.disarm(old.timer);
            debug!(toast_id = %id, reason = %Removal::Replaced, "toast replaced by duplicate id");
        }

        let toast = Toast::start(input, now);
        let timer = self.arm(&mut state, id, toast.timeout);
        info!(
            toast_id = %id,
            kind = %toast.kind,
            timeout_ms = duration_ms(toast.timeout),
            "toast added"
        );
        state.entries.push(Entry {
            toast,
            timer: Some(timer),
        });
        self.publish(&mut state);
    }

    pub fn remove_toast(&self, id: ToastId) {
        let mut state = self.lock();
        self.remove_locked(&mut state, id, Removal::Dismissed);
    }

    /// Freezes a toast's countdown.
    pub fn pause_toast(&self, id: ToastId) {
        let mut state = self.lock();
        let now = self.shared.clock.now();
        let Some(pos) = state.position(id) else {
            trace!(toast_id = %id, "pause ignored, no such toast");
            self.publish(&mut state);
            return;
        };
        if state.entries[pos].toast.is_paused() {
            trace!(toast_id = %id, "pause ignored, already paused");
            self.publish(&mut state);
            return;
        }

        let entry = &mut state.entries[pos];
        self.disarm(entry.timer.take());
        entry.toast = entry.toast.paused_at(now);
        debug!(
            toast_id = %id,
            remaining_ms = duration_ms(entry.toast.remaining()),
            "toast paused"
        );
        self.publish(&mut state);
    }

    /// Restarts a paused toast's countdown from its remaining time.
    pub fn resume_toast(&self, id: ToastId) {
        let mut state = self.lock();
        let now = self.shared.clock.now();
        let Some(pos) = state.position(id) else {
            trace!(toast_id = %id, "resume ignored, no such toast");
            self.publish(&mut state);
            return;
        };
        if !state.entries[pos].toast.is_paused() {
            trace!(toast_id = %id, "resume ignored, already running");
            self.publish(&mut state);
            return;
        }

        let stale = state.entries[pos].timer.take();
        self.disarm(stale);
        let toast = state.entries[pos].toast.resumed_at(now);
        let timer = self.arm(&mut state, id, toast.remaining());
        debug!(
            toast_id = %id,
            remaining_ms = duration_ms(toast.remaining()),
            "toast resumed"
        );
        state.entries[pos] = Entry {
            toast,
            timer: Some(timer),
        };
        self.publish(&mut state);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.publisher.subscribe()
    }

    pub fn get(&self, id: ToastId) -> Option<Toast> {
        let state = self.lock();
        state
            .position(id)
            .map(|pos| state.entries[pos].toast.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn armed_timers(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.timer.is_some())
            .count()
    }

    fn on_timer_fired(&self, id: ToastId, generation: u64) {
        let mut state = self.lock();
        let Some(pos) = state.position(id) else {
            trace!(toast_id = %id, "timer fired for a toast that is gone");
            return;
        };
        let entry = &state.entries[pos];
        if entry.toast.is_paused() {
            debug!(toast_id = %id, "timer fired for a paused toast, ignoring");
            return;
        }
        if !matches!(&entry.timer, Some(timer) if timer.generation == generation) {
            debug!(toast_id = %id, generation, "stale timer fired, ignoring");
            return;
        }
        self.remove_locked(&mut state, id, Removal::Expired);
    }

    fn remove_locked(&self, state: &mut State, id: ToastId, reason: Removal) {
        let Some(pos) = state.position(id) else {
            trace!(toast_id = %id, "remove ignored, no such toast");
            self.publish(state);
            return;
        };
        let entry = state.entries.remove(pos);
        self.disarm(entry.timer);
        info!(toast_id = %id, reason = %reason, "toast removed");
        self.publish(state);
    }

    fn arm(&self, state: &mut State, id: ToastId, delay: Duration) -> ArmedTimer {
        state.generation += 1;
        let generation = state.generation;
        let store: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = self.shared.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(shared) = store.upgrade() {
                    Self { shared }.on_timer_fired(id, generation);
                }
            }),
        );
        ArmedTimer { handle, generation }
    }

    fn disarm(&self, timer: Option<ArmedTimer>) {
        if let Some(timer) = timer {
            self.shared.scheduler.cancel(timer.handle);
        }
    }

    fn publish(&self, state: &mut State) {
        state.version += 1;
        let snapshot = Snapshot {
            toasts: state.entries.iter().map(|entry| entry.toast.clone()).collect(),
            version: state.version,
        };
        self.shared.publisher.send_replace(snapshot);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ToastStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ToastStore;
    use crate::clock::ManualClock;
    use crate::scheduler::{ManualScheduler, Scheduler};
    use crate::toast::{ToastData, ToastId, ToastInput};
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> (ToastStore, Arc<ManualScheduler>) {
        let clock = ManualClock::new();
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let store = ToastStore::new(Arc::new(clock), scheduler.clone());
        (store, scheduler)
    }

    fn input(id: u64, timeout_ms: u64) -> ToastInput {
        ToastInput::new(
            ToastId(id),
            Duration::from_millis(timeout_ms),
            ToastData::message(format!("toast {id}")),
        )
    }

    #[test]
    fn every_mutation_publishes_a_new_snapshot() {
        let (store, _) = store();
        let before = store.snapshot();
        store.add_toast(input(1, 1_000));
        let added = store.snapshot();
        assert!(!before.ptr_eq(&added));
        assert_eq!(added.version(), before.version() + 1);

        store.pause_toast(ToastId(1));
        let paused = store.snapshot();
        assert!(!added.ptr_eq(&paused));
        assert!(!added.get(ToastId(1)).unwrap().is_paused());
        assert!(paused.get(ToastId(1)).unwrap().is_paused());
    }

    #[test]
    fn calls_without_effect_still_publish() {
        let (store, _) = store();
        store.add_toast(input(1, 1_000));
        let before = store.snapshot();
        let mut updates = store.subscribe();

        store.resume_toast(ToastId(1));
        assert!(updates.has_changed().unwrap());
        let seen = updates.borrow_and_update().clone();
        assert_eq!(seen.version(), before.version() + 1);
        assert_eq!(seen.toasts(), before.toasts());

        store.pause_toast(ToastId(9));
        store.resume_toast(ToastId(9));
        store.remove_toast(ToastId(9));
        store.pause_toast(ToastId(1));
        store.pause_toast(ToastId(1));

        let after = store.snapshot();
        assert_eq!(after.version(), before.version() + 6);
        assert_eq!(after.ids(), vec![ToastId(1)]);
        assert!(after.get(ToastId(1)).unwrap().is_paused());
    }

    #[test]
    fn duplicate_id_replaces_and_moves_to_back() {
        let (store, scheduler) = store();
        store.add_toast(input(1, 1_000));
        store.add_toast(input(2, 1_000));
        scheduler.advance(Duration::from_millis(600));

        store.add_toast(input(1, 1_000));
        assert_eq!(store.snapshot().ids(), vec![ToastId(2), ToastId(1)]);
        assert_eq!(scheduler.pending(), 2);

        scheduler.advance(Duration::from_millis(400));
        assert_eq!(store.snapshot().ids(), vec![ToastId(1)]);

        scheduler.advance(Duration::from_millis(600));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_cancels_pending_timer() {
        let (store, scheduler) = store();
        store.add_toast(input(1, 1_000));
        store.remove_toast(ToastId(1));
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(store.armed_timers(), 0);
    }

    #[test]
    fn stale_fire_does_not_remove_reused_id() {
        let (store, _) = store();
        store.add_toast(input(1, 1_000));
        let old_generation = store.lock().entries[0].timer.as_ref().unwrap().generation;
        store.remove_toast(ToastId(1));
        store.add_toast(input(1, 1_000));

        store.on_timer_fired(ToastId(1), old_generation);
        assert!(store.get(ToastId(1)).is_some());
    }

    #[test]
    fn fire_while_paused_is_ignored() {
        let (store, _) = store();
        store.add_toast(input(1, 1_000));
        let generation = store.lock().entries[0].timer.as_ref().unwrap().generation;
        store.pause_toast(ToastId(1));

        store.on_timer_fired(ToastId(1), generation);
        assert!(store.get(ToastId(1)).unwrap().is_paused());
    }

    #[test]
    fn dropping_the_store_cancels_timers() {
        let (store, scheduler) = store();
        store.add_toast(input(1, 1_000));
        store.add_toast(input(2, 1_000));
        drop(store);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn snapshot_serializes_show_flag() {
        let (store, _) = store();
        store.add_toast(input(4, 250));
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["show"], true);
        assert_eq!(json["version"], 1);
        assert_eq!(json["toasts"][0]["id"], 4);
        assert_eq!(json["toasts"][0]["remaining"], 250);
    }
}
