use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::clock::{Clock, ManualClock};

use super::{Scheduler, TimerCallback, TimerHandle, lock};

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Deadlines are measured against the shared [`ManualClock`]. Advancing walks
/// the clock through every due deadline in order, so a callback observes the
/// exact instant it was scheduled for.
pub struct ManualScheduler {
    clock: ManualClock,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next: u64,
    queue: BTreeMap<(Instant, u64), TimerCallback>,
    deadlines: HashMap<u64, Instant>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    /// Moves time forward by `by`, firing every callback that falls due,
    /// including ones scheduled by callbacks fired along the way.
    pub fn advance(&self, by: Duration) {
        let target = deadline_after(self.clock.now(), by);
        while let Some((deadline, callback)) = self.pop_due(target) {
            self.clock.advance_to(deadline);
            callback();
        }
        self.clock.advance_to(target);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        lock(&self.state)
            .queue
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    fn pop_due(&self, target: Instant) -> Option<(Instant, TimerCallback)> {
        let mut state = lock(&self.state);
        let (&(deadline, id), _) = state.queue.iter().next()?;
        if deadline > target {
            return None;
        }
        state.deadlines.remove(&id);
        state
            .queue
            .remove(&(deadline, id))
            .map(|callback| (deadline, callback))
    }
}

// Same cap tokio applies to `sleep`: roughly thirty years out.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let deadline = deadline_after(self.clock.now(), delay);
        let mut state = lock(&self.state);
        state.next += 1;
        let id = state.next;
        state.queue.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = lock(&self.state);
        if let Some(deadline) = state.deadlines.remove(&handle.0) {
            state.queue.remove(&(deadline, handle.0));
        }
    }

    fn pending(&self) -> usize {
        lock(&self.state).queue.len()
    }
}
