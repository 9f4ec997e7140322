use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::clock::Timer;
use crate::clock::TimerHandle;

type Task = Box<dyn FnOnce() + Send>;

/// Deadline first, then scheduling order for tasks due at the same instant.
type Key = (Duration, u64);

/// A simulated clock and timer.
///
/// Time only moves when [`ManualTimer::advance`] is called. Tasks that fall due are run
/// synchronously, in deadline order, on the thread calling `advance`. Clones share the same
/// time and task queue.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<Key, Task>,
}

#[derive(Debug)]
pub struct ManualTimerHandle {
    state: Weak<Mutex<State>>,
    key: Key,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `by`, running every task whose deadline is reached.
    ///
    /// Tasks scheduled by a running task are honoured if they fall due within the same
    /// advance.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now.saturating_add(by);

        loop {
            let task = {
                let mut state = self.state.lock();
                let due = state
                    .queue
                    .first_key_value()
                    .map(|(&(deadline, _), _)| deadline)
                    .filter(|deadline| *deadline <= target);
                match due {
                    Some(deadline) => {
                        state.now = deadline;
                        state.queue.pop_first().map(|(_, task)| task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            // The lock is released so the task may schedule or cancel.
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Number of scheduled tasks that have neither run nor been cancelled.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl Clock for ManualTimer {
    fn now(&self) -> Duration {
        self.state.lock().now
    }
}

impl Timer for ManualTimer {
    type Handle = ManualTimerHandle;

    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        let key = (state.now.saturating_add(delay), state.next_id);
        state.next_id += 1;
        state.queue.insert(key, Box::new(task));

        ManualTimerHandle {
            state: Arc::downgrade(&self.state),
            key,
        }
    }
}

impl TimerHandle for ManualTimerHandle {
    fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().queue.remove(&self.key);
        }
    }
}
