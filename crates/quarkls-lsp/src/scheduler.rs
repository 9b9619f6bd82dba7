//! Cooperative continuation queue for the single-threaded session loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Queue of continuations run between inbound messages.
///
/// Clones share one queue. Tasks scheduled while a turn is running are
/// deferred to the next turn.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a continuation for the next turn.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of queued continuations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs the continuations queued before this call.
    pub fn run_turn(&self) {
        let due = self.pending();
        for _ in 0..due {
            let task = self.queue.borrow_mut().pop_front();
            if let Some(task) = task {
                task();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn runs_tasks_in_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for index in 0..3 {
            let log = Rc::clone(&log);
            scheduler.schedule(move || log.borrow_mut().push(index));
        }

        scheduler.run_turn();
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[rstest]
    fn tasks_scheduled_during_a_turn_wait_for_the_next() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(0));
        let inner_ran = Rc::clone(&ran);
        let handle = scheduler.clone();
        scheduler.schedule(move || {
            let nested = Rc::clone(&inner_ran);
            handle.schedule(move || nested.set(nested.get() + 1));
        });

        scheduler.run_turn();
        assert_eq!(ran.get(), 0);
        assert_eq!(scheduler.pending(), 1);
        scheduler.run_turn();
        assert_eq!(ran.get(), 1);
    }
}
