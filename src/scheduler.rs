use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

struct Entry<T> {
    deadline: Instant,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

/// Timer queue for the UI thread. Tasks with equal deadlines run in the
/// order they were scheduled.
pub struct Scheduler<T> {
    queue: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            deadline: now + delay,
            seq,
            task,
        }));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Time left until the next task, zero when one is already due.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|Reverse(entry)| entry.deadline <= now)
        {
            if let Some(Reverse(entry)) = self.queue.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
