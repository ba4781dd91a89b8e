//! Virtual-clock activation queue.

use crate::error::{SimError, SimResult};
use ps_core::DeviceId;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

/// Something the scheduler can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    /// One activation cycle of a device or sensor.
    Device(DeviceId),
    /// Refresh of every PLC's register values.
    ReadCycle,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Device(id) => write!(f, "device {id}"),
            Task::ReadCycle => f.write_str("read cycle"),
        }
    }
}

/// A task that ran, and the virtual time it ran at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    pub time: f64,
    pub task: Task,
}

#[derive(Debug)]
struct Entry {
    due: f64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest due entry, FIFO among ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-task timers on a single virtual clock.
///
/// Every task is queued at most once. Due times are fixed when a task is
/// queued, so a speed change only affects what is queued afterwards.
#[derive(Debug)]
pub struct Scheduler {
    now: f64,
    speed: f64,
    seq: u64,
    queue: BinaryHeap<Entry>,
    queued: HashSet<Task>,
}

impl Scheduler {
    pub fn new(speed: f64) -> SimResult<Self> {
        check_speed(speed)?;
        Ok(Self {
            now: 0.0,
            speed,
            seq: 0,
            queue: BinaryHeap::new(),
            queued: HashSet::new(),
        })
    }

    /// Virtual seconds since the clock started.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) -> SimResult<()> {
        check_speed(speed)?;
        self.speed = speed;
        Ok(())
    }

    /// Queue `task` to fire `period / speed` seconds from now.
    ///
    /// Returns false, queuing nothing, if the task is already queued or the
    /// period is not positive.
    pub fn schedule(&mut self, task: Task, period: f64) -> bool {
        if !(period.is_finite() && period > 0.0) || self.queued.contains(&task) {
            return false;
        }
        let due = self.now + period / self.speed;
        self.seq += 1;
        self.queue.push(Entry {
            due,
            seq: self.seq,
            task,
        });
        self.queued.insert(task);
        true
    }

    /// Drop every pending task. Safe to call on an empty queue.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }

    pub fn is_queued(&self, task: Task) -> bool {
        self.queued.contains(&task)
    }

    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek().map(|entry| entry.due)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: f64) -> Option<Fired> {
        if self.next_due()? > until {
            return None;
        }
        let entry = self.queue.pop()?;
        self.queued.remove(&entry.task);
        self.now = self.now.max(entry.due);
        Some(Fired {
            time: self.now,
            task: entry.task,
        })
    }

    /// Move the clock forward to `time`; never moves it back.
    pub fn advance_clock(&mut self, time: f64) {
        if time.is_finite() {
            self.now = self.now.max(time);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn check_speed(speed: f64) -> SimResult<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidArg {
            what: "speed must be positive and finite",
        })
    }
}
