//! Timer State Model
//!
//! Pure state machine behind the workout stopwatch: one total counter and two
//! nested counters (checkpoint, waypoint) that only advance while the total
//! timer is running. No clock lives here; the timer service drives `tick`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one of the three stopwatch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    Total,
    Checkpoint,
    Waypoint,
}

/// Published view of the stopwatch, one value per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Ticks (milliseconds) since the total timer started
    pub total: u64,

    /// Ticks since the checkpoint timer was last (re)started
    pub checkpoint: u64,

    /// Ticks since the waypoint timer was last (re)started
    pub waypoint: u64,

    pub total_running: bool,
    pub checkpoint_running: bool,
    pub waypoint_running: bool,
}

/// Mutable stopwatch state.
///
/// Invariant: `checkpoint_running` and `waypoint_running` are false whenever
/// `total_running` is false.
#[derive(Debug, Clone, Default)]
pub struct TimerState {
    total: u64,
    checkpoint: u64,
    waypoint: u64,
    total_running: bool,
    checkpoint_running: bool,
    waypoint_running: bool,
    generation: u64,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the total timer. Returns `false` if it was already running.
    pub fn start_total(&mut self) -> bool {
        if self.total_running {
            return false;
        }

        self.total = 0;
        self.checkpoint = 0;
        self.waypoint = 0;
        self.total_running = true;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    /// Stop everything and zero all counters.
    ///
    /// Returns the total count reached before the reset.
    pub fn stop_total(&mut self) -> u64 {
        let elapsed = self.total;

        self.total_running = false;
        self.checkpoint_running = false;
        self.waypoint_running = false;
        self.total = 0;
        self.checkpoint = 0;
        self.waypoint = 0;

        elapsed
    }

    /// (Re)start the checkpoint timer from zero. No-op while total is stopped.
    pub fn start_checkpoint(&mut self) -> bool {
        if !self.total_running {
            return false;
        }
        self.checkpoint = 0;
        self.checkpoint_running = true;
        true
    }

    pub fn stop_checkpoint(&mut self) {
        self.checkpoint = 0;
        self.checkpoint_running = false;
    }

    /// (Re)start the waypoint timer from zero. No-op while total is stopped.
    pub fn start_waypoint(&mut self) -> bool {
        if !self.total_running {
            return false;
        }
        self.waypoint = 0;
        self.waypoint_running = true;
        true
    }

    pub fn stop_waypoint(&mut self) {
        self.waypoint = 0;
        self.waypoint_running = false;
    }

    /// Start the given timer
    pub fn start(&mut self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Total => self.start_total(),
            TimerKind::Checkpoint => self.start_checkpoint(),
            TimerKind::Waypoint => self.start_waypoint(),
        }
    }

    /// Advance by one tick. Returns `false` once the total timer is stopped,
    /// which ends the driving loop.
    pub fn tick(&mut self) -> bool {
        if !self.total_running {
            return false;
        }

        self.total += 1;
        if self.checkpoint_running {
            self.checkpoint += 1;
        }
        if self.waypoint_running {
            self.waypoint += 1;
        }
        true
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Total => self.total_running,
            TimerKind::Checkpoint => self.checkpoint_running,
            TimerKind::Waypoint => self.waypoint_running,
        }
    }

    pub fn elapsed(&self, kind: TimerKind) -> u64 {
        match kind {
            TimerKind::Total => self.total,
            TimerKind::Checkpoint => self.checkpoint,
            TimerKind::Waypoint => self.waypoint,
        }
    }

    /// Incremented on every successful `start_total`; lets a driving loop
    /// detect that the run it belongs to has ended.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            total: self.total,
            checkpoint: self.checkpoint,
            waypoint: self.waypoint,
            total_running: self.total_running,
            checkpoint_running: self.checkpoint_running,
            waypoint_running: self.waypoint_running,
        }
    }
}
