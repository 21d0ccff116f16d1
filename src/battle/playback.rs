//! Paced replay of a resolved turn
//!
//! A [`Playback`] is a cursor over an immutable [`FrameTable`]. Whoever
//! drives it waits on a [`FrameClock`] between frames, which is the only
//! suspension point of a turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{self, Interval, MissedTickBehavior};

use crate::battle::resolution::{FrameState, FrameTable};
use crate::core::types::Frame;

/// Shared flag that stops playback before the next frame is scheduled
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of rendering one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// More frames remain; wait for the next tick
    Continue,
    /// The last frame has been rendered
    Finished,
    /// Stopped early by the cancel token
    Cancelled,
}

#[derive(Debug)]
pub struct Playback {
    table: FrameTable,
    cursor: Frame,
    cancel: CancelToken,
    /// Turn this cursor was started for; 0 when detached from any engine
    turn: u32,
}

impl Playback {
    /// Detached cursor, e.g. over a preview table. No engine will play it.
    pub fn new(table: FrameTable, cancel: CancelToken) -> Self {
        Self::for_turn(0, table, cancel)
    }

    pub(crate) fn for_turn(turn: u32, table: FrameTable, cancel: CancelToken) -> Self {
        Self {
            table,
            cursor: 0,
            cancel,
            turn,
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn table(&self) -> &FrameTable {
        &self.table
    }

    /// Frames rendered so far
    pub fn cursor(&self) -> Frame {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.table.frame_count().saturating_sub(self.cursor)
    }

    pub fn is_done(&self) -> bool {
        self.remaining() == 0
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Take the next frame and move the cursor past it
    pub fn advance(&mut self) -> Option<(Frame, &[FrameState])> {
        let frame = self.cursor;
        let row = self.table.frame(frame)?;
        self.cursor += 1;
        Some((frame, row))
    }

    /// Status after the frame just taken with `advance`
    pub fn status(&self) -> PlaybackStatus {
        if self.is_done() {
            PlaybackStatus::Finished
        } else if self.is_cancelled() {
            PlaybackStatus::Cancelled
        } else {
            PlaybackStatus::Continue
        }
    }
}

/// Wall-clock cadence for loops that drive [`Playback`] by hand.
///
/// Event-driven loops wake on input as well as on timeouts; a frame is only
/// due once a full period has passed since the last one.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    next_at: Instant,
}

impl FramePacer {
    /// First frame is due at `now`
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_at: now,
        }
    }

    /// Consume the tick if one is due
    pub fn take_due(&mut self, now: Instant) -> bool {
        if now < self.next_at {
            return false;
        }
        self.next_at += self.period;
        // Fall behind by at most one period
        if self.next_at < now {
            self.next_at = now + self.period;
        }
        true
    }

    /// Time left until the next frame is due
    pub fn wait_time(&self, now: Instant) -> Duration {
        self.next_at.saturating_duration_since(now)
    }
}

/// The animation tick playback waits on between frames
///
/// Playback runs on one task, so the returned future need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait FrameClock {
    async fn next_frame(&mut self);
}

/// Fixed-rate clock backed by a tokio interval
pub struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    /// Must be created inside a tokio runtime
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl FrameClock for IntervalClock {
    async fn next_frame(&mut self) {
        self.interval.tick().await;
    }
}

/// Yields to the scheduler without waiting (headless runs, tests)
#[derive(Debug, Default)]
pub struct ImmediateClock {
    ticks: u64,
}

impl ImmediateClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl FrameClock for ImmediateClock {
    async fn next_frame(&mut self) {
        self.ticks += 1;
        tokio::task::yield_now().await;
    }
}
