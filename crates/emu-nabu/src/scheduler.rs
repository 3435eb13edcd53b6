//! Scanline timing.
//!
//! The machine runs in slices of one NTSC scanline. The CPU is stepped
//! until its cycle counter passes the slice boundary, then per-slice
//! housekeeping runs and the slice index advances. 262 slices make a
//! frame; the first 240 indices are rendered.
//!
//! Wall-clock pacing is kept out of cycle accounting: [`Pacer`] only
//! blocks the caller, it never adjusts the boundary.

use std::thread;
use std::time::{Duration, Instant};

/// Z80 clock: NTSC colourburst, 3.579545 MHz.
pub const CPU_FREQUENCY: u32 = 3_579_545;

/// T-states per slice.
pub const CYCLES_PER_SLICE: u64 = 228;

/// Slices per frame.
pub const SLICES_PER_FRAME: u16 = 262;

/// Slice indices below this are rendered.
pub const VISIBLE_SLICES: u16 = 240;

/// First slice carrying VDP active display.
pub const ACTIVE_FIRST: u16 = 24;

/// VDP active display lines.
pub const ACTIVE_LINES: u16 = 192;

/// Wall-clock time per slice.
pub const SLICE_INTERVAL: Duration = Duration::from_nanos(63_492);

/// Empty-queue slices before the keyboard sends a keep-alive.
pub const WATCHDOG_SLICES: u32 = 58_000;

/// What the slice that just finished leads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEvent {
    /// Render this line.
    Visible(u16),
    /// Vertical blanking, nothing to render.
    Blanking,
    /// The frame wrapped; the slice index is back at 0.
    FrameComplete,
}

/// Slice boundary and index within the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceTimer {
    next_boundary: u64,
    line: u16,
}

impl SliceTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_boundary: CYCLES_PER_SLICE,
            line: 0,
        }
    }

    /// True once `cycles` has passed the current boundary.
    #[must_use]
    pub fn due(&self, cycles: u64) -> bool {
        cycles > self.next_boundary
    }

    /// Close the current slice: step the index and move the boundary.
    pub fn advance(&mut self) -> SliceEvent {
        self.next_boundary += CYCLES_PER_SLICE;
        self.line += 1;
        if self.line >= SLICES_PER_FRAME {
            self.line = 0;
            SliceEvent::FrameComplete
        } else if self.line < VISIBLE_SLICES {
            SliceEvent::Visible(self.line)
        } else {
            SliceEvent::Blanking
        }
    }

    #[must_use]
    pub fn next_boundary(&self) -> u64 {
        self.next_boundary
    }

    #[must_use]
    pub fn line(&self) -> u16 {
        self.line
    }
}

impl Default for SliceTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// VDP row for slice `line`, if the line is inside the active display.
#[must_use]
pub fn active_row(line: u16) -> Option<u8> {
    let row = line.checked_sub(ACTIVE_FIRST)?;
    (row < ACTIVE_LINES).then_some(row as u8)
}

/// Holds each slice to a fixed wall-clock interval.
///
/// Deadlines advance by exactly one interval so short oversleeps are
/// absorbed. If the host falls behind by more than a slice, the deadline
/// resynchronises to now instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Block until one interval has elapsed since the previous call.
    pub fn wait(&mut self) {
        let now = Instant::now();
        let Some(last) = self.last else {
            self.last = Some(now);
            return;
        };
        let deadline = last + self.interval;
        if now < deadline {
            thread::sleep(deadline - now);
            self.last = Some(deadline);
        } else if now - deadline > self.interval {
            self.last = Some(now);
        } else {
            self.last = Some(deadline);
        }
    }

    /// Forget the previous deadline; the next `wait` returns immediately.
    pub fn rearm(&mut self) {
        self.last = None;
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Keyboard keep-alive watchdog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchdog {
    threshold: u32,
    idle: u32,
}

impl Watchdog {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self { threshold, idle: 0 }
    }

    /// Feed one slice's queue state. Returns true when a keep-alive is due.
    pub fn observe(&mut self, queue_empty: bool) -> bool {
        if !queue_empty {
            self.idle = 0;
            return false;
        }
        self.idle += 1;
        if self.idle >= self.threshold {
            self.idle = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.idle = 0;
    }

    #[must_use]
    pub fn idle(&self) -> u32 {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_boundary_at_228() {
        let timer = SliceTimer::new();
        assert!(!timer.due(0));
        assert!(!timer.due(228));
        assert!(timer.due(229));
    }

    #[test]
    fn boundary_advances_by_slice() {
        let mut timer = SliceTimer::new();
        timer.advance();
        assert_eq!(timer.next_boundary(), 456);
        assert!(!timer.due(456));
        assert!(timer.due(457));
    }

    #[test]
    fn frame_sequence() {
        let mut timer = SliceTimer::new();
        let events: Vec<SliceEvent> = (0..SLICES_PER_FRAME).map(|_| timer.advance()).collect();
        assert_eq!(events[0], SliceEvent::Visible(1));
        assert_eq!(events[238], SliceEvent::Visible(239));
        assert_eq!(events[239], SliceEvent::Blanking);
        assert_eq!(events[260], SliceEvent::Blanking);
        assert_eq!(events[261], SliceEvent::FrameComplete);
        assert_eq!(timer.line(), 0);
        assert_eq!(
            events.iter().filter(|e| matches!(e, SliceEvent::Visible(_))).count(),
            239
        );
        assert_eq!(timer.advance(), SliceEvent::Visible(1));
    }

    #[test]
    fn active_rows() {
        assert_eq!(active_row(0), None);
        assert_eq!(active_row(23), None);
        assert_eq!(active_row(24), Some(0));
        assert_eq!(active_row(215), Some(191));
        assert_eq!(active_row(216), None);
    }

    #[test]
    fn watchdog_fires_once_at_threshold() {
        let mut dog = Watchdog::new(3);
        assert!(!dog.observe(true));
        assert!(!dog.observe(true));
        assert!(dog.observe(true));
        assert_eq!(dog.idle(), 0);
        assert!(!dog.observe(true));
    }

    #[test]
    fn watchdog_resets_on_activity() {
        let mut dog = Watchdog::new(3);
        dog.observe(true);
        dog.observe(true);
        assert!(!dog.observe(false));
        assert_eq!(dog.idle(), 0);
        assert!(!dog.observe(true));
        assert!(!dog.observe(true));
        assert!(dog.observe(true));
    }

    #[test]
    fn pacer_holds_interval() {
        let mut pacer = Pacer::new(Duration::from_millis(2));
        let start = Instant::now();
        for _ in 0..4 {
            pacer.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(6));
    }

    #[test]
    fn zero_interval_never_sleeps() {
        let mut pacer = Pacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10_000 {
            pacer.wait();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
