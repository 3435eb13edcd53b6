//! Interrupt arbitration.
//!
//! Four request lines feed the top half of a 74LS148. Firmware gates them
//! through the PSG's port A (the mask) and reads which source won back
//! through port B. The encoder output drives the Z80's /INT line.
//!
//! ```text
//!   HCCA RX ──┐
//!   HCCA TX ──┤   AND   ┌─────────┐  GS ──► /INT
//!   KEYBOARD ─┤──mask──►│ 74LS148 │  A2-A0 ─► vector, port B
//!   VDP ──────┘         └─────────┘
//! ```
//!
//! The output is never patched incrementally. Every input change re-runs
//! [`resolve`] over the full request and mask state.

use emu_core::{Observable, Value};
use ti_74ls148::{Encoded, encode};

/// Encoder input each source drives. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Source {
    /// HCCA receive data available.
    Receive = 7,
    /// HCCA transmit buffer empty.
    Transmit = 6,
    /// Keyboard code available.
    Keyboard = 5,
    /// VDP vertical blank.
    Vblank = 4,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Receive,
        Source::Transmit,
        Source::Keyboard,
        Source::Vblank,
    ];

    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Inputs 0–3 are tied inactive.
const WIRED_INPUTS: u8 = 0xF0;

/// Encoder output for the given request flags and mask.
#[must_use]
pub const fn resolve(requests: u8, mask: u8) -> Encoded {
    encode(requests & mask & WIRED_INPUTS, true)
}

/// Request flags, mask latch and the derived encoder output.
#[derive(Debug, Clone)]
pub struct InterruptArbiter {
    requests: u8,
    mask: u8,
    output: Encoded,
}

impl InterruptArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: 0,
            mask: 0,
            output: resolve(0, 0),
        }
    }

    pub fn raise(&mut self, source: Source) {
        self.set(source, true);
    }

    pub fn clear(&mut self, source: Source) {
        self.set(source, false);
    }

    /// Drive a request line to `level`.
    pub fn set(&mut self, source: Source, level: bool) {
        if level {
            self.requests |= source.bit();
        } else {
            self.requests &= !source.bit();
        }
        self.recompute();
    }

    /// Port A write.
    pub fn set_mask(&mut self, mask: u8) {
        self.mask = mask;
        self.recompute();
    }

    /// Drop every request line.
    pub fn clear_all(&mut self) {
        self.requests = 0;
        self.recompute();
    }

    /// `(active, vector)` for the CPU interrupt setter.
    #[must_use]
    pub fn line(&self) -> (bool, u8) {
        (self.output.group, self.output.vector)
    }

    #[must_use]
    pub fn is_pending(&self, source: Source) -> bool {
        self.requests & source.bit() != 0
    }

    /// Port B mirror: bit 0 = request active, bits 1–3 = vector.
    #[must_use]
    pub fn port_b(&self) -> u8 {
        u8::from(self.output.group) | (self.output.vector << 1)
    }

    #[must_use]
    pub fn requests(&self) -> u8 {
        self.requests
    }

    #[must_use]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    #[must_use]
    pub fn output(&self) -> Encoded {
        self.output
    }

    // ---- Internal ----

    fn recompute(&mut self) {
        self.output = resolve(self.requests, self.mask);
    }
}

impl Default for InterruptArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for InterruptArbiter {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "irq.flags" => Some(self.requests.into()),
            "irq.mask" => Some(self.mask.into()),
            "irq.vector" => Some(self.output.vector.into()),
            "irq.active" => Some(self.output.group.into()),
            "irq.port_b" => Some(self.port_b().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["irq.flags", "irq.mask", "irq.vector", "irq.active", "irq.port_b"]
    }
}
