//! Keyboard receive queue.
//!
//! The keyboard talks to an 8251 UART at 6992 baud; each make/break code
//! arrives as one byte. The queue sits between the input collaborator
//! (producer) and port $90 reads (consumer).
//!
//! Storage is a 256-slot ring indexed by 8-bit counters that wrap on
//! overflow, with `head == tail` meaning empty. That leaves room for 255
//! pending codes. A push into a full queue drops the new code rather than
//! letting the head wrap onto the tail, which would silently empty it.

use log::warn;

/// Code the keyboard sends once at power-up.
pub const POWER_UP: u8 = 0x95;

/// Code the keyboard sends periodically when idle to kick the watchdog.
pub const KEEP_ALIVE: u8 = 0x94;

const SLOTS: usize = 256;

pub struct KeyboardQueue {
    slots: [u8; SLOTS],
    head: u8,
    tail: u8,
}

impl KeyboardQueue {
    /// Maximum number of codes the queue can hold.
    pub const CAPACITY: usize = SLOTS - 1;

    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [0; SLOTS],
            head: 0,
            tail: 0,
        }
    }

    /// Append a code. Returns `false` (and drops the code) when full.
    pub fn push(&mut self, code: u8) -> bool {
        let next = self.head.wrapping_add(1);
        if next == self.tail {
            warn!("Keyboard: queue full, dropped code ${code:02X}");
            return false;
        }
        self.slots[usize::from(self.head)] = code;
        self.head = next;
        true
    }

    /// Remove and return the oldest code.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let code = self.slots[usize::from(self.tail)];
        self.tail = self.tail.wrapping_add(1);
        Some(code)
    }

    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        (!self.is_empty()).then(|| self.slots[usize::from(self.tail)])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.head.wrapping_sub(self.tail))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn clear(&mut self) {
        self.tail = self.head;
    }
}

impl Default for KeyboardQueue {
    fn default() -> Self {
        Self::new()
    }
}
