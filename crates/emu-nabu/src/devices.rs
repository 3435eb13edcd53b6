//! Collaborator interfaces.
//!
//! The machine core does not model the VDP, the PSG's tone generators, the
//! network side of the HCCA modem, or presentation. Embedders plug those
//! in through these traits.

use crate::control::Control;
use crate::keyboard::KeyboardQueue;

/// VDP register 1 bit that enables the vertical-blank interrupt.
pub const VDP_REG1_IE: u8 = 0x20;

/// VDP register holding the text/backdrop colour (low nibble = backdrop).
pub const VDP_BACKDROP_REGISTER: u8 = 7;

/// Pixels per VDP scanline.
pub const SCANLINE_WIDTH: usize = 256;

/// TMS9918A-compatible video chip, seen through its two ports.
pub trait VideoChip {
    /// Port $A0 read.
    fn read_data(&mut self) -> u8;
    /// Port $A1 read. Reading status acknowledges the frame flag.
    fn read_status(&mut self) -> u8;
    /// Port $A0 write.
    fn write_data(&mut self, value: u8);
    /// Port $A1 write (address setup or register write).
    fn write_address(&mut self, value: u8);
    /// Current value of register `index` (0–7). No side effects.
    fn register(&self, index: u8) -> u8;
    /// Render active display row `row` (0–191) as palette indices.
    fn scanline(&mut self, row: u8, pixels: &mut [u8; SCANLINE_WIDTH]);
}

/// AY-3-8910-compatible sound chip. Registers 14 and 15 (the I/O ports)
/// are intercepted by the bus and never reach the chip.
pub trait SoundChip {
    /// Latch the register address (0–15).
    fn select_register(&mut self, register: u8);
    /// Write the latched register.
    fn write_data(&mut self, value: u8);
    /// Read the latched register.
    fn read_data(&mut self) -> u8;
}

/// Non-blocking byte transport behind the HCCA port.
pub trait Modem {
    fn bytes_available(&mut self) -> bool;
    fn read_byte(&mut self) -> u8;
    fn write_byte(&mut self, value: u8);
}

/// Receiver for bytes strobed out of the parallel port.
pub trait ParallelSink {
    fn emit(&mut self, value: u8);
}

impl ParallelSink for Vec<u8> {
    fn emit(&mut self, value: u8) {
        self.push(value);
    }
}

/// One visible scanline, handed to the frontend as it is produced.
#[derive(Debug, Clone, Copy)]
pub struct Scanline<'a> {
    /// Slice index within the frame (1–239).
    pub line: u16,
    /// Backdrop colour index (VDP register 7 low nibble).
    pub border: u8,
    /// VDP palette indices for lines inside the active display, `None`
    /// for border-only lines.
    pub pixels: Option<&'a [u8; SCANLINE_WIDTH]>,
    /// Control register at the time the line was produced. Carries the
    /// video-enable bit and LED state.
    pub control: Control,
}

/// Presentation and input. Every method defaults to a no-op so headless
/// embedders can implement only what they need.
pub trait Frontend {
    /// Called once per slice. Push any pending key codes.
    fn poll_input(&mut self, _keyboard: &mut KeyboardQueue) {}
    fn render_scanline(&mut self, _line: &Scanline<'_>) {}
    fn frame_complete(&mut self, _control: Control) {}
}

impl Frontend for () {}
