//! NABU Personal Computer system core.
//!
//! The NABU pairs a 3.58 MHz Z80 with a TMS9918A VDP, an AY-3-8910 PSG
//! (whose I/O ports double as the interrupt controller), a keyboard UART,
//! the HCCA cable-modem UART, a parallel printer port and an optional
//! floppy controller card.
//!
//! This crate owns what sits between those chips: memory and port
//! decoding, the 74LS148 interrupt priority network, the floppy card, and
//! the scanline scheduler that paces the CPU against video timing. The CPU,
//! VDP, PSG, modem transport and presentation are supplied by the embedder
//! through the traits in [`devices`] and [`emu_core`].
//!
//! # Port map
//!
//! | Port      | Device                               |
//! |-----------|--------------------------------------|
//! | $00       | control register (write)             |
//! | $40/$41   | PSG data / register address          |
//! | $80       | HCCA modem data                      |
//! | $90/$91   | keyboard data / status               |
//! | $A0/$A1   | VDP data / control                   |
//! | $B0       | parallel port data                   |
//! | $C0-$CF   | floppy controller card               |

mod bus;
mod config;
mod control;
pub mod devices;
mod error;
mod interrupt;
mod keyboard;
mod memory;
mod nabu;
pub mod scheduler;

pub use bus::{NabuBus, PSG_PORT_A, PSG_PORT_B, UNMAPPED, ports};
pub use config::{NabuConfig, POWER_ON_CONTROL, Rom};
pub use control::Control;
pub use devices::{Frontend, Modem, ParallelSink, Scanline, SoundChip, VideoChip};
pub use error::NabuError;
pub use interrupt::{InterruptArbiter, Source, resolve};
pub use keyboard::{KEEP_ALIVE, KeyboardQueue, POWER_UP};
pub use memory::{NabuMemory, RAM_SIZE};
pub use nabu::Nabu;
pub use nabu_fdc::{DiskError, DiskImage, Fdc, Geometry};
pub use scheduler::SliceEvent;
