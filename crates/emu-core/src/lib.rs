//! Core traits for cycle-paced emulation of port-mapped 8-bit machines.
//!
//! A CPU never owns the machine it runs in. It borrows a [`Bus`] for the
//! duration of one instruction and reports how many T-states it spent.
//! Everything else (peripherals, scheduling, pacing) is the machine's job.

mod bus;
mod cpu;
mod observable;

pub use bus::Bus;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
