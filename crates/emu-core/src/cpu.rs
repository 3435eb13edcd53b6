//! CPU core trait.

use crate::Bus;

/// An instruction-stepping CPU core.
///
/// The machine drives the CPU one instruction at a time and compares the
/// running cycle count against its own timing boundaries. The bus is
/// borrowed for each step rather than owned, so the machine keeps
/// exclusive ownership of every peripheral between steps.
pub trait Cpu {
    /// Execute one instruction (or accept a pending interrupt) and return
    /// the number of T-states consumed.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Total T-states executed since the last reset.
    fn cycles(&self) -> u64;

    /// Drive the maskable interrupt request line.
    ///
    /// The line is level-triggered: the CPU samples it between
    /// instructions and takes the interrupt only while `active` is high.
    /// `vector` is the 3-bit priority encoder output; how it becomes a
    /// vector byte is up to the CPU's interrupt mode.
    fn set_irq(&mut self, active: bool, vector: u8);

    /// Current program counter, zero-extended.
    fn pc(&self) -> u32;

    /// Reset the CPU to its power-on state. Clears the cycle counter.
    fn reset(&mut self);
}
