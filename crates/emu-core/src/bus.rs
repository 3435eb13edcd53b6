//! Memory and I/O bus interface.

/// Memory and port I/O as seen from the CPU.
///
/// Z80-family machines have two independent address spaces: a 16-bit
/// memory space and an 8-bit port space (the high address byte is driven
/// during `IN`/`OUT` but the machines built around this trait decode only
/// the low byte). The bus owns address decoding and routes each access to
/// exactly one device.
pub trait Bus {
    /// Read a byte from memory.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to memory.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from an I/O port.
    fn io_read(&mut self, port: u8) -> u8;

    /// Write a byte to an I/O port.
    fn io_write(&mut self, port: u8, value: u8);
}
