//! NABU memory map.
//!
//! 64K of RAM fills the whole address space. The boot ROM overlays the
//! bottom of it for reads only, until firmware sets ROM_DISABLE in the
//! control register. Writes always land in RAM, so code can be copied
//! "under" the ROM before it is banked out.

use crate::config::Rom;

pub const RAM_SIZE: usize = 0x1_0000;

pub struct NabuMemory {
    ram: Box<[u8; RAM_SIZE]>,
    rom: Rom,
}

impl NabuMemory {
    #[must_use]
    pub fn new(rom: Rom) -> Self {
        Self {
            ram: Box::new([0; RAM_SIZE]),
            rom,
        }
    }

    /// CPU read. `rom_enabled` is the inverse of the control register's
    /// ROM_DISABLE bit.
    #[must_use]
    pub fn read(&self, address: u16, rom_enabled: bool) -> u8 {
        let rom = self.rom.as_slice();
        match rom.get(usize::from(address)) {
            Some(&byte) if rom_enabled => byte,
            _ => self.ram[usize::from(address)],
        }
    }

    /// CPU write. Always RAM.
    pub fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    /// Read RAM directly, ignoring the ROM overlay.
    #[must_use]
    pub fn peek_ram(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    /// Copy a block into RAM starting at `address`, wrapping at $FFFF.
    pub fn load_ram(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    #[must_use]
    pub fn rom(&self) -> &Rom {
        &self.rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with_rom(size: usize) -> NabuMemory {
        let rom: Vec<u8> = (0..size).map(|i| (i as u8) ^ 0xA5).collect();
        NabuMemory::new(Rom::from_bytes(rom).expect("rom"))
    }

    #[test]
    fn rom_overlays_reads_below_its_size() {
        let mut mem = memory_with_rom(4096);
        mem.write(0x0000, 0x11);
        mem.write(0x0FFF, 0x22);
        mem.write(0x1000, 0x33);
        assert_eq!(mem.read(0x0000, true), 0xA5);
        assert_eq!(mem.read(0x0FFF, true), 0xFF ^ 0xA5);
        assert_eq!(mem.read(0x1000, true), 0x33, "4K ROM ends at $0FFF");
    }

    #[test]
    fn disabled_rom_exposes_ram() {
        let mut mem = memory_with_rom(8192);
        mem.write(0x0000, 0x11);
        mem.write(0x1FFF, 0x22);
        assert_eq!(mem.read(0x0000, false), 0x11);
        assert_eq!(mem.read(0x1FFF, false), 0x22);
        assert_eq!(mem.read(0x1FFF, true), 0xFF ^ 0xA5);
    }

    #[test]
    fn writes_under_rom_reach_ram() {
        let mut mem = memory_with_rom(8192);
        mem.write(0x0100, 0x77);
        assert_ne!(mem.read(0x0100, true), 0x77);
        assert_eq!(mem.peek_ram(0x0100), 0x77);
    }

    #[test]
    fn load_ram_wraps_at_top_of_memory() {
        let mut mem = memory_with_rom(4096);
        mem.load_ram(0xFFFF, &[0x01, 0x02]);
        assert_eq!(mem.peek_ram(0xFFFF), 0x01);
        assert_eq!(mem.peek_ram(0x0000), 0x02);
    }
}
