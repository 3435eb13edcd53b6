//! NABU bus: memory and I/O routing.
//!
//! Memory accesses go through the ROM overlay in [`NabuMemory`]. Port
//! accesses decode on the full 8-bit port number, except the floppy card
//! which answers the whole $C0-$CF block.
//!
//! The bus also owns the side effects that tie devices to the interrupt
//! arbiter: reading a device's data register acknowledges its request,
//! and the PSG's port A latch is the arbiter's mask.

use emu_core::Bus;
use log::{debug, warn};
use nabu_fdc::Fdc;

use crate::control::Control;
use crate::devices::{Modem, ParallelSink, SoundChip, VideoChip};
use crate::interrupt::{InterruptArbiter, Source};
use crate::keyboard::{KeyboardQueue, POWER_UP};
use crate::memory::NabuMemory;

/// Port numbers.
pub mod ports {
    pub const CONTROL: u8 = 0x00;
    pub const PSG_DATA: u8 = 0x40;
    pub const PSG_ADDRESS: u8 = 0x41;
    pub const HCCA: u8 = 0x80;
    pub const KEYBOARD_DATA: u8 = 0x90;
    pub const KEYBOARD_STATUS: u8 = 0x91;
    pub const VDP_DATA: u8 = 0xA0;
    pub const VDP_CONTROL: u8 = 0xA1;
    pub const PARALLEL: u8 = 0xB0;
    pub const FDC_BASE: u8 = 0xC0;
    pub const FDC_LAST: u8 = 0xCF;
}

/// PSG register wired to the interrupt mask (I/O port A, output).
pub const PSG_PORT_A: u8 = 14;
/// PSG register wired to the interrupt status mirror (I/O port B, input).
pub const PSG_PORT_B: u8 = 15;

/// Value returned by reads of unmapped ports.
pub const UNMAPPED: u8 = 0x00;

/// The NABU bus, implementing `emu_core::Bus`.
pub struct NabuBus {
    pub memory: NabuMemory,
    pub control: Control,
    /// Last byte written to the parallel port.
    pub parallel_data: u8,
    pub vdp: Box<dyn VideoChip>,
    pub psg: Box<dyn SoundChip>,
    pub keyboard: KeyboardQueue,
    pub fdc: Fdc,
    pub interrupts: InterruptArbiter,
    initial_control: Control,
    psg_address: u8,
    port_a: u8,
    modem: Option<Box<dyn Modem>>,
    parallel: Option<Box<dyn ParallelSink>>,
}

impl NabuBus {
    #[must_use]
    pub fn new(
        memory: NabuMemory,
        vdp: Box<dyn VideoChip>,
        psg: Box<dyn SoundChip>,
        initial_control: u8,
    ) -> Self {
        let initial_control = Control::from_bits_retain(initial_control);
        let mut keyboard = KeyboardQueue::new();
        keyboard.push(POWER_UP);
        Self {
            memory,
            control: initial_control,
            parallel_data: 0,
            vdp,
            psg,
            keyboard,
            fdc: Fdc::new(),
            interrupts: InterruptArbiter::new(),
            initial_control,
            psg_address: 0,
            port_a: 0,
            modem: None,
            parallel: None,
        }
    }

    /// Connect the HCCA transport. The transmitter starts out empty.
    pub fn attach_modem(&mut self, modem: Box<dyn Modem>) {
        self.modem = Some(modem);
        self.interrupts.raise(Source::Transmit);
    }

    pub fn detach_modem(&mut self) -> Option<Box<dyn Modem>> {
        self.interrupts.clear(Source::Transmit);
        self.interrupts.clear(Source::Receive);
        self.modem.take()
    }

    pub fn attach_parallel(&mut self, sink: Box<dyn ParallelSink>) {
        self.parallel = Some(sink);
    }

    pub fn detach_parallel(&mut self) -> Option<Box<dyn ParallelSink>> {
        self.parallel.take()
    }

    /// True when a modem is attached and has received data waiting.
    pub fn modem_has_data(&mut self) -> bool {
        self.modem.as_mut().is_some_and(|m| m.bytes_available())
    }

    /// Currently latched PSG register address.
    #[must_use]
    pub fn psg_address(&self) -> u8 {
        self.psg_address
    }

    /// Last value written to PSG port A.
    #[must_use]
    pub fn port_a(&self) -> u8 {
        self.port_a
    }

    /// Return the control register, PSG latches, interrupt lines and
    /// keyboard to their power-on state. RAM, disks and attached
    /// collaborators are left alone.
    pub fn reset(&mut self) {
        self.control = self.initial_control;
        self.psg_address = 0;
        self.port_a = 0;
        self.interrupts.set_mask(0);
        self.interrupts.clear_all();
        if self.modem.is_some() {
            self.interrupts.raise(Source::Transmit);
        }
        self.keyboard.clear();
        self.keyboard.push(POWER_UP);
    }

    // ---- Internal ----

    fn write_control(&mut self, value: u8) {
        let next = Control::from_bits_retain(value);
        if self.control.strobe_falls(next)
            && let Some(sink) = self.parallel.as_mut()
        {
            sink.emit(self.parallel_data);
        }
        self.control = next;
    }

    fn select_psg_register(&mut self, value: u8) {
        if value > PSG_PORT_B {
            warn!("PSG: register address ${value:02X} out of range, ignored");
            return;
        }
        self.psg_address = value;
        self.psg.select_register(value);
    }

    fn read_psg(&mut self) -> u8 {
        match self.psg_address {
            0..=13 => self.psg.read_data(),
            PSG_PORT_A => self.port_a,
            PSG_PORT_B => self.interrupts.port_b(),
            latch => unreachable!("PSG address latch holds ${latch:02X}"),
        }
    }

    fn write_psg(&mut self, value: u8) {
        match self.psg_address {
            0..=13 => self.psg.write_data(value),
            PSG_PORT_A => {
                self.port_a = value;
                self.interrupts.set_mask(value);
            }
            PSG_PORT_B => debug!("PSG: write ${value:02X} to input port B ignored"),
            latch => unreachable!("PSG address latch holds ${latch:02X}"),
        }
    }

    fn read_hcca(&mut self) -> u8 {
        self.interrupts.clear(Source::Receive);
        match self.modem.as_mut() {
            Some(modem) => modem.read_byte(),
            None => UNMAPPED,
        }
    }

    fn write_hcca(&mut self, value: u8) {
        match self.modem.as_mut() {
            Some(modem) => {
                modem.write_byte(value);
                self.interrupts.raise(Source::Transmit);
            }
            None => debug!("HCCA: write ${value:02X} with no modem attached"),
        }
    }

    fn read_keyboard(&mut self) -> u8 {
        self.interrupts.clear(Source::Keyboard);
        self.keyboard.pop().unwrap_or(UNMAPPED)
    }
}

impl Bus for NabuBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address, self.control.rom_enabled())
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match port {
            ports::PSG_DATA => self.read_psg(),
            ports::HCCA => self.read_hcca(),
            ports::KEYBOARD_DATA => self.read_keyboard(),
            ports::KEYBOARD_STATUS => {
                if self.keyboard.is_empty() {
                    0x00
                } else {
                    0xFF
                }
            }
            ports::VDP_DATA => self.vdp.read_data(),
            ports::VDP_CONTROL => {
                self.interrupts.clear(Source::Vblank);
                self.vdp.read_status()
            }
            ports::FDC_BASE..=ports::FDC_LAST => self.fdc.read(port),
            _ => {
                debug!("IN ${port:02X}: unmapped port");
                UNMAPPED
            }
        }
    }

    fn io_write(&mut self, port: u8, value: u8) {
        match port {
            ports::CONTROL => self.write_control(value),
            ports::PSG_DATA => self.write_psg(value),
            ports::PSG_ADDRESS => self.select_psg_register(value),
            ports::HCCA => self.write_hcca(value),
            ports::KEYBOARD_DATA | ports::KEYBOARD_STATUS => {}
            ports::VDP_DATA => self.vdp.write_data(value),
            ports::VDP_CONTROL => self.vdp.write_address(value),
            ports::PARALLEL => self.parallel_data = value,
            ports::FDC_BASE..=ports::FDC_LAST => self.fdc.write(port, value),
            _ => debug!("OUT ${port:02X},${value:02X}: unmapped port"),
        }
    }
}
