//! Scripted collaborators for machine-level tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use emu_core::{Bus, Cpu};
use emu_nabu::devices::SCANLINE_WIDTH;
use emu_nabu::{
    Control, Frontend, KeyboardQueue, Modem, Nabu, NabuConfig, Rom, Scanline, SoundChip, VideoChip,
};

/// One bus operation performed by a scripted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u16),
    Write(u16, u8),
    In(u8),
    Out(u8, u8),
}

/// A CPU that replays queued bus operations, one per step, and otherwise
/// idles like a stream of NOPs.
pub struct ScriptCpu {
    pub script: VecDeque<Op>,
    /// Values returned by `Read` and `In` ops, in order.
    pub results: Vec<u8>,
    pub cycles: u64,
    pub step_cycles: u32,
    pub irq: (bool, u8),
    /// Every distinct line change pushed by the machine.
    pub irq_history: Vec<(bool, u8)>,
    pub resets: u32,
}

impl ScriptCpu {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            results: Vec::new(),
            cycles: 0,
            step_cycles: 4,
            irq: (false, 0),
            irq_history: Vec::new(),
            resets: 0,
        }
    }
}

impl Default for ScriptCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for ScriptCpu {
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        match self.script.pop_front() {
            Some(Op::Read(addr)) => self.results.push(bus.read(addr)),
            Some(Op::Write(addr, value)) => bus.write(addr, value),
            Some(Op::In(port)) => self.results.push(bus.io_read(port)),
            Some(Op::Out(port, value)) => bus.io_write(port, value),
            None => {}
        }
        self.cycles += u64::from(self.step_cycles);
        self.step_cycles
    }

    fn cycles(&self) -> u64 {
        self.cycles
    }

    fn set_irq(&mut self, active: bool, vector: u8) {
        if self.irq != (active, vector) {
            self.irq_history.push((active, vector));
        }
        self.irq = (active, vector);
    }

    fn pc(&self) -> u32 {
        0
    }

    fn reset(&mut self) {
        self.cycles = 0;
        self.script.clear();
        self.resets += 1;
    }
}

#[derive(Default)]
pub struct VdpState {
    pub registers: [u8; 8],
    pub rows: Vec<u8>,
    pub status_reads: u32,
}

pub struct MockVdp(pub Rc<RefCell<VdpState>>);

impl VideoChip for MockVdp {
    fn read_data(&mut self) -> u8 {
        0
    }

    fn read_status(&mut self) -> u8 {
        self.0.borrow_mut().status_reads += 1;
        0x80
    }

    fn write_data(&mut self, _value: u8) {}

    fn write_address(&mut self, _value: u8) {}

    fn register(&self, index: u8) -> u8 {
        self.0.borrow().registers[usize::from(index & 7)]
    }

    fn scanline(&mut self, row: u8, pixels: &mut [u8; SCANLINE_WIDTH]) {
        self.0.borrow_mut().rows.push(row);
        pixels.fill(row);
    }
}

pub struct NullPsg;

impl SoundChip for NullPsg {
    fn select_register(&mut self, _register: u8) {}
    fn write_data(&mut self, _value: u8) {}
    fn read_data(&mut self) -> u8 {
        0
    }
}

#[derive(Default)]
pub struct ModemState {
    pub incoming: VecDeque<u8>,
    pub outgoing: Vec<u8>,
}

pub struct MockModem(pub Rc<RefCell<ModemState>>);

impl Modem for MockModem {
    fn bytes_available(&mut self) -> bool {
        !self.0.borrow().incoming.is_empty()
    }

    fn read_byte(&mut self) -> u8 {
        self.0.borrow_mut().incoming.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, value: u8) {
        self.0.borrow_mut().outgoing.push(value);
    }
}

/// Summary of one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub line: u16,
    pub border: u8,
    pub first_pixel: Option<u8>,
    pub control: Control,
}

#[derive(Default)]
pub struct RecordingFrontend {
    pub lines: Vec<Line>,
    pub frames: Vec<Control>,
    pub pending_keys: Vec<u8>,
    pub polls: u32,
}

impl Frontend for RecordingFrontend {
    fn poll_input(&mut self, keyboard: &mut KeyboardQueue) {
        self.polls += 1;
        for code in self.pending_keys.drain(..) {
            keyboard.push(code);
        }
    }

    fn render_scanline(&mut self, line: &Scanline<'_>) {
        self.lines.push(Line {
            line: line.line,
            border: line.border,
            first_pixel: line.pixels.map(|p| p[0]),
            control: line.control,
        });
    }

    fn frame_complete(&mut self, control: Control) {
        self.frames.push(control);
    }
}

/// 4K ROM filled with `0xC3` and an unpaced, stock-watchdog config.
pub fn test_config() -> NabuConfig {
    let rom = Rom::from_bytes(vec![0xC3; Rom::SIZE_4K]).expect("rom");
    let mut config = NabuConfig::new(rom);
    config.slice_interval = Duration::ZERO;
    config
}

pub struct Rig {
    pub nabu: Nabu<ScriptCpu>,
    pub vdp: Rc<RefCell<VdpState>>,
}

pub fn make_rig(config: NabuConfig) -> Rig {
    let vdp = Rc::new(RefCell::new(VdpState::default()));
    let nabu = Nabu::new(
        config,
        ScriptCpu::new(),
        Box::new(MockVdp(vdp.clone())),
        Box::new(NullPsg),
    );
    Rig { nabu, vdp }
}

/// A scratch file path unique to this test process.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("emu-nabu-{}-{name}", std::process::id()))
}
