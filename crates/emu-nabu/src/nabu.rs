//! Top-level NABU system.
//!
//! Owns the CPU and the bus, and runs the scanline loop that sequences
//! CPU execution against per-slice housekeeping and video timing.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use emu_core::{Cpu, Observable, Value};
use log::{info, trace};
use nabu_fdc::{DiskImage, Mode};

use crate::bus::NabuBus;
use crate::config::NabuConfig;
use crate::devices::{
    Frontend, Modem, ParallelSink, SCANLINE_WIDTH, Scanline, SoundChip, VDP_BACKDROP_REGISTER,
    VDP_REG1_IE, VideoChip,
};
use crate::error::NabuError;
use crate::interrupt::Source;
use crate::keyboard::KEEP_ALIVE;
use crate::memory::NabuMemory;
use crate::scheduler::{Pacer, SliceEvent, SliceTimer, Watchdog, active_row};

/// NABU Personal Computer.
pub struct Nabu<C: Cpu> {
    cpu: C,
    bus: NabuBus,
    timer: SliceTimer,
    pacer: Pacer,
    watchdog: Watchdog,
    frame_count: u64,
    scanline: [u8; SCANLINE_WIDTH],
    stop: Arc<AtomicBool>,
}

impl<C: Cpu> Nabu<C> {
    /// Build a powered-on machine around the given CPU, VDP and PSG.
    pub fn new(
        config: NabuConfig,
        cpu: C,
        vdp: Box<dyn VideoChip>,
        psg: Box<dyn SoundChip>,
    ) -> Self {
        let memory = NabuMemory::new(config.rom);
        let mut nabu = Self {
            cpu,
            bus: NabuBus::new(memory, vdp, psg, config.initial_control),
            timer: SliceTimer::new(),
            pacer: Pacer::new(config.slice_interval),
            watchdog: Watchdog::new(config.watchdog_slices),
            frame_count: 0,
            scanline: [0; SCANLINE_WIDTH],
            stop: Arc::new(AtomicBool::new(false)),
        };
        nabu.sync_irq();
        nabu
    }

    /// Run one slice: CPU up to the boundary, pacing, housekeeping, then
    /// the video event for the new slice index.
    pub fn run_slice<F: Frontend + ?Sized>(&mut self, frontend: &mut F) -> SliceEvent {
        while !self.timer.due(self.cpu.cycles()) {
            self.cpu.step(&mut self.bus);
            self.sync_irq();
        }

        self.pacer.wait();
        frontend.poll_input(&mut self.bus.keyboard);
        self.housekeeping();

        let event = self.timer.advance();
        match event {
            SliceEvent::Visible(line) => self.render(line, frontend),
            SliceEvent::Blanking => {}
            SliceEvent::FrameComplete => self.complete_frame(frontend),
        }
        self.sync_irq();
        event
    }

    /// Run slices until the frame wraps. Returns T-states executed.
    pub fn run_frame<F: Frontend + ?Sized>(&mut self, frontend: &mut F) -> u64 {
        let start = self.cpu.cycles();
        while self.run_slice(frontend) != SliceEvent::FrameComplete {}
        self.cpu.cycles() - start
    }

    /// Run until the stop handle is set. The flag is checked once per
    /// slice and cleared on return.
    pub fn run<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        while !self.stop.load(Ordering::Relaxed) {
            self.run_slice(frontend);
        }
        self.stop.store(false, Ordering::Relaxed);
        info!("NABU: stopped at frame {}", self.frame_count);
    }

    /// Shared flag that makes [`Nabu::run`] return at the next slice.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Reset button. RAM, disks and collaborators survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.timer = SliceTimer::new();
        self.bus.reset();
        self.watchdog.reset();
        self.pacer.rearm();
        self.sync_irq();
        info!("NABU: reset");
    }

    /// Open a disk image file and insert it into `drive`.
    pub fn insert_disk<P: AsRef<Path>>(&mut self, drive: usize, path: P) -> Result<(), NabuError> {
        self.bus.fdc.insert_file(drive, path)?;
        Ok(())
    }

    /// Insert an already-opened image into `drive`.
    pub fn insert_image(&mut self, drive: usize, image: DiskImage) -> Result<(), NabuError> {
        self.bus.fdc.insert(drive, image)?;
        Ok(())
    }

    /// Eject `drive`, closing its backing file.
    pub fn eject_disk(&mut self, drive: usize) -> Result<(), NabuError> {
        drop(self.bus.fdc.eject(drive)?);
        Ok(())
    }

    /// Queue a key code as if the keyboard had sent it.
    pub fn push_key(&mut self, code: u8) -> bool {
        self.bus.keyboard.push(code)
    }

    pub fn attach_modem(&mut self, modem: Box<dyn Modem>) {
        self.bus.attach_modem(modem);
        self.sync_irq();
    }

    pub fn attach_parallel(&mut self, sink: Box<dyn ParallelSink>) {
        self.bus.attach_parallel(sink);
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NabuBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NabuBus {
        &mut self.bus
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn slice(&self) -> u16 {
        self.timer.line()
    }

    #[must_use]
    pub fn timer(&self) -> &SliceTimer {
        &self.timer
    }

    #[must_use]
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    // ---- Internal ----

    /// Push the arbiter's current output onto the CPU's /INT line.
    fn sync_irq(&mut self) {
        let (active, vector) = self.bus.interrupts.line();
        self.cpu.set_irq(active, vector);
    }

    fn housekeeping(&mut self) {
        self.bus.fdc.tick();

        if self.bus.modem_has_data() {
            self.bus.interrupts.raise(Source::Receive);
        }

        if !self.bus.keyboard.is_empty() && !self.bus.interrupts.is_pending(Source::Keyboard) {
            self.bus.interrupts.raise(Source::Keyboard);
        }

        if self.watchdog.observe(self.bus.keyboard.is_empty()) {
            self.bus.keyboard.push(KEEP_ALIVE);
            info!("Keyboard: watchdog keep-alive");
        }
    }

    fn render<F: Frontend + ?Sized>(&mut self, line: u16, frontend: &mut F) {
        let border = self.bus.vdp.register(VDP_BACKDROP_REGISTER) & 0x0F;
        let pixels = match active_row(line) {
            Some(row) => {
                self.bus.vdp.scanline(row, &mut self.scanline);
                Some(&self.scanline)
            }
            None => None,
        };
        frontend.render_scanline(&Scanline {
            line,
            border,
            pixels,
            control: self.bus.control,
        });
    }

    fn complete_frame<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        self.frame_count += 1;
        trace!("NABU: frame {} complete", self.frame_count);
        frontend.frame_complete(self.bus.control);
        if self.bus.vdp.register(1) & VDP_REG1_IE != 0 {
            self.bus.interrupts.raise(Source::Vblank);
        }
    }
}

impl<C: Cpu> Observable for Nabu<C> {
    fn query(&self, path: &str) -> Option<Value> {
        if path.starts_with("irq.") {
            return self.bus.interrupts.query(path);
        }
        let fdc = &self.bus.fdc;
        match path {
            "cpu.cycles" => Some(self.cpu.cycles().into()),
            "cpu.pc" => Some(Value::U64(u64::from(self.cpu.pc()))),
            "slice" => Some(self.timer.line().into()),
            "frame" => Some(self.frame_count.into()),
            "control" => Some(self.bus.control.bits().into()),
            "rom.enabled" => Some(self.bus.control.rom_enabled().into()),
            "keyboard.len" => Some(Value::U64(self.bus.keyboard.len() as u64)),
            "psg.address" => Some(self.bus.psg_address().into()),
            "fdc.status" => Some(fdc.status().bits().into()),
            "fdc.track" => Some(fdc.track().into()),
            "fdc.sector" => Some(fdc.sector().into()),
            "fdc.mode" => Some(match fdc.mode() {
                Mode::Idle => "idle".into(),
                Mode::StreamingRead { .. } => "streaming".into(),
            }),
            "fdc.drive" => Some(match fdc.selected_drive() {
                Some(drive) => Value::U8(drive as u8),
                None => "none".into(),
            }),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.cycles",
            "cpu.pc",
            "slice",
            "frame",
            "control",
            "rom.enabled",
            "keyboard.len",
            "psg.address",
            "irq.flags",
            "irq.mask",
            "irq.vector",
            "irq.active",
            "irq.port_b",
            "fdc.status",
            "fdc.track",
            "fdc.sector",
            "fdc.mode",
            "fdc.drive",
        ]
    }
}
