//! NABU PC floppy disk controller card.
//!
//! Standalone card emulation with no dependency on the machine crate.
//!
//! The card fronts a WD179x-style register file. Only the subset the NABU
//! firmware and CP/M BIOS drive is modelled, and transfers are exposed as
//! a byte stream through the data register rather than with real
//! rotational timing.
//!
//! # Register file (`port & $0F`)
//!
//! | Reg | Read               | Write          |
//! |-----|--------------------|----------------|
//! | $0  | status             | command        |
//! | $1  | track              | track          |
//! | $2  | sector             | sector         |
//! | $3  | data (streams)     | data           |
//! | $F  | card ID (`$10`)    | drive control  |
//!
//! # State machine
//!
//! Idle → (READ SECTOR / READ ADDRESS / READ TRACK) → StreamingRead →
//! (data register drained) → Idle. The data read that takes the final
//! buffered byte clears BUSY and DRQ in the same access.

pub mod commands;
pub mod disk;

use std::path::Path;

use bitflags::bitflags;
use log::{debug, info, warn};

pub use commands::Command;
pub use disk::{DiskError, DiskImage, DiskMedia, Geometry, SECTOR_SIZE, SECTORS_PER_TRACK};

use commands::{TRACK_PREAMBLE, address_block};

/// Value returned by the card-identification register.
pub const CARD_ID: u8 = 0x10;

/// Index pulse period in [`Fdc::tick`] calls.
///
/// The machine ticks the card once per scanline (15,720 Hz); a 300 RPM
/// spindle passes the index hole every 3,144 lines.
pub const INDEX_PERIOD: u32 = 3_144;

/// Number of drives the card addresses.
pub const DRIVES: usize = 2;

bitflags! {
    /// Status register bits. Bits 1 and 2 change meaning with the mode:
    /// DRQ/LOST DATA while streaming, INDEX/TRACK 0 while idle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const BUSY = 0x01;
        const DRQ = 0x02;
        const INDEX = 0x02;
        const TRACK0 = 0x04;
        const LOST_DATA = 0x04;
        const CRC_ERROR = 0x08;
        const SEEK_ERROR = 0x10;
        const NOT_READY = 0x80;
    }
}

bitflags! {
    /// Drive control byte written to register $F.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DriveControl: u8 {
        const SIDE = 0x01;
        const SELECT_0 = 0x02;
        const SELECT_1 = 0x04;
        const MOTOR = 0x08;
    }
}

/// Controller mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    /// Bytes are waiting in the buffer. `drive` is the drive the stream
    /// was started against, if the selection was valid.
    StreamingRead { drive: Option<usize> },
}

#[derive(Default)]
struct Drive {
    image: Option<DiskImage>,
    motor: bool,
}

/// The floppy controller card and its two drives.
pub struct Fdc {
    mode: Mode,
    status: Status,
    track: u8,
    sector: u8,
    data: u8,
    control: DriveControl,
    buffer: Box<[u8; SECTOR_SIZE]>,
    len: usize,
    cursor: usize,
    rotation: u32,
    drives: [Drive; DRIVES],
}

impl Fdc {
    /// Create a controller with empty drives and drive 0 selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            status: Status::empty(),
            track: 0,
            sector: 1,
            data: 0,
            control: DriveControl::SELECT_0,
            buffer: Box::new([0; SECTOR_SIZE]),
            len: 0,
            cursor: 0,
            rotation: 0,
            drives: [Drive::default(), Drive::default()],
        }
    }

    /// CPU read of register `reg` (only the low nibble is decoded).
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x0 => self.status().bits(),
            0x1 => self.track,
            0x2 => self.sector,
            0x3 => self.read_data(),
            0xF => CARD_ID,
            other => {
                debug!("FDC: IN: access to unknown register ${other:X}");
                0xFF
            }
        }
    }

    /// CPU write of register `reg` (only the low nibble is decoded).
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x0 => self.command(value),
            0x1 => self.track = value,
            0x2 => self.sector = value,
            0x3 => self.data = value,
            0xF => self.set_drive_control(value),
            other => {
                debug!("FDC: OUT: access to unknown register ${other:X} with data ${value:02X}");
            }
        }
    }

    /// Advance the spindle by one tick.
    pub fn tick(&mut self) {
        self.rotation = (self.rotation + 1) % INDEX_PERIOD;
    }

    /// Status register as the CPU would read it. Has no side effects.
    #[must_use]
    pub fn status(&self) -> Status {
        let mut status = self.status;
        if self.mode == Mode::Idle {
            if self.track == 0 {
                status |= Status::TRACK0;
            }
            if self.index_active() && self.selected_has_disk() {
                status |= Status::INDEX;
            }
        }
        status
    }

    /// Insert a disk image into `drive` (0 or 1).
    pub fn insert(&mut self, drive: usize, image: DiskImage) -> Result<(), DiskError> {
        self.check_empty(drive)?;
        info!("FDC: inserted {:?} disk in drive {}", image.geometry(), drive_name(drive));
        self.drives[drive].image = Some(image);
        Ok(())
    }

    /// Open a host image file read-write and insert it into `drive`.
    ///
    /// The drive is checked before the file is touched, and a file of the
    /// wrong size is closed again without changing any drive state.
    pub fn insert_file<P: AsRef<Path>>(&mut self, drive: usize, path: P) -> Result<(), DiskError> {
        self.check_empty(drive)?;
        let path = path.as_ref();
        let image = DiskImage::open(path).inspect_err(|e| {
            warn!("FDC: refusing '{}': {e}", path.display());
        })?;
        info!("FDC: inserted '{}' in drive {}", path.display(), drive_name(drive));
        self.drives[drive].image = Some(image);
        Ok(())
    }

    /// Remove the disk from `drive` and hand back its image. Dropping the
    /// returned image closes the backing file.
    ///
    /// A stream running against this drive is abandoned and the controller
    /// returns to idle.
    pub fn eject(&mut self, drive: usize) -> Result<DiskImage, DiskError> {
        let slot = self.drives.get_mut(drive).ok_or(DiskError::InvalidDrive(drive))?;
        let image = slot.image.take().ok_or(DiskError::DriveEmpty(drive))?;
        if self.mode == (Mode::StreamingRead { drive: Some(drive) }) {
            debug!("FDC: eject aborted transfer on drive {}", drive_name(drive));
            self.enter_idle();
        }
        info!("FDC: ejected disk in drive {}", drive_name(drive));
        Ok(image)
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn track(&self) -> u8 {
        self.track
    }

    #[must_use]
    pub fn sector(&self) -> u8 {
        self.sector
    }

    /// Last value latched in the data register.
    #[must_use]
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Bytes still waiting in the stream buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    /// Drive chosen by the drive control register, or `None` when the
    /// select bits do not name exactly one drive.
    #[must_use]
    pub fn selected_drive(&self) -> Option<usize> {
        let select = self.control & (DriveControl::SELECT_0 | DriveControl::SELECT_1);
        if select == DriveControl::SELECT_0 {
            Some(0)
        } else if select == DriveControl::SELECT_1 {
            Some(1)
        } else {
            None
        }
    }

    #[must_use]
    pub fn side(&self) -> u8 {
        u8::from(self.control.contains(DriveControl::SIDE))
    }

    #[must_use]
    pub fn has_disk(&self, drive: usize) -> bool {
        self.drives.get(drive).is_some_and(|d| d.image.is_some())
    }

    #[must_use]
    pub fn geometry(&self, drive: usize) -> Option<Geometry> {
        self.drives
            .get(drive)
            .and_then(|d| d.image.as_ref())
            .map(DiskImage::geometry)
    }

    #[must_use]
    pub fn motor_on(&self, drive: usize) -> bool {
        self.drives.get(drive).is_some_and(|d| d.motor)
    }

    /// True on the one tick per revolution the index hole passes.
    #[must_use]
    pub fn index_active(&self) -> bool {
        self.rotation == 0
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn command(&mut self, byte: u8) {
        debug!(
            "FDC: command ${byte:02X}, T=${:02X} S=${:02X} D=${:02X}",
            self.track, self.sector, self.data
        );
        match Command::decode(byte) {
            Some(Command::Restore) => {
                self.track = 0;
                self.status.remove(Status::NOT_READY);
                self.enter_idle();
            }
            Some(Command::ReadSector) => self.read_sector(),
            Some(Command::ReadAddress) => {
                let block = address_block(self.track, self.side(), self.sector);
                self.begin_stream(&block);
            }
            Some(Command::ForceInterrupt) => {
                self.status.remove(Status::BUSY | Status::NOT_READY);
            }
            Some(Command::ReadTrack) => self.begin_stream(&TRACK_PREAMBLE),
            None => debug!("FDC: unsupported command ${byte:02X} ignored"),
        }
    }

    fn read_sector(&mut self) {
        self.enter_idle();
        self.status
            .remove(Status::NOT_READY | Status::SEEK_ERROR | Status::CRC_ERROR);

        let Some(drive) = self.selected_drive() else {
            debug!("FDC: read sector with invalid drive select ${:02X}", self.control.bits());
            self.status.insert(Status::NOT_READY);
            return;
        };
        if !(1..=SECTORS_PER_TRACK).contains(&self.sector) {
            debug!("FDC: read sector ${:02X} out of range", self.sector);
            self.status.insert(Status::SEEK_ERROR);
            return;
        }
        let (track, sector) = (self.track, self.sector);
        let Some(image) = self.drives[drive].image.as_mut() else {
            debug!("FDC: read sector on empty drive {}", drive_name(drive));
            self.status.insert(Status::NOT_READY);
            return;
        };
        let Some(offset) = image.geometry().sector_offset(track, sector) else {
            debug!("FDC: T={track} S={sector} is off the end of the disk");
            self.status.insert(Status::SEEK_ERROR);
            return;
        };
        if let Err(e) = image.read_at(offset, &mut self.buffer) {
            warn!("FDC: sector read at offset {offset} failed: {e}");
            self.status.insert(Status::CRC_ERROR);
            return;
        }

        self.len = SECTOR_SIZE;
        self.cursor = 0;
        self.status.insert(Status::BUSY | Status::DRQ);
        self.mode = Mode::StreamingRead { drive: Some(drive) };
    }

    fn begin_stream(&mut self, bytes: &[u8]) {
        self.buffer[..bytes.len()].copy_from_slice(bytes);
        self.len = bytes.len();
        self.cursor = 0;
        self.status.insert(Status::BUSY | Status::DRQ);
        self.mode = Mode::StreamingRead {
            drive: self.selected_drive(),
        };
    }

    fn read_data(&mut self) -> u8 {
        if let Mode::StreamingRead { .. } = self.mode {
            if let Some(&byte) = self.buffer[..self.len].get(self.cursor) {
                self.data = byte;
                self.cursor += 1;
            }
            if self.cursor >= self.len {
                self.enter_idle();
            }
        }
        self.data
    }

    fn enter_idle(&mut self) {
        self.mode = Mode::Idle;
        self.status.remove(Status::BUSY | Status::DRQ);
        self.len = 0;
        self.cursor = 0;
    }

    fn set_drive_control(&mut self, value: u8) {
        self.control = DriveControl::from_bits_truncate(value);
        let motor = self.control.contains(DriveControl::MOTOR);
        let selected = self.selected_drive();
        for (n, drive) in self.drives.iter_mut().enumerate() {
            drive.motor = motor && selected == Some(n);
        }
    }

    fn selected_has_disk(&self) -> bool {
        self.selected_drive().is_some_and(|d| self.has_disk(d))
    }

    fn check_empty(&self, drive: usize) -> Result<(), DiskError> {
        match self.drives.get(drive) {
            None => Err(DiskError::InvalidDrive(drive)),
            Some(d) if d.image.is_some() => Err(DiskError::DriveOccupied(drive)),
            Some(_) => Ok(()),
        }
    }
}

impl Default for Fdc {
    fn default() -> Self {
        Self::new()
    }
}

fn drive_name(drive: usize) -> char {
    if drive == 0 { 'A' } else { 'B' }
}
