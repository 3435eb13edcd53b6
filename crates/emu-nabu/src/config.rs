//! Machine configuration.

use std::path::Path;
use std::time::Duration;

use log::info;

use crate::error::NabuError;
use crate::scheduler::{SLICE_INTERVAL, WATCHDOG_SLICES};

/// Control register value before firmware first writes it: all three LEDs
/// lit and video enabled, ROM mapped.
pub const POWER_ON_CONTROL: u8 = 0x3A;

/// A boot ROM image. Early units shipped a 4K 2732, later ones an 8K 2764.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    data: Box<[u8]>,
}

impl Rom {
    pub const SIZE_4K: usize = 4096;
    pub const SIZE_8K: usize = 8192;

    /// Accept an image of exactly 4096 or 8192 bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, NabuError> {
        match data.len() {
            Self::SIZE_4K | Self::SIZE_8K => Ok(Self {
                data: data.into_boxed_slice(),
            }),
            other => Err(NabuError::InvalidRomSize(other)),
        }
    }

    /// Read and validate a ROM file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NabuError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| NabuError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rom = Self::from_bytes(data)?;
        info!("ROM size: {} KB", rom.len() >> 10);
        Ok(rom)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Configuration for creating a [`crate::Nabu`].
#[derive(Debug, Clone)]
pub struct NabuConfig {
    pub rom: Rom,
    /// Consecutive empty-keyboard scanlines before the keyboard's
    /// keep-alive code is injected.
    pub watchdog_slices: u32,
    /// Wall-clock time per scanline. Firmware delay loops are calibrated
    /// against this rate, so anything other than the default (63,492 ns)
    /// breaks keyboard and HCCA timing. `Duration::ZERO` disables pacing
    /// and is only meant for headless test rigs.
    pub slice_interval: Duration,
    /// Control register value at power-on and after reset.
    pub initial_control: u8,
}

impl NabuConfig {
    /// Configuration with NTSC timing and the stock keyboard watchdog.
    #[must_use]
    pub fn new(rom: Rom) -> Self {
        Self {
            rom,
            watchdog_slices: WATCHDOG_SLICES,
            slice_interval: SLICE_INTERVAL,
            initial_control: POWER_ON_CONTROL,
        }
    }
}
