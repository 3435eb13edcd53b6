//! Raw sector disk images.
//!
//! A NABU disk image is a flat dump of 1024-byte sectors, five per track,
//! with no header. The geometry is implied by the file size:
//!
//! | Size    | Geometry                      |
//! |---------|-------------------------------|
//! | 204,800 | 5.25" single-sided, 40 tracks |
//! | 409,600 | 5.25" double-sided, 40 tracks |
//! | 819,200 | 3.5" double-sided, 80 tracks  |
//!
//! Sectors are numbered from 1 and laid out linearly by track number
//! alone: `offset = (track * 5 + sector - 1) * 1024`. The side select does
//! not take part, so larger images are simply addressed with higher track
//! numbers.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

pub const SECTOR_SIZE: usize = 1024;
pub const SECTORS_PER_TRACK: u8 = 5;

/// Errors raised while inserting or ejecting media.
///
/// None of these leave a drive half-loaded: the operation that fails is
/// refused as a whole.
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("disk image I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a disk image: {0} bytes (expected 204800, 409600 or 819200)")]
    InvalidSize(u64),
    #[error("no such drive: {0}")]
    InvalidDrive(usize),
    #[error("drive {} already holds a disk", drive_letter(.0))]
    DriveOccupied(usize),
    #[error("drive {} is already empty", drive_letter(.0))]
    DriveEmpty(usize),
}

fn drive_letter(drive: &usize) -> char {
    match *drive {
        0 => 'A',
        1 => 'B',
        _ => '?',
    }
}

/// Physical format, selected by image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// 5.25" single-sided, 200K.
    SingleSided200K,
    /// 5.25" double-sided, 400K.
    DoubleSided400K,
    /// 3.5" double-sided, 800K.
    DoubleSided800K,
}

impl Geometry {
    /// Classify an image by its length in bytes.
    pub fn from_size(size: u64) -> Result<Self, DiskError> {
        match size {
            204_800 => Ok(Self::SingleSided200K),
            409_600 => Ok(Self::DoubleSided400K),
            819_200 => Ok(Self::DoubleSided800K),
            other => Err(DiskError::InvalidSize(other)),
        }
    }

    #[must_use]
    pub const fn heads(self) -> u8 {
        match self {
            Self::SingleSided200K => 1,
            Self::DoubleSided400K | Self::DoubleSided800K => 2,
        }
    }

    #[must_use]
    pub const fn tracks(self) -> u8 {
        match self {
            Self::SingleSided200K | Self::DoubleSided400K => 40,
            Self::DoubleSided800K => 80,
        }
    }

    /// Image size in bytes.
    #[must_use]
    pub const fn size(self) -> u64 {
        self.tracks() as u64
            * self.heads() as u64
            * SECTORS_PER_TRACK as u64
            * SECTOR_SIZE as u64
    }

    /// Byte offset of a sector, or `None` if it does not lie wholly inside
    /// the image. `sector` is 1-based.
    #[must_use]
    pub fn sector_offset(self, track: u8, sector: u8) -> Option<u64> {
        if sector == 0 || sector > SECTORS_PER_TRACK {
            return None;
        }
        let index = u64::from(track) * u64::from(SECTORS_PER_TRACK) + u64::from(sector - 1);
        let offset = index * SECTOR_SIZE as u64;
        (offset + SECTOR_SIZE as u64 <= self.size()).then_some(offset)
    }
}

/// Backing storage for an inserted image: a file on the host, or any
/// seekable in-memory buffer.
pub trait DiskMedia: Read + Write + Seek {}

impl<T: Read + Write + Seek> DiskMedia for T {}

/// An inserted disk: backing storage plus its geometry.
pub struct DiskImage {
    media: Box<dyn DiskMedia>,
    geometry: Geometry,
}

impl DiskImage {
    /// Open a host file read-write and classify it by size.
    ///
    /// The file stays open until the image is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DiskError> {
        let file: File = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_media(file)
    }

    /// Wrap arbitrary media, measuring its size by seeking to the end.
    pub fn from_media<M: DiskMedia + 'static>(mut media: M) -> Result<Self, DiskError> {
        let size = media.seek(SeekFrom::End(0))?;
        let geometry = Geometry::from_size(size)?;
        media.seek(SeekFrom::Start(0))?;
        Ok(Self {
            media: Box::new(media),
            geometry,
        })
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Read the sector at `offset` into `buf`.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8; SECTOR_SIZE]) -> io::Result<()> {
        self.media.seek(SeekFrom::Start(offset))?;
        self.media.read_exact(buf)
    }
}

impl std::fmt::Debug for DiskImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImage")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}
