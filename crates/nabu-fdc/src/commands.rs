//! Command byte decoding and the fixed byte blocks some commands stream.
//!
//! The card decodes commands on the high nibble of the byte written to the
//! command register; the low nibble carries step-rate and verify flags the
//! emulation does not need.

/// A decoded controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `$0x`: head to track 0.
    Restore,
    /// `$8x`/`$9x`: read one sector into the stream buffer.
    ReadSector,
    /// `$Cx`: stream the 6-byte ID block of the current position.
    ReadAddress,
    /// `$Dx`: acknowledge / abort, clears BUSY and NOT-READY.
    ForceInterrupt,
    /// `$Ex`: stream a fixed gap/sync pattern for presence checks.
    ReadTrack,
}

impl Command {
    /// Decode a command byte. Unsupported commands (seek, step, writes)
    /// decode to `None`.
    #[must_use]
    pub const fn decode(byte: u8) -> Option<Self> {
        match byte >> 4 {
            0x0 => Some(Self::Restore),
            0x8 | 0x9 => Some(Self::ReadSector),
            0xC => Some(Self::ReadAddress),
            0xD => Some(Self::ForceInterrupt),
            0xE => Some(Self::ReadTrack),
            _ => None,
        }
    }
}

/// Size code for 1024-byte sectors in an ID field.
pub const SIZE_CODE_1K: u8 = 0x03;

/// Placeholder written where the controller would emit a CRC pair.
pub const CRC_PLACEHOLDER: u8 = 0xF7;

/// ID block streamed by [`Command::ReadAddress`].
#[must_use]
pub const fn address_block(track: u8, side: u8, sector: u8) -> [u8; 6] {
    [
        track,
        side,
        sector,
        SIZE_CODE_1K,
        CRC_PLACEHOLDER,
        CRC_PLACEHOLDER,
    ]
}

/// Gap, sync, address mark and ID field streamed by [`Command::ReadTrack`].
///
/// Firmware only times this stream to decide whether a disk is spinning;
/// it never decodes it.
pub const TRACK_PREAMBLE: [u8; 38] = [
    // gap
    0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E,
    0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E,
    // sync
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // address mark
    0xF5, 0xF5, 0xF5, 0xFE,
    // track, side, sector, size
    0x00, 0x00, 0x01, SIZE_CODE_1K,
    CRC_PLACEHOLDER, CRC_PLACEHOLDER,
];
