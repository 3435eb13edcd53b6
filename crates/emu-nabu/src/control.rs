//! Control register (port $00).

use bitflags::bitflags;

bitflags! {
    /// Write-only control latch. Bits 6 and 7 are not connected but are
    /// retained so the latch reads back what firmware wrote.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Control: u8 {
        /// Unmap the boot ROM; reads below its size then hit RAM.
        const ROM_DISABLE = 0x01;
        /// Route the VDP to the RF modulator. Clear = TV passthrough.
        const VIDEO_ENABLE = 0x02;
        /// Parallel port strobe. Data is latched out on the falling edge.
        const STROBE = 0x04;
        /// Green "check" LED.
        const LED_CHECK = 0x08;
        /// Red "alert" LED.
        const LED_ALERT = 0x10;
        /// Yellow "pause" LED.
        const LED_PAUSE = 0x20;
    }
}

impl Control {
    #[must_use]
    pub fn rom_enabled(self) -> bool {
        !self.contains(Self::ROM_DISABLE)
    }

    /// True when `next` drops the strobe line that `self` had raised.
    #[must_use]
    pub fn strobe_falls(self, next: Self) -> bool {
        self.contains(Self::STROBE) && !next.contains(Self::STROBE)
    }
}
