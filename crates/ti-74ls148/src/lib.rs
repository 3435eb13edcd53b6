//! Texas Instruments 74LS148 8-line to 3-line priority encoder.
//!
//! Pure combinational logic: no clock, no state. Every output is a
//! function of the current inputs, so callers re-evaluate [`encode`]
//! whenever any input changes instead of patching outputs incrementally.
//!
//! # Pins (all active-low on the real part)
//!
//! | Pin    | Dir | Meaning                                   |
//! |--------|-----|-------------------------------------------|
//! | 0–7    | in  | request lines, 7 has the highest priority |
//! | EI     | in  | enable input (cascade from a higher chip) |
//! | A2–A0  | out | index of the highest active request       |
//! | GS     | out | group signal: some request is active      |
//! | EO     | out | enable output: enabled, nothing requested |
//!
//! [`encode`] works in positive logic (bit set = line asserted). Use
//! [`encode_pins`] when wiring to a bus that carries the raw levels.

/// Encoder outputs in positive logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoded {
    /// Index (0–7) of the highest-numbered asserted input; 0 when none.
    pub vector: u8,
    /// Group signal: at least one input asserted while enabled.
    pub group: bool,
    /// Enable output: enabled and no input asserted. Feeds the EI of the
    /// next lower-priority encoder in a cascade.
    pub enable_out: bool,
}

/// Evaluate the encoder.
///
/// `inputs` has one bit per request line (bit 7 = input 7). With `enable`
/// low the chip is disabled and all outputs are inactive regardless of the
/// inputs.
#[must_use]
pub const fn encode(inputs: u8, enable: bool) -> Encoded {
    if !enable {
        return Encoded {
            vector: 0,
            group: false,
            enable_out: false,
        };
    }
    if inputs == 0 {
        return Encoded {
            vector: 0,
            group: false,
            enable_out: true,
        };
    }
    Encoded {
        vector: 7 - inputs.leading_zeros() as u8,
        group: true,
        enable_out: false,
    }
}

/// Raw active-low pin levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    /// A2–A0 in bits 2–0 (inverted vector).
    pub a: u8,
    pub gs: bool,
    pub eo: bool,
}

/// Evaluate the encoder on active-low pin levels, exactly as the datasheet
/// function table is written.
#[must_use]
pub const fn encode_pins(inputs_n: u8, ei_n: bool) -> Pins {
    let out = encode(!inputs_n, !ei_n);
    let a = if out.group { !out.vector & 0x07 } else { 0x07 };
    Pins {
        a,
        gs: !out.group,
        eo: !out.enable_out,
    }
}
