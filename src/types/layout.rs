//! Response variants and their fixed byte layouts.
//!
//! Both responses are exactly [`RESPONSE_LENGTH`] bytes:
//!
//! ```text
//! +-----+------------+-----------------------+----------+-------------------+-------+
//! | STX | identity   | variant payload       | clock    | 30 30 21 0D 0A 03 | CRC16 |
//! | 1   | 2 + 1 + 12 | 217 (incl. reserved)  | 14       | 6                 | 2     |
//! +-----+------------+-----------------------+----------+-------------------+-------+
//! ```

use std::fmt;

use super::Field;

/// Total length of every response frame.
pub const RESPONSE_LENGTH: usize = 255;

/// Width of the CRC trailer.
pub const CHECKSUM_LENGTH: usize = 2;

/// One positional span of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Bytes mapped to a named field.
    Field(Field, usize),
    /// STX, reserved or marker bytes; consumed and discarded.
    Skip(usize),
    /// The CRC16 trailer.
    Checksum,
}

impl Segment {
    /// Number of bytes this segment consumes.
    #[inline]
    pub const fn width(&self) -> usize {
        match self {
            Self::Field(_, width) | Self::Skip(width) => *width,
            Self::Checksum => CHECKSUM_LENGTH,
        }
    }
}

/// Request/response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseVariant {
    /// Cumulative energy totals, pulse counters, status codes.
    A,
    /// Tariff energy totals, maximum demand, ratios.
    B,
}

impl ResponseVariant {
    /// Both variants in read-cycle order.
    pub const ALL: [ResponseVariant; 2] = [ResponseVariant::A, ResponseVariant::B];

    /// Two-character selector appended to the meter number in a request.
    #[inline]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::A => "00",
            Self::B => "01",
        }
    }

    /// Ordered segment table for this variant.
    #[inline]
    pub const fn layout(self) -> &'static [Segment] {
        match self {
            Self::A => LAYOUT_A,
            Self::B => LAYOUT_B,
        }
    }

    /// Width of a field in this variant's layout.
    pub fn width_of(self, field: Field) -> Option<usize> {
        self.layout().iter().find_map(|segment| match segment {
            Segment::Field(f, width) if *f == field => Some(*width),
            _ => None,
        })
    }
}

impl fmt::Display for ResponseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Sum of segment widths, usable in const context.
pub const fn layout_len(layout: &[Segment]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < layout.len() {
        total += layout[i].width();
        i += 1;
    }
    total
}

use Segment::{Checksum, Field as F, Skip};

/// Variant A: `/?<id>00!`.
pub const LAYOUT_A: &[Segment] = &[
    Skip(1), // STX
    F(Field::MeterType, 2),
    F(Field::MeterFirmware, 1),
    F(Field::MeterAddress, 12),
    F(Field::TotalKwh, 8),
    F(Field::ReactiveKwhKvarh, 8),
    F(Field::TotalReverseKwh, 8),
    F(Field::TotalKwhL1, 8),
    F(Field::TotalKwhL2, 8),
    F(Field::TotalKwhL3, 8),
    F(Field::ReverseKwhL1, 8),
    F(Field::ReverseKwhL2, 8),
    F(Field::ReverseKwhL3, 8),
    F(Field::ResettableTotalKwh, 8),
    F(Field::ResettableReverseKwh, 8),
    F(Field::VoltsL1, 4),
    F(Field::VoltsL2, 4),
    F(Field::VoltsL3, 4),
    F(Field::AmpsL1, 5),
    F(Field::AmpsL2, 5),
    F(Field::AmpsL3, 5),
    F(Field::WattsL1, 7),
    F(Field::WattsL2, 7),
    F(Field::WattsL3, 7),
    F(Field::WattsTotal, 7),
    F(Field::PowerFactor1, 4),
    F(Field::PowerFactor2, 4),
    F(Field::PowerFactor3, 4),
    F(Field::ReactivePower1, 7),
    F(Field::ReactivePower2, 7),
    F(Field::ReactivePower3, 7),
    F(Field::TotalReactivePower, 7),
    F(Field::Frequency, 4),
    F(Field::Pulse1Count, 8),
    F(Field::Pulse2Count, 8),
    F(Field::Pulse3Count, 8),
    F(Field::PulseInputHilo, 1),
    F(Field::DirectionOfCurrent, 1),
    F(Field::OutputsOnoff, 1),
    F(Field::KwhDataDecimalPlaces, 1),
    Skip(2), // reserved
    F(Field::MeterTimestamp, 14),
    Skip(6), // 30 30 21 0D 0A 03
    Checksum,
];

/// Variant B: `/?<id>01!`.
pub const LAYOUT_B: &[Segment] = &[
    Skip(1), // STX
    F(Field::MeterType, 2),
    F(Field::MeterFirmware, 1),
    F(Field::MeterAddress, 12),
    F(Field::TotalKwhT1, 8),
    F(Field::TotalKwhT2, 8),
    F(Field::TotalKwhT3, 8),
    F(Field::TotalKwhT4, 8),
    F(Field::ReverseKwhT1, 8),
    F(Field::ReverseKwhT2, 8),
    F(Field::ReverseKwhT3, 8),
    F(Field::ReverseKwhT4, 8),
    F(Field::VoltsL1, 4),
    F(Field::VoltsL2, 4),
    F(Field::VoltsL3, 4),
    F(Field::AmpsL1, 5),
    F(Field::AmpsL2, 5),
    F(Field::AmpsL3, 5),
    F(Field::WattsL1, 7),
    F(Field::WattsL2, 7),
    F(Field::WattsL3, 7),
    F(Field::WattsTotal, 7),
    F(Field::PowerFactor1, 4),
    F(Field::PowerFactor2, 4),
    F(Field::PowerFactor3, 4),
    F(Field::MaximumDemand, 8),
    F(Field::MaximumDemandPeriod, 1),
    F(Field::Pulse1Ratio, 4),
    F(Field::Pulse2Ratio, 4),
    F(Field::Pulse3Ratio, 4),
    F(Field::CtRatio, 4),
    F(Field::AutoResetMaxDemand, 1),
    F(Field::SettablePulsePerKwhRatio, 4),
    Skip(56), // reserved
    F(Field::MeterTimestamp, 14),
    Skip(6), // 30 30 21 0D 0A 03
    Checksum,
];

const _: () = assert!(layout_len(LAYOUT_A) == RESPONSE_LENGTH);
const _: () = assert!(layout_len(LAYOUT_B) == RESPONSE_LENGTH);
