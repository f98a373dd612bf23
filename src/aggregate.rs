//! Per-line aggregation and derived energy totals.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::MeterError;

/// Wiring of the metered service.
///
/// Fixed for the lifetime of a session; decides which lines contribute to
/// the aggregate volts, amps and watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerConfiguration {
    /// L1 only
    SinglePhase2Wire,
    /// L1 + L2
    #[default]
    SinglePhase3Wire,
    /// L1 + L3
    ThreePhase3Wire,
    /// L1 + L2 + L3
    ThreePhase4Wire,
}

impl PowerConfiguration {
    /// All configurations.
    pub const ALL: [PowerConfiguration; 4] = [
        Self::SinglePhase2Wire,
        Self::SinglePhase3Wire,
        Self::ThreePhase3Wire,
        Self::ThreePhase4Wire,
    ];

    /// Canonical snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SinglePhase2Wire => "single_phase_2wire",
            Self::SinglePhase3Wire => "single_phase_3wire",
            Self::ThreePhase3Wire => "three_phase_3wire",
            Self::ThreePhase4Wire => "three_phase_4wire",
        }
    }

    /// Combine per-line values according to the wiring.
    #[inline]
    pub fn aggregate<T>(self, l1: T, l2: T, l3: T) -> T
    where
        T: Add<Output = T> + Copy,
    {
        match self {
            Self::SinglePhase2Wire => l1,
            Self::SinglePhase3Wire => l1 + l2,
            Self::ThreePhase3Wire => l1 + l3,
            Self::ThreePhase4Wire => l1 + l2 + l3,
        }
    }
}

impl FromStr for PowerConfiguration {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|config| config.as_str() == s)
            .ok_or_else(|| {
                MeterError::configuration(format!(
                    "invalid power configuration {:?}, expected one of {}",
                    s,
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }
}

impl fmt::Display for PowerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forward and net energy derived from the whole-meter totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetEnergy<T> {
    /// `total_kwh - total_reverse_kwh`
    pub total_forward_kwh: T,
    /// `total_forward_kwh - total_reverse_kwh`
    pub net_kwh: T,
}

impl<T> NetEnergy<T>
where
    T: Sub<Output = T> + Copy,
{
    /// Derive from `total_kwh` and `total_reverse_kwh`.
    pub fn from_totals(total_kwh: T, total_reverse_kwh: T) -> Self {
        let total_forward_kwh = total_kwh - total_reverse_kwh;
        Self {
            total_forward_kwh,
            net_kwh: total_forward_kwh - total_reverse_kwh,
        }
    }
}
