//! Coded status bytes and their lookup tables.
//!
//! Each table is total over the code range the meter documents. Anything
//! outside that range fails with [`MeterError::UnknownCode`] instead of
//! falling back to a default.

use std::fmt;

use crate::error::{MeterError, Result};

/// Lookup table identifier, carried in [`MeterError::UnknownCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeTable {
    /// Pulse input hi/lo (0-7)
    PulseInput,
    /// Direction of current (1-8)
    CurrentDirection,
    /// Output indicator (1-4)
    OutputIndicator,
    /// Maximum demand period (1-3)
    DemandPeriod,
    /// Auto reset of maximum demand (0-4)
    AutoResetMaxDemand,
}

impl fmt::Display for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PulseInput => "pulse input",
            Self::CurrentDirection => "current direction",
            Self::OutputIndicator => "output indicator",
            Self::DemandPeriod => "demand period",
            Self::AutoResetMaxDemand => "auto reset max demand",
        };
        f.write_str(name)
    }
}

/// Level of a pulse input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PulseInputState {
    High,
    Low,
}

/// Direction of current on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentDirection {
    Forward,
    Reverse,
}

/// State of a relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputState {
    On,
    Off,
}

/// Automatic maximum demand reset schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoResetMaxDemand {
    Off,
    Monthly,
    Weekly,
    Daily,
    Hourly,
}

impl fmt::Display for PulseInputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Low => "low",
        })
    }
}

impl fmt::Display for CurrentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        })
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
        })
    }
}

impl fmt::Display for AutoResetMaxDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        })
    }
}

/// Resolve the pulse input code into the levels of inputs 1, 2 and 3.
///
/// Bit 2 is input 1, bit 0 is input 3; a set bit means low.
pub fn pulse_inputs(code: i64) -> Result<[PulseInputState; 3]> {
    use PulseInputState::{High as H, Low as L};

    match code {
        0 => Ok([H, H, H]),
        1 => Ok([H, H, L]),
        2 => Ok([H, L, H]),
        3 => Ok([H, L, L]),
        4 => Ok([L, H, H]),
        5 => Ok([L, H, L]),
        6 => Ok([L, L, H]),
        7 => Ok([L, L, L]),
        _ => Err(MeterError::unknown_code(CodeTable::PulseInput, code)),
    }
}

/// Resolve the direction code into the direction on lines 1, 2 and 3.
pub fn current_directions(code: i64) -> Result<[CurrentDirection; 3]> {
    use CurrentDirection::{Forward as F, Reverse as R};

    match code {
        1 => Ok([F, F, F]),
        2 => Ok([F, F, R]),
        3 => Ok([F, R, F]),
        4 => Ok([R, F, F]),
        5 => Ok([F, R, R]),
        6 => Ok([R, F, R]),
        7 => Ok([R, R, F]),
        8 => Ok([R, R, R]),
        _ => Err(MeterError::unknown_code(CodeTable::CurrentDirection, code)),
    }
}

/// Resolve the output indicator code into the state of outputs 1 and 2.
pub fn outputs(code: i64) -> Result<[OutputState; 2]> {
    use OutputState::{Off, On};

    match code {
        1 => Ok([Off, Off]),
        2 => Ok([Off, On]),
        3 => Ok([On, Off]),
        4 => Ok([On, On]),
        _ => Err(MeterError::unknown_code(CodeTable::OutputIndicator, code)),
    }
}

/// Resolve the demand period code into minutes.
pub fn demand_period_minutes(code: i64) -> Result<i64> {
    match code {
        1 => Ok(15),
        2 => Ok(30),
        3 => Ok(60),
        _ => Err(MeterError::unknown_code(CodeTable::DemandPeriod, code)),
    }
}

/// Resolve the auto reset code.
pub fn auto_reset_max_demand(code: i64) -> Result<AutoResetMaxDemand> {
    match code {
        0 => Ok(AutoResetMaxDemand::Off),
        1 => Ok(AutoResetMaxDemand::Monthly),
        2 => Ok(AutoResetMaxDemand::Weekly),
        3 => Ok(AutoResetMaxDemand::Daily),
        4 => Ok(AutoResetMaxDemand::Hourly),
        _ => Err(MeterError::unknown_code(CodeTable::AutoResetMaxDemand, code)),
    }
}

/// Model name for a hex encoded meter type, if known.
pub fn meter_model(meter_type: &str) -> Option<&'static str> {
    match meter_type {
        "1017" => Some("OmniMeter I v.3"),
        "1022" => Some("OmniMeter II UL v.3"),
        "1024" => Some("OmniMeter Pulse v.4"),
        _ => None,
    }
}
