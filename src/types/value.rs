//! Typed field values.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use super::{AutoResetMaxDemand, CurrentDirection, OutputState, PulseInputState};

/// Power factor with its quadrant indicator.
///
/// The meter sends `C099` for a capacitive 0.99; the indicator is part of
/// the value and is kept alongside the number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerFactor {
    /// Leading indicator character as sent (`C`, `L` or space)
    pub indicator: char,
    /// Magnitude, 0.00 to 1.00
    pub value: f64,
}

impl PowerFactor {
    /// Create a new power factor.
    #[inline]
    pub const fn new(indicator: char, value: f64) -> Self {
        Self { indicator, value }
    }
}

impl fmt::Display for PowerFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.indicator, self.value)
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Counts, ratios, watts, codes
    Integer(i64),
    /// Scaled decimal (volts, amps, frequency, energy)
    Decimal(f64),
    /// Power factor with quadrant indicator
    PowerFactor(PowerFactor),
    /// Meter clock
    Timestamp(DateTime<FixedOffset>),
    /// Identity strings
    Text(String),
    /// Pulse input level
    PulseInput(PulseInputState),
    /// Direction of current on a line
    CurrentDirection(CurrentDirection),
    /// Relay output state
    Output(OutputState),
    /// Maximum demand auto reset schedule
    AutoReset(AutoResetMaxDemand),
}

impl Value {
    /// Convert to f64 if numeric.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Decimal(v) => Some(*v),
            Self::PowerFactor(pf) => Some(pf.value),
            _ => None,
        }
    }

    /// Get the value as i64 if it is an integer.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a string slice if it is text.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the timestamp if this is one.
    #[inline]
    pub fn as_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::PowerFactor(pf) => write!(f, "{}", pf),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Text(s) => f.write_str(s),
            Self::PulseInput(v) => write!(f, "{}", v),
            Self::CurrentDirection(v) => write!(f, "{}", v),
            Self::Output(v) => write!(f, "{}", v),
            Self::AutoReset(v) => write!(f, "{}", v),
        }
    }
}
