//! Read request construction.
//!
//! ```text
//! 2F 3F | 12 byte meter number | 30 30 or 30 31 | 21 0D 0A
//!  / ?  | 000300001234         |  0 0  or  0 1  |  ! CR LF
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{MeterError, Result};
use crate::types::ResponseVariant;

/// Number of digits in a meter number on the wire.
pub const METER_NUMBER_DIGITS: usize = 12;

/// Zero-padded 12 digit meter serial number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeterNumber(String);

impl MeterNumber {
    /// Validate and left-pad a meter number.
    ///
    /// Accepts 1 to 12 ASCII digits. Anything else, surrounding whitespace
    /// included, is rejected.
    pub fn new(number: &str) -> Result<Self> {
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MeterError::InvalidMeterNumber(format!(
                "{:?} is not numeric",
                number
            )));
        }
        if number.len() > METER_NUMBER_DIGITS {
            return Err(MeterError::InvalidMeterNumber(format!(
                "{} has more than {} digits",
                number, METER_NUMBER_DIGITS
            )));
        }
        Ok(Self(format!("{:0>width$}", number, width = METER_NUMBER_DIGITS)))
    }

    /// The padded 12 digit form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MeterNumber {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<u64> for MeterNumber {
    type Error = MeterError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(&value.to_string())
    }
}

impl fmt::Display for MeterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A read request for one response variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Target meter
    pub meter: MeterNumber,
    /// Requested response shape
    pub variant: ResponseVariant,
}

impl Request {
    /// Create a new request.
    #[inline]
    pub fn new(meter: MeterNumber, variant: ResponseVariant) -> Self {
        Self { meter, variant }
    }

    /// Encode the ASCII command, `/?<meter><selector>!\r\n`.
    pub fn encode(&self) -> String {
        format!("/?{}{}!\r\n", self.meter, self.variant.selector())
    }

    /// Encoded length in bytes.
    #[inline]
    pub const fn encoded_len(&self) -> usize {
        2 + METER_NUMBER_DIGITS + 2 + 3
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/?{}{}!", self.meter, self.variant.selector())
    }
}
