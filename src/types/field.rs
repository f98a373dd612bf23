//! Field names and casting rules.
//!
//! Every value the meter reports, resolves or derives has a variant here.
//! Lookups by name go through [`Field::from_str`], so an unknown name is an
//! error rather than an empty slot in a property bag.

use std::fmt;
use std::str::FromStr;

use crate::error::MeterError;

/// How a raw field is converted into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRule {
    /// Base-10 integer.
    Integer,
    /// Integer divided by `10^precision`.
    Fixed(u32),
    /// Integer divided by `10^kwh_data_decimal_places` of the same cycle.
    Energy,
    /// Quadrant indicator followed by a three digit value in hundredths.
    PowerFactor,
    /// Packed `YYMMDDWWHHMMSS` meter clock.
    Timestamp,
    /// Raw bytes rendered as lowercase hex.
    Hex,
    /// Raw ASCII.
    Text,
}

macro_rules! fields {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)+) => {
        /// Closed set of snapshot field names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Field {
            $($(#[$doc])* $variant,)+
        }

        impl Field {
            /// Every field, in declaration order.
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];

            /// Canonical snake_case name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)+
                }
            }
        }

        impl FromStr for Field {
            type Err = MeterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Field::$variant),)+
                    _ => Err(MeterError::UnknownField(s.to_string())),
                }
            }
        }
    };
}

fields! {
    // Identity block, shared by both variants
    /// Meter type code, hex encoded (e.g. `1024`)
    MeterType => "meter_type",
    /// Firmware code, hex encoded
    MeterFirmware => "meter_firmware",
    /// 12 digit meter address
    MeterAddress => "meter_address",

    // Variant A energy registers
    TotalKwh => "total_kwh",
    ReactiveKwhKvarh => "reactive_kwh_kvarh",
    TotalReverseKwh => "total_reverse_kwh",
    TotalKwhL1 => "total_kwh_l1",
    TotalKwhL2 => "total_kwh_l2",
    TotalKwhL3 => "total_kwh_l3",
    ReverseKwhL1 => "reverse_kwh_l1",
    ReverseKwhL2 => "reverse_kwh_l2",
    ReverseKwhL3 => "reverse_kwh_l3",
    ResettableTotalKwh => "resettable_total_kwh",
    ResettableReverseKwh => "resettable_reverse_kwh",

    // Per-line instantaneous values, shared by both variants
    VoltsL1 => "volts_l1",
    VoltsL2 => "volts_l2",
    VoltsL3 => "volts_l3",
    AmpsL1 => "amps_l1",
    AmpsL2 => "amps_l2",
    AmpsL3 => "amps_l3",
    WattsL1 => "watts_l1",
    WattsL2 => "watts_l2",
    WattsL3 => "watts_l3",
    WattsTotal => "watts_total",
    PowerFactor1 => "power_factor_1",
    PowerFactor2 => "power_factor_2",
    PowerFactor3 => "power_factor_3",

    // Variant A instantaneous and pulse values
    ReactivePower1 => "reactive_power_1",
    ReactivePower2 => "reactive_power_2",
    ReactivePower3 => "reactive_power_3",
    TotalReactivePower => "total_reactive_power",
    Frequency => "frequency",
    Pulse1Count => "pulse_1_count",
    Pulse2Count => "pulse_2_count",
    Pulse3Count => "pulse_3_count",
    /// Pulse input hi/lo code (0-7)
    PulseInputHilo => "pulse_input_hilo",
    /// Current direction code (1-8)
    DirectionOfCurrent => "direction_of_current",
    /// Output on/off code (1-4)
    OutputsOnoff => "outputs_onoff",
    /// Scale applied to every energy register
    KwhDataDecimalPlaces => "kwh_data_decimal_places",

    /// Meter clock at capture time
    MeterTimestamp => "meter_timestamp",

    // Variant B tariff registers
    TotalKwhT1 => "total_kwh_t1",
    TotalKwhT2 => "total_kwh_t2",
    TotalKwhT3 => "total_kwh_t3",
    TotalKwhT4 => "total_kwh_t4",
    ReverseKwhT1 => "reverse_kwh_t1",
    ReverseKwhT2 => "reverse_kwh_t2",
    ReverseKwhT3 => "reverse_kwh_t3",
    ReverseKwhT4 => "reverse_kwh_t4",

    // Variant B demand and configuration
    MaximumDemand => "maximum_demand",
    /// Demand period in minutes
    MaximumDemandPeriod => "maximum_demand_period",
    Pulse1Ratio => "pulse_1_ratio",
    Pulse2Ratio => "pulse_2_ratio",
    Pulse3Ratio => "pulse_3_ratio",
    CtRatio => "ct_ratio",
    AutoResetMaxDemand => "auto_reset_max_demand",
    SettablePulsePerKwhRatio => "settable_pulse_per_kwh_ratio",

    // Resolved from code bytes
    Pulse1Input => "pulse_1_input",
    Pulse2Input => "pulse_2_input",
    Pulse3Input => "pulse_3_input",
    CurrentDirectionL1 => "current_direction_l1",
    CurrentDirectionL2 => "current_direction_l2",
    CurrentDirectionL3 => "current_direction_l3",
    Output1 => "output_1",
    Output2 => "output_2",
    /// Model name for known meter type codes
    MeterModel => "meter_model",

    // Derived from the power configuration
    Volts => "volts",
    Amps => "amps",
    Watts => "watts",
    TotalForwardKwh => "total_forward_kwh",
    NetKwh => "net_kwh",
}

impl Field {
    /// Casting rule for fields read straight off the wire.
    ///
    /// Resolved and derived fields return `None`.
    pub const fn cast_rule(self) -> Option<CastRule> {
        use Field::*;

        match self {
            MeterType | MeterFirmware => Some(CastRule::Hex),
            MeterAddress => Some(CastRule::Text),
            MeterTimestamp => Some(CastRule::Timestamp),

            TotalKwh | ReactiveKwhKvarh | TotalReverseKwh | TotalKwhL1 | TotalKwhL2
            | TotalKwhL3 | ReverseKwhL1 | ReverseKwhL2 | ReverseKwhL3 | ResettableTotalKwh
            | ResettableReverseKwh | TotalKwhT1 | TotalKwhT2 | TotalKwhT3 | TotalKwhT4
            | ReverseKwhT1 | ReverseKwhT2 | ReverseKwhT3 | ReverseKwhT4 => Some(CastRule::Energy),

            VoltsL1 | VoltsL2 | VoltsL3 | AmpsL1 | AmpsL2 | AmpsL3 | MaximumDemand => {
                Some(CastRule::Fixed(1))
            }
            Frequency => Some(CastRule::Fixed(2)),

            PowerFactor1 | PowerFactor2 | PowerFactor3 => Some(CastRule::PowerFactor),

            WattsL1 | WattsL2 | WattsL3 | WattsTotal | ReactivePower1 | ReactivePower2
            | ReactivePower3 | TotalReactivePower | Pulse1Count | Pulse2Count | Pulse3Count
            | PulseInputHilo | DirectionOfCurrent | OutputsOnoff | KwhDataDecimalPlaces
            | MaximumDemandPeriod | Pulse1Ratio | Pulse2Ratio | Pulse3Ratio | CtRatio
            | AutoResetMaxDemand | SettablePulsePerKwhRatio => Some(CastRule::Integer),

            Pulse1Input | Pulse2Input | Pulse3Input | CurrentDirectionL1 | CurrentDirectionL2
            | CurrentDirectionL3 | Output1 | Output2 | MeterModel | Volts | Amps | Watts
            | TotalForwardKwh | NetKwh => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), *field);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = "volts_l4".parse::<Field>().unwrap_err();
        assert!(matches!(err, MeterError::UnknownField(ref name) if name == "volts_l4"));
    }

    #[test]
    fn test_cast_rules() {
        assert_eq!(Field::VoltsL1.cast_rule(), Some(CastRule::Fixed(1)));
        assert_eq!(Field::Frequency.cast_rule(), Some(CastRule::Fixed(2)));
        assert_eq!(Field::TotalKwhT3.cast_rule(), Some(CastRule::Energy));
        assert_eq!(Field::MeterType.cast_rule(), Some(CastRule::Hex));
        assert_eq!(Field::PowerFactor2.cast_rule(), Some(CastRule::PowerFactor));
        assert_eq!(Field::Volts.cast_rule(), None);
        assert_eq!(Field::Output1.cast_rule(), None);
    }
}
