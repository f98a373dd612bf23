//! Field casting.
//!
//! This module turns a parsed [`Frame`] into typed, scaled values.
//!
//! Decoding runs in two phases. Phase 1 casts every field whose scale is
//! fixed, including `kwh_data_decimal_places`. Phase 2 scales the energy
//! registers with that value; variant B does not carry it, so its caller
//! passes the value decoded from variant A earlier in the same cycle.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::checksum::ChecksumFields;
use crate::error::{MeterError, Result};
use crate::frame::{Frame, RawField};
use crate::types::{
    auto_reset_max_demand, current_directions, demand_period_minutes, meter_model, outputs,
    pulse_inputs, CastRule, Field, PowerFactor, ResponseVariant, Value,
};

/// Powers of ten for the precisions a single digit can express.
const POW10: [f64; 10] = [1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9];

/// Clock and offset used while casting one response.
#[derive(Debug, Clone, Copy)]
pub struct CastContext {
    /// Offset the meter clock is interpreted in
    pub offset: FixedOffset,
    /// Substituted for an unreadable meter clock
    pub now: DateTime<FixedOffset>,
}

impl CastContext {
    /// Context at the current wall-clock time.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            now: Utc::now().with_timezone(&offset),
        }
    }

    /// Context at a fixed time.
    pub fn at(offset: FixedOffset, now: DateTime<FixedOffset>) -> Self {
        Self { offset, now }
    }
}

/// Typed values decoded from one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Response variant
    pub variant: ResponseVariant,
    /// Decoded values, including resolved code fields
    pub values: BTreeMap<Field, Value>,
    /// Raw meter clock that could not be read, if the fallback was used
    pub timestamp_fallback: Option<String>,
    /// Trailer check, when verification ran
    pub checksum: Option<ChecksumFields>,
}

impl Reading {
    /// Look up a decoded value.
    #[inline]
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Energy precision carried by this reading (variant A only).
    pub fn decimal_places(&self) -> Option<u32> {
        match self.values.get(&Field::KwhDataDecimalPlaces) {
            Some(Value::Integer(places)) => u32::try_from(*places).ok(),
            _ => None,
        }
    }
}

/// Decode a frame into typed values.
///
/// `decimal_places` is used when the frame itself does not carry
/// `kwh_data_decimal_places`. Fails on the first field that does not cast.
pub fn decode(frame: &Frame, decimal_places: Option<u32>, ctx: &CastContext) -> Result<Reading> {
    let mut values = BTreeMap::new();
    let mut energy: Vec<&RawField> = Vec::new();
    let mut timestamp_fallback = None;

    // Phase 1: fixed-scale fields
    for raw in frame.fields() {
        let Some(rule) = raw.field.cast_rule() else {
            continue;
        };

        let value = match rule {
            CastRule::Energy => {
                energy.push(raw);
                continue;
            }
            CastRule::Integer => Value::Integer(cast_integer(raw.field, raw.as_str()?)?),
            CastRule::Fixed(precision) => {
                Value::Decimal(cast_fixed(raw.field, raw.as_str()?, precision)?)
            }
            CastRule::PowerFactor => {
                Value::PowerFactor(cast_power_factor(raw.field, raw.as_str()?)?)
            }
            CastRule::Timestamp => {
                let text = String::from_utf8_lossy(&raw.bytes);
                match cast_timestamp(&text, ctx.offset) {
                    Some(ts) => Value::Timestamp(ts),
                    None => {
                        timestamp_fallback = Some(text.into_owned());
                        Value::Timestamp(ctx.now)
                    }
                }
            }
            CastRule::Hex => Value::Text(hex::encode(&raw.bytes)),
            CastRule::Text => Value::Text(raw.as_str()?.to_string()),
        };
        values.insert(raw.field, value);
    }

    // Phase 2: energy registers
    if !energy.is_empty() {
        let places = match values.get(&Field::KwhDataDecimalPlaces) {
            Some(Value::Integer(places)) => u32::try_from(*places).ok(),
            _ => decimal_places,
        }
        .ok_or_else(|| {
            MeterError::field_cast(
                Field::KwhDataDecimalPlaces,
                format!("not decoded before energy fields of response {}", frame.variant()),
            )
        })?;

        for raw in energy {
            let value = cast_fixed(raw.field, raw.as_str()?, places)?;
            values.insert(raw.field, Value::Decimal(value));
        }
    }

    resolve_codes(&mut values)?;

    Ok(Reading {
        variant: frame.variant(),
        values,
        timestamp_fallback,
        checksum: None,
    })
}

/// Replace or expand coded status bytes with their semantic values.
fn resolve_codes(values: &mut BTreeMap<Field, Value>) -> Result<()> {
    if let Some(code) = integer(values, Field::PulseInputHilo) {
        let [p1, p2, p3] = pulse_inputs(code)?;
        values.insert(Field::Pulse1Input, Value::PulseInput(p1));
        values.insert(Field::Pulse2Input, Value::PulseInput(p2));
        values.insert(Field::Pulse3Input, Value::PulseInput(p3));
    }

    if let Some(code) = integer(values, Field::DirectionOfCurrent) {
        let [l1, l2, l3] = current_directions(code)?;
        values.insert(Field::CurrentDirectionL1, Value::CurrentDirection(l1));
        values.insert(Field::CurrentDirectionL2, Value::CurrentDirection(l2));
        values.insert(Field::CurrentDirectionL3, Value::CurrentDirection(l3));
    }

    if let Some(code) = integer(values, Field::OutputsOnoff) {
        let [o1, o2] = outputs(code)?;
        values.insert(Field::Output1, Value::Output(o1));
        values.insert(Field::Output2, Value::Output(o2));
    }

    if let Some(code) = integer(values, Field::MaximumDemandPeriod) {
        let minutes = demand_period_minutes(code)?;
        values.insert(Field::MaximumDemandPeriod, Value::Integer(minutes));
    }

    if let Some(code) = integer(values, Field::AutoResetMaxDemand) {
        let schedule = auto_reset_max_demand(code)?;
        values.insert(Field::AutoResetMaxDemand, Value::AutoReset(schedule));
    }

    let model = match values.get(&Field::MeterType) {
        Some(Value::Text(meter_type)) => meter_model(meter_type),
        _ => None,
    };
    if let Some(model) = model {
        values.insert(Field::MeterModel, Value::Text(model.to_string()));
    }

    Ok(())
}

fn integer(values: &BTreeMap<Field, Value>, field: Field) -> Option<i64> {
    values.get(&field).and_then(Value::as_i64)
}

/// Parse a base-10 integer field.
pub fn cast_integer(field: Field, text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| MeterError::field_cast(field, format!("{:?}: {}", text, e)))
}

/// Parse an integer field and divide it by `10^precision`.
pub fn cast_fixed(field: Field, text: &str, precision: u32) -> Result<f64> {
    let divisor = POW10.get(precision as usize).ok_or_else(|| {
        MeterError::field_cast(field, format!("unsupported precision {}", precision))
    })?;
    Ok(cast_integer(field, text)? as f64 / divisor)
}

/// Parse a power factor such as `C099`.
pub fn cast_power_factor(field: Field, text: &str) -> Result<PowerFactor> {
    let mut chars = text.chars();
    let indicator = chars
        .next()
        .ok_or_else(|| MeterError::field_cast(field, "empty power factor"))?;
    let hundredths = cast_integer(field, chars.as_str())?;
    Ok(PowerFactor::new(indicator, hundredths as f64 / 100.0))
}

/// Parse the packed `YYMMDDWWHHMMSS` meter clock.
///
/// Returns `None` for non-numeric or out-of-range components; the weekday
/// pair is ignored.
pub fn cast_timestamp(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    if text.len() != 14 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pair = |at: usize| text[at..at + 2].parse::<u32>().ok();

    let year = 2000 + pair(0)? as i32;
    offset
        .with_ymd_and_hms(year, pair(2)?, pair(4)?, pair(8)?, pair(10)?, pair(12)?)
        .single()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frame::tests::build_frame;
    use crate::types::{
        AutoResetMaxDemand, CurrentDirection, OutputState, PulseInputState,
    };
    use bytes::Bytes;

    pub(crate) fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    pub(crate) fn fixed_now() -> DateTime<FixedOffset> {
        utc().with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    /// Known field content for a variant A response.
    pub(crate) fn variant_a_field(field: Field) -> String {
        let text = match field {
            Field::MeterType => "\u{10}\u{24}",
            Field::MeterFirmware => "\u{15}",
            Field::MeterAddress => "000300001234",
            Field::TotalKwh => "00050000",
            Field::ReactiveKwhKvarh => "00000250",
            Field::TotalReverseKwh => "00002000",
            Field::TotalKwhL1 => "00012345",
            Field::VoltsL1 => "1203",
            Field::VoltsL2 => "1198",
            Field::VoltsL3 => "0000",
            Field::AmpsL1 => "00125",
            Field::AmpsL2 => "00080",
            Field::AmpsL3 => "00000",
            Field::WattsL1 => "0001500",
            Field::WattsL2 => "0000950",
            Field::WattsL3 => "0000000",
            Field::WattsTotal => "0002450",
            Field::PowerFactor1 => "C099",
            Field::PowerFactor2 => "L085",
            Field::PowerFactor3 => " 100",
            Field::ReactivePower1 => "0000120",
            Field::TotalReactivePower => "0000120",
            Field::Frequency => "6001",
            Field::Pulse1Count => "00000042",
            Field::PulseInputHilo => "5",
            Field::DirectionOfCurrent => "4",
            Field::OutputsOnoff => "3",
            Field::KwhDataDecimalPlaces => "2",
            Field::MeterTimestamp => "24061506123045",
            _ => "",
        };
        if text.is_empty() {
            "0".repeat(ResponseVariant::A.width_of(field).unwrap())
        } else {
            text.to_string()
        }
    }

    /// Known field content for a variant B response.
    pub(crate) fn variant_b_field(field: Field) -> String {
        let text = match field {
            Field::MeterType => "\u{10}\u{24}",
            Field::MeterFirmware => "\u{15}",
            Field::MeterAddress => "000300001234",
            Field::TotalKwhT1 => "00030000",
            Field::TotalKwhT2 => "00020000",
            Field::ReverseKwhT1 => "00001500",
            Field::VoltsL1 => "1210",
            Field::VoltsL2 => "1205",
            Field::VoltsL3 => "0000",
            Field::AmpsL1 => "00130",
            Field::AmpsL2 => "00070",
            Field::AmpsL3 => "00000",
            Field::WattsL1 => "0001600",
            Field::WattsL2 => "0000800",
            Field::WattsL3 => "0000000",
            Field::WattsTotal => "0002400",
            Field::PowerFactor1 => "C098",
            Field::PowerFactor2 => "L090",
            Field::PowerFactor3 => " 100",
            Field::MaximumDemand => "00004250",
            Field::MaximumDemandPeriod => "2",
            Field::Pulse1Ratio => "0001",
            Field::Pulse2Ratio => "0001",
            Field::Pulse3Ratio => "0001",
            Field::CtRatio => "0200",
            Field::AutoResetMaxDemand => "1",
            Field::SettablePulsePerKwhRatio => "0800",
            Field::MeterTimestamp => "24061506123050",
            _ => "",
        };
        if text.is_empty() {
            "0".repeat(ResponseVariant::B.width_of(field).unwrap())
        } else {
            text.to_string()
        }
    }

    fn frame(variant: ResponseVariant, fill: impl Fn(Field) -> String) -> Frame {
        Frame::parse(variant, Bytes::from(build_frame(variant, fill))).unwrap()
    }

    fn ctx() -> CastContext {
        CastContext::at(utc(), fixed_now())
    }

    #[test]
    fn test_cast_fixed_dynamic_precision() {
        assert_eq!(cast_fixed(Field::TotalKwh, "00012345", 2).unwrap(), 123.45);
        assert_eq!(cast_fixed(Field::TotalKwh, "00012345", 0).unwrap(), 12345.0);
        assert!(cast_fixed(Field::TotalKwh, "00012345", 10).is_err());
    }

    #[test]
    fn test_cast_fixed_precision() {
        assert_eq!(cast_fixed(Field::VoltsL1, "1203", 1).unwrap(), 120.3);
        assert_eq!(cast_fixed(Field::Frequency, "6001", 2).unwrap(), 60.01);
    }

    #[test]
    fn test_cast_integer_malformed() {
        let err = cast_integer(Field::WattsL1, "00a1500").unwrap_err();
        assert!(matches!(err, MeterError::FieldCast { field: Field::WattsL1, .. }));
        assert!(cast_integer(Field::WattsL1, "       ").is_err());
        assert_eq!(cast_integer(Field::WattsL1, "-000150").unwrap(), -150);
    }

    #[test]
    fn test_cast_power_factor() {
        let pf = cast_power_factor(Field::PowerFactor1, "C099").unwrap();
        assert_eq!(pf.indicator, 'C');
        assert_eq!(pf.value, 0.99);
        assert_eq!(pf.to_string(), "C0.99");

        assert!(cast_power_factor(Field::PowerFactor1, "").is_err());
        assert!(cast_power_factor(Field::PowerFactor1, "CXYZ").is_err());
    }

    #[test]
    fn test_cast_timestamp() {
        let ts = cast_timestamp("24061506123045", utc()).unwrap();
        assert_eq!(ts, utc().with_ymd_and_hms(2024, 6, 15, 12, 30, 45).unwrap());

        let minus_four = FixedOffset::west_opt(4 * 3600).unwrap();
        let ts = cast_timestamp("24061506123045", minus_four).unwrap();
        assert_eq!(ts.offset(), &minus_four);

        assert!(cast_timestamp("24001506123045", utc()).is_none());
        assert!(cast_timestamp("24063206123045", utc()).is_none());
        assert!(cast_timestamp("2406150612304", utc()).is_none());
        assert!(cast_timestamp("24O61506123045", utc()).is_none());
    }

    #[test]
    fn test_decode_variant_a() {
        let reading = decode(&frame(ResponseVariant::A, variant_a_field), None, &ctx()).unwrap();
        let get = |field| reading.get(field).cloned().unwrap();

        assert_eq!(reading.variant, ResponseVariant::A);
        assert_eq!(reading.timestamp_fallback, None);
        assert_eq!(reading.decimal_places(), Some(2));

        // Identity
        assert_eq!(get(Field::MeterType), Value::Text("1024".into()));
        assert_eq!(get(Field::MeterFirmware), Value::Text("15".into()));
        assert_eq!(get(Field::MeterAddress), Value::Text("000300001234".into()));
        assert_eq!(get(Field::MeterModel), Value::Text("OmniMeter Pulse v.4".into()));

        // Energy, scaled by kwh_data_decimal_places
        assert_eq!(get(Field::TotalKwh), Value::Decimal(500.0));
        assert_eq!(get(Field::ReactiveKwhKvarh), Value::Decimal(2.5));
        assert_eq!(get(Field::TotalReverseKwh), Value::Decimal(20.0));
        assert_eq!(get(Field::TotalKwhL1), Value::Decimal(123.45));
        assert_eq!(get(Field::ResettableTotalKwh), Value::Decimal(0.0));

        // Fixed precision
        assert_eq!(get(Field::VoltsL1), Value::Decimal(120.3));
        assert_eq!(get(Field::VoltsL2), Value::Decimal(119.8));
        assert_eq!(get(Field::AmpsL1), Value::Decimal(12.5));
        assert_eq!(get(Field::Frequency), Value::Decimal(60.01));

        // Integers
        assert_eq!(get(Field::WattsL1), Value::Integer(1500));
        assert_eq!(get(Field::WattsTotal), Value::Integer(2450));
        assert_eq!(get(Field::ReactivePower1), Value::Integer(120));
        assert_eq!(get(Field::Pulse1Count), Value::Integer(42));
        assert_eq!(get(Field::KwhDataDecimalPlaces), Value::Integer(2));

        // Power factor
        assert_eq!(get(Field::PowerFactor1).to_string(), "C0.99");
        assert_eq!(get(Field::PowerFactor2).to_string(), "L0.85");
        assert_eq!(get(Field::PowerFactor3).to_string(), " 1.00");

        // Timestamp
        assert_eq!(
            get(Field::MeterTimestamp),
            Value::Timestamp(utc().with_ymd_and_hms(2024, 6, 15, 12, 30, 45).unwrap())
        );

        // Resolved codes
        assert_eq!(get(Field::PulseInputHilo), Value::Integer(5));
        assert_eq!(get(Field::Pulse1Input), Value::PulseInput(PulseInputState::Low));
        assert_eq!(get(Field::Pulse2Input), Value::PulseInput(PulseInputState::High));
        assert_eq!(get(Field::Pulse3Input), Value::PulseInput(PulseInputState::Low));
        assert_eq!(
            get(Field::CurrentDirectionL1),
            Value::CurrentDirection(CurrentDirection::Reverse)
        );
        assert_eq!(
            get(Field::CurrentDirectionL3),
            Value::CurrentDirection(CurrentDirection::Forward)
        );
        assert_eq!(get(Field::Output1), Value::Output(OutputState::On));
        assert_eq!(get(Field::Output2), Value::Output(OutputState::Off));

        // Variant B only
        assert!(reading.get(Field::MaximumDemand).is_none());
    }

    #[test]
    fn test_decode_variant_b() {
        let reading =
            decode(&frame(ResponseVariant::B, variant_b_field), Some(2), &ctx()).unwrap();
        let get = |field| reading.get(field).cloned().unwrap();

        assert_eq!(reading.decimal_places(), None);
        assert_eq!(get(Field::TotalKwhT1), Value::Decimal(300.0));
        assert_eq!(get(Field::ReverseKwhT1), Value::Decimal(15.0));
        assert_eq!(get(Field::MaximumDemand), Value::Decimal(425.0));
        assert_eq!(get(Field::MaximumDemandPeriod), Value::Integer(30));
        assert_eq!(get(Field::CtRatio), Value::Integer(200));
        assert_eq!(
            get(Field::AutoResetMaxDemand),
            Value::AutoReset(AutoResetMaxDemand::Monthly)
        );
        assert_eq!(get(Field::SettablePulsePerKwhRatio), Value::Integer(800));
        assert!(reading.get(Field::TotalKwh).is_none());
        assert!(reading.get(Field::Pulse1Input).is_none());
    }

    #[test]
    fn test_decode_variant_b_requires_precision() {
        let err = decode(&frame(ResponseVariant::B, variant_b_field), None, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            MeterError::FieldCast {
                field: Field::KwhDataDecimalPlaces,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_timestamp_fallback() {
        let reading = decode(
            &frame(ResponseVariant::A, |field| match field {
                Field::MeterTimestamp => "24001506123045".to_string(),
                other => variant_a_field(other),
            }),
            None,
            &ctx(),
        )
        .unwrap();

        assert_eq!(reading.timestamp_fallback.as_deref(), Some("24001506123045"));
        assert_eq!(
            reading.get(Field::MeterTimestamp),
            Some(&Value::Timestamp(fixed_now()))
        );
    }

    #[test]
    fn test_decode_malformed_field() {
        let err = decode(
            &frame(ResponseVariant::A, |field| match field {
                Field::AmpsL2 => "0x080".to_string(),
                other => variant_a_field(other),
            }),
            None,
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, MeterError::FieldCast { field: Field::AmpsL2, .. }));
    }

    #[test]
    fn test_decode_unknown_code() {
        let err = decode(
            &frame(ResponseVariant::A, |field| match field {
                Field::OutputsOnoff => "7".to_string(),
                other => variant_a_field(other),
            }),
            None,
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, MeterError::UnknownCode { code: 7, .. }));
    }

    #[test]
    fn test_decode_unknown_meter_type() {
        let reading = decode(
            &frame(ResponseVariant::A, |field| match field {
                Field::MeterType => "\u{10}\u{11}".to_string(),
                other => variant_a_field(other),
            }),
            None,
            &ctx(),
        )
        .unwrap();
        assert_eq!(reading.get(Field::MeterType), Some(&Value::Text("1011".into())));
        assert!(reading.get(Field::MeterModel).is_none());
    }
}
