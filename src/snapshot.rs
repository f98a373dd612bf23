//! Merged meter state.

use std::collections::btree_map::{self, BTreeMap};

use chrono::{DateTime, FixedOffset, Utc};

use crate::aggregate::{NetEnergy, PowerConfiguration};
use crate::cast::Reading;
use crate::types::{Field, Value};

/// Union of the fields decoded from both response variants.
///
/// Values are replaced field by field; a field keeps its last decoded value
/// until a later reading overwrites it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<Field, Value>,
    captured_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    #[inline]
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Iterate values in field order.
    pub fn iter(&self) -> btree_map::Iter<'_, Field, Value> {
        self.values.iter()
    }

    /// Number of fields held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no field has been decoded yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// When the last complete cycle was committed.
    #[inline]
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Numeric value as f64.
    pub fn decimal(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Integer value.
    pub fn integer(&self, field: Field) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Text value.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Timestamp value.
    pub fn timestamp(&self, field: Field) -> Option<DateTime<FixedOffset>> {
        self.get(field).and_then(Value::as_timestamp)
    }

    /// Aggregate voltage.
    pub fn volts(&self) -> Option<f64> {
        self.decimal(Field::Volts)
    }

    /// Aggregate current.
    pub fn amps(&self) -> Option<f64> {
        self.decimal(Field::Amps)
    }

    /// Aggregate active power.
    pub fn watts(&self) -> Option<i64> {
        self.integer(Field::Watts)
    }

    /// `total_kwh` minus `total_reverse_kwh`.
    pub fn total_forward_kwh(&self) -> Option<f64> {
        self.decimal(Field::TotalForwardKwh)
    }

    /// Forward minus reverse energy, from variant A totals.
    pub fn net_kwh(&self) -> Option<f64> {
        self.decimal(Field::NetKwh)
    }

    /// Meter clock of the most recently merged reading.
    pub fn meter_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp(Field::MeterTimestamp)
    }

    /// Overwrite the fields carried by `reading`.
    pub fn merge(&mut self, reading: Reading) {
        self.values.extend(reading.values);
    }

    /// Recompute the derived fields from the per-line and total values.
    ///
    /// A derived field is only written when all of its inputs are present.
    pub fn derive(&mut self, config: PowerConfiguration) {
        let volts = self.lines([Field::VoltsL1, Field::VoltsL2, Field::VoltsL3]);
        if let Some((l1, l2, l3)) = volts {
            self.values
                .insert(Field::Volts, Value::Decimal(config.aggregate(l1, l2, l3)));
        }

        let amps = self.lines([Field::AmpsL1, Field::AmpsL2, Field::AmpsL3]);
        if let Some((l1, l2, l3)) = amps {
            self.values
                .insert(Field::Amps, Value::Decimal(config.aggregate(l1, l2, l3)));
        }

        if let (Some(w1), Some(w2), Some(w3)) = (
            self.integer(Field::WattsL1),
            self.integer(Field::WattsL2),
            self.integer(Field::WattsL3),
        ) {
            self.values
                .insert(Field::Watts, Value::Integer(config.aggregate(w1, w2, w3)));
        }

        if let (Some(total), Some(reverse)) = (
            self.decimal(Field::TotalKwh),
            self.decimal(Field::TotalReverseKwh),
        ) {
            let net = NetEnergy::from_totals(total, reverse);
            self.values
                .insert(Field::TotalForwardKwh, Value::Decimal(net.total_forward_kwh));
            self.values.insert(Field::NetKwh, Value::Decimal(net.net_kwh));
        }
    }

    fn lines(&self, fields: [Field; 3]) -> Option<(f64, f64, f64)> {
        Some((
            self.decimal(fields[0])?,
            self.decimal(fields[1])?,
            self.decimal(fields[2])?,
        ))
    }

    pub(crate) fn set_captured_at(&mut self, at: DateTime<Utc>) {
        self.captured_at = Some(at);
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a Field, &'a Value);
    type IntoIter = btree_map::Iter<'a, Field, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
