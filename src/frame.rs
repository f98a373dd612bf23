//! Positional response frame parser.
//!
//! A response is sliced by walking its variant's layout table left to right.
//! The parser never looks at field content to find an offset.

use bytes::Bytes;

use crate::error::{MeterError, Result};
use crate::types::{Field, ResponseVariant, Segment, CHECKSUM_LENGTH, RESPONSE_LENGTH};

/// Raw bytes of one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Field name
    pub field: Field,
    /// Offset within the response
    pub offset: usize,
    /// Raw field bytes
    pub bytes: Bytes,
}

impl RawField {
    /// Field content as ASCII text.
    pub fn as_str(&self) -> Result<&str> {
        if !self.bytes.is_ascii() {
            return Err(MeterError::field_cast(self.field, "non-ASCII bytes"));
        }
        std::str::from_utf8(&self.bytes).map_err(|e| MeterError::field_cast(self.field, e.to_string()))
    }
}

/// A response sliced into raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    variant: ResponseVariant,
    raw: Bytes,
    fields: Vec<RawField>,
    checksum: [u8; CHECKSUM_LENGTH],
}

impl Frame {
    /// Slice a response buffer according to the variant's layout.
    ///
    /// Fails with [`MeterError::MalformedResponse`] unless the buffer is
    /// exactly [`RESPONSE_LENGTH`] bytes.
    pub fn parse(variant: ResponseVariant, raw: Bytes) -> Result<Self> {
        if raw.len() != RESPONSE_LENGTH {
            return Err(MeterError::MalformedResponse {
                variant,
                expected: RESPONSE_LENGTH,
                actual: raw.len(),
            });
        }

        let layout = variant.layout();
        let mut fields = Vec::with_capacity(layout.len());
        let mut checksum = [0u8; CHECKSUM_LENGTH];
        let mut offset = 0;

        for segment in layout {
            let width = segment.width();
            match segment {
                Segment::Field(field, _) => fields.push(RawField {
                    field: *field,
                    offset,
                    bytes: raw.slice(offset..offset + width),
                }),
                Segment::Skip(_) => {}
                Segment::Checksum => checksum.copy_from_slice(&raw[offset..offset + width]),
            }
            offset += width;
        }

        Ok(Self {
            variant,
            raw,
            fields,
            checksum,
        })
    }

    /// Response variant.
    #[inline]
    pub fn variant(&self) -> ResponseVariant {
        self.variant
    }

    /// The full response buffer.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Raw fields in wire order.
    #[inline]
    pub fn fields(&self) -> &[RawField] {
        &self.fields
    }

    /// Look up a raw field by name.
    pub fn get(&self, field: Field) -> Option<&RawField> {
        self.fields.iter().find(|raw| raw.field == field)
    }

    /// The two trailer bytes.
    #[inline]
    pub fn checksum_bytes(&self) -> [u8; CHECKSUM_LENGTH] {
        self.checksum
    }
}
