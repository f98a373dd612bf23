//! Response CRC verification.
//!
//! The CRC parameters and covered span are not fixed by any public vendor
//! document, so they live in [`ChecksumParams`] rather than in code.
//! The defaults follow the vendor's reference clients: CRC-16/MODBUS over
//! everything between STX and the trailer, each result byte masked to 7
//! bits, low byte first on the wire.

use crc::{Algorithm, Crc, CRC_16_MODBUS};

use crate::frame::Frame;
use crate::types::CHECKSUM_LENGTH;

/// Byte order of the 2-byte trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerOrder {
    LittleEndian,
    BigEndian,
}

/// CRC parameters and covered span.
#[derive(Debug, Clone, Copy)]
pub struct ChecksumParams {
    /// CRC-16 algorithm from the `crc` catalog
    pub algorithm: &'static Algorithm<u16>,
    /// Bytes excluded at the start of the response
    pub skip_leading: usize,
    /// Bytes excluded at the end of the response
    pub skip_trailing: usize,
    /// Mask applied to the computed value
    pub mask: u16,
    /// Byte order of the trailer
    pub trailer_order: TrailerOrder,
}

impl Default for ChecksumParams {
    fn default() -> Self {
        Self {
            algorithm: &CRC_16_MODBUS,
            skip_leading: 1,
            skip_trailing: CHECKSUM_LENGTH,
            mask: 0x7F7F,
            trailer_order: TrailerOrder::LittleEndian,
        }
    }
}

/// Trailer value paired with the value computed over the same response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumFields {
    /// Value carried in the trailer
    pub expected: u16,
    /// Value computed over the covered span
    pub computed: u16,
}

impl ChecksumFields {
    /// Check if the trailer matches.
    #[inline]
    pub fn matches(&self) -> bool {
        self.expected == self.computed
    }
}

impl ChecksumParams {
    /// Set the algorithm.
    pub fn algorithm(mut self, algorithm: &'static Algorithm<u16>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the covered span.
    pub fn span(mut self, skip_leading: usize, skip_trailing: usize) -> Self {
        self.skip_leading = skip_leading;
        self.skip_trailing = skip_trailing;
        self
    }

    /// Set the result mask.
    pub fn mask(mut self, mask: u16) -> Self {
        self.mask = mask;
        self
    }

    /// Set the trailer byte order.
    pub fn trailer_order(mut self, order: TrailerOrder) -> Self {
        self.trailer_order = order;
        self
    }

    /// Compute the masked CRC over the covered span of `response`.
    ///
    /// An empty span (response shorter than the excluded bytes) yields the
    /// CRC of no data.
    pub fn compute(&self, response: &[u8]) -> u16 {
        let end = response.len().saturating_sub(self.skip_trailing);
        let start = self.skip_leading.min(end);
        Crc::<u16>::new(self.algorithm).checksum(&response[start..end]) & self.mask
    }

    /// Decode the trailer bytes.
    #[inline]
    pub fn trailer_value(&self, trailer: [u8; CHECKSUM_LENGTH]) -> u16 {
        match self.trailer_order {
            TrailerOrder::LittleEndian => u16::from_le_bytes(trailer),
            TrailerOrder::BigEndian => u16::from_be_bytes(trailer),
        }
    }

    /// Encode a value as trailer bytes.
    #[inline]
    pub fn trailer_bytes(&self, value: u16) -> [u8; CHECKSUM_LENGTH] {
        match self.trailer_order {
            TrailerOrder::LittleEndian => value.to_le_bytes(),
            TrailerOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Compare a frame's trailer with the value computed over it.
    pub fn check(&self, frame: &Frame) -> ChecksumFields {
        ChecksumFields {
            expected: self.trailer_value(frame.checksum_bytes()),
            computed: self.compute(frame.raw()),
        }
    }

    /// Overwrite the trailer of a full response so that it verifies.
    pub fn seal(&self, response: &mut [u8]) {
        if response.len() < CHECKSUM_LENGTH {
            return;
        }
        let value = self.compute(response);
        let at = response.len() - CHECKSUM_LENGTH;
        response[at..].copy_from_slice(&self.trailer_bytes(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::build_frame;
    use crate::types::ResponseVariant;
    use bytes::Bytes;
    use crc::CRC_16_ARC;

    #[test]
    fn test_default_span_and_algorithm() {
        // STX + CRC-16/MODBUS check string + 2 trailer bytes
        let response = b"\x02123456789\x00\x00";
        let params = ChecksumParams::default();
        assert_eq!(params.compute(response), 0x4B37 & 0x7F7F);
    }

    #[test]
    fn test_mask() {
        let response = b"\x02123456789\x00\x00";
        let params = ChecksumParams::default().mask(0xFFFF);
        assert_eq!(params.compute(response), 0x4B37);
    }

    #[test]
    fn test_configurable_algorithm() {
        let response = b"123456789";
        let params = ChecksumParams::default()
            .algorithm(&CRC_16_ARC)
            .span(0, 0)
            .mask(0xFFFF);
        assert_eq!(params.compute(response), 0xBB3D);
    }

    #[test]
    fn test_trailer_order() {
        let params = ChecksumParams::default();
        assert_eq!(params.trailer_value([0x37, 0x4B]), 0x4B37);
        let params = params.trailer_order(TrailerOrder::BigEndian);
        assert_eq!(params.trailer_value([0x4B, 0x37]), 0x4B37);
        assert_eq!(params.trailer_bytes(0x4B37), [0x4B, 0x37]);
    }

    #[test]
    fn test_check_sealed_frame() {
        let params = ChecksumParams::default();
        let mut raw = build_frame(ResponseVariant::A, |field| {
            "1".repeat(ResponseVariant::A.width_of(field).unwrap())
        });
        params.seal(&mut raw);

        let frame = Frame::parse(ResponseVariant::A, Bytes::from(raw)).unwrap();
        let fields = params.check(&frame);
        assert!(fields.matches());
        assert_eq!(fields.expected & 0x8080, 0);
    }

    #[test]
    fn test_check_corrupted_frame() {
        // Unmasked so that any single byte error is detected
        let params = ChecksumParams::default().mask(0xFFFF);
        let mut raw = build_frame(ResponseVariant::B, |field| {
            "1".repeat(ResponseVariant::B.width_of(field).unwrap())
        });
        params.seal(&mut raw);
        raw[20] = b'9';

        let frame = Frame::parse(ResponseVariant::B, Bytes::from(raw)).unwrap();
        let fields = params.check(&frame);
        assert!(!fields.matches());
        assert_ne!(fields.expected, fields.computed);
    }

    #[test]
    fn test_short_response() {
        let params = ChecksumParams::default();
        assert_eq!(params.compute(b"\x02"), params.compute(b""));
    }
}
