//! iSerial codec for tokio.
//!
//! Responses carry no length prefix; the meter always answers a read
//! request with exactly [`RESPONSE_LENGTH`] bytes, so framing is by count.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::MeterError;
use crate::request::Request;
use crate::types::RESPONSE_LENGTH;

/// Bytes that end a session and release the meter's serial line.
pub const DISCONNECT: [u8; 4] = [0x0A, 0x03, 0x32, 0x3D];

/// Close request, encoded as [`DISCONNECT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnect;

/// iSerial codec.
///
/// # Example
///
/// ```rust,ignore
/// use tokio_util::codec::Framed;
/// use ekm_iserial::codec::{Disconnect, IserialCodec};
///
/// let stream = TcpStream::connect("192.168.1.50:50000").await?;
/// let mut framed = Framed::new(stream, IserialCodec::new());
///
/// framed.send(request).await?;
/// let response = framed.next().await;
/// framed.send(Disconnect).await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IserialCodec;

impl IserialCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for IserialCodec {
    type Item = Bytes;
    type Error = MeterError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if src.len() < RESPONSE_LENGTH {
            src.reserve(RESPONSE_LENGTH - src.len());
            return Ok(None);
        }
        Ok(Some(src.split_to(RESPONSE_LENGTH).freeze()))
    }

    /// Yield a short remainder as-is, so the frame parser can report its length.
    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Ok(Some(src.split().freeze())),
        }
    }
}

impl Encoder<Request> for IserialCodec {
    type Error = MeterError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        dst.reserve(item.encoded_len());
        dst.put_slice(item.encode().as_bytes());
        Ok(())
    }
}

impl Encoder<Disconnect> for IserialCodec {
    type Error = MeterError;

    fn encode(
        &mut self,
        _: Disconnect,
        dst: &mut BytesMut,
    ) -> std::result::Result<(), Self::Error> {
        dst.put_slice(&DISCONNECT);
        Ok(())
    }
}
