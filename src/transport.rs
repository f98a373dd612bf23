//! Request/response transport.
//!
//! A [`Transport`] sends one [`Request`] and returns the raw response. The
//! meter session only talks to this trait; [`TcpTransport`] is the
//! implementation for meters behind an Ethernet-to-RS485 converter.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::codec::{Disconnect, IserialCodec};
use crate::error::{MeterError, Result};
use crate::request::Request;

/// Default converter port.
pub const DEFAULT_PORT: u16 = 50000;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Default response timeout in seconds.
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Sends a request and returns the response bytes.
pub trait Transport: Send {
    /// Exchange one request for one response.
    ///
    /// The returned buffer is not validated; a short buffer is passed on so
    /// the frame parser can report it.
    fn exchange(&mut self, request: &Request) -> impl Future<Output = Result<Bytes>> + Send;
}

/// TCP transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Converter host name or IP address
    pub host: String,
    /// Converter port
    pub port: u16,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Time to wait for a full response
    pub read_timeout: Duration,
}

impl TransportConfig {
    /// Create a new configuration for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set response timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// One TCP connection per request.
///
/// The converter forwards a single exchange per connection, so each call
/// connects, sends the request, reads one response, sends the disconnect
/// sequence and closes.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    /// Create a new TCP transport.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for TcpTransport {
    async fn exchange(&mut self, request: &Request) -> Result<Bytes> {
        let address = (self.config.host.as_str(), self.config.port);

        let stream = timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                MeterError::Timeout(format!(
                    "connecting to {}:{}",
                    self.config.host, self.config.port
                ))
            })?
            .map_err(|e| {
                MeterError::Connection(format!("{}:{}: {}", self.config.host, self.config.port, e))
            })?;
        stream.set_nodelay(true).ok();
        debug!(host = %self.config.host, port = self.config.port, "Socket open");

        exchange_on(stream, request, self.config.read_timeout).await
    }
}

/// Run one exchange over an already connected stream.
///
/// The disconnect sequence is sent and the stream shut down whatever the
/// outcome of the read.
pub(crate) async fn exchange_on<S>(
    stream: S,
    request: &Request,
    read_timeout: Duration,
) -> Result<Bytes>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let variant = request.variant;
    let mut framed = Framed::new(stream, IserialCodec::new());

    trace!(request = %request, "Socket write");
    framed.send(request.clone()).await?;

    let response = match timeout(read_timeout, framed.next()).await {
        Ok(Some(response)) => response,
        Ok(None) => Err(MeterError::no_response(
            variant,
            "connection closed before any data",
        )),
        Err(_) if !framed.read_buffer().is_empty() => {
            Ok(framed.read_buffer_mut().split().freeze())
        }
        Err(_) => Err(MeterError::no_response(
            variant,
            format!("no data within {:?}", read_timeout),
        )),
    };

    if let Err(e) = framed.send(Disconnect).await {
        debug!(error = %e, "Disconnect sequence not sent");
    }
    if let Err(e) = framed.get_mut().shutdown().await {
        debug!(error = %e, "Socket shutdown failed");
    }
    debug!(
        variant = %variant,
        bytes = response.as_ref().map_or(0, Bytes::len),
        "Socket closed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DISCONNECT;
    use crate::types::{ResponseVariant, RESPONSE_LENGTH};
    use tokio::io::AsyncReadExt;

    fn request() -> Request {
        Request::new("300001234".parse().unwrap(), ResponseVariant::A)
    }

    #[test]
    fn test_config_builder() {
        let config = TransportConfig::new("192.168.1.50")
            .port(50001)
            .connect_timeout(Duration::from_secs(2))
            .read_timeout(Duration::from_millis(500));

        assert_eq!(config.host, "192.168.1.50");
        assert_eq!(config.port, 50001);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(TransportConfig::new("meter").port, DEFAULT_PORT);
    }

    #[test]
    fn test_exchange_full_response() {
        let response = vec![0x30; RESPONSE_LENGTH];
        let stream = tokio_test::io::Builder::new()
            .write(b"/?00030000123400!\r\n")
            .read(&response)
            .write(&DISCONNECT)
            .build();

        let bytes = tokio_test::block_on(exchange_on(stream, &request(), Duration::from_secs(1)))
            .unwrap();
        assert_eq!(bytes.len(), RESPONSE_LENGTH);
    }

    #[test]
    fn test_exchange_short_response_on_timeout() {
        let stream = tokio_test::io::Builder::new()
            .write(b"/?00030000123400!\r\n")
            .read(&[0x02; 100])
            .write(&DISCONNECT)
            .build();

        let bytes =
            tokio_test::block_on(exchange_on(stream, &request(), Duration::from_millis(50)))
                .unwrap();
        assert_eq!(bytes.len(), 100);
    }

    #[test]
    fn test_exchange_no_response() {
        tokio_test::block_on(async {
            let (client, mut server) = tokio::io::duplex(512);

            let meter = async move {
                let mut buf = [0u8; 19];
                server.read_exact(&mut buf).await.unwrap();
                assert_eq!(&buf, b"/?00030000123400!\r\n");
                drop(server);
            };

            let req = request();
            let (result, _) = tokio::join!(
                exchange_on(client, &req, Duration::from_secs(1)),
                meter
            );

            assert!(matches!(
                result.unwrap_err(),
                MeterError::NoResponse {
                    variant: ResponseVariant::A,
                    ..
                }
            ));
        });
    }

    #[test]
    fn test_exchange_silent_meter() {
        // Connection stays open but the meter never answers
        let stream = tokio_test::io::Builder::new()
            .write(b"/?00030000123400!\r\n")
            .wait(Duration::from_millis(200))
            .write(&DISCONNECT)
            .build();

        let err = tokio_test::block_on(exchange_on(stream, &request(), Duration::from_millis(50)))
            .unwrap_err();
        assert!(err.is_cycle_abort());
        assert!(matches!(
            err,
            MeterError::NoResponse {
                variant: ResponseVariant::A,
                ..
            }
        ));
    }
}
