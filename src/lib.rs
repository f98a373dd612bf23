//! # ekm_iserial
//!
//! EKM Omnimeter iSerial protocol implementation for Rust.
//!
//! This crate reads telemetry from EKM Omnimeter v.3 and Pulse v.4 meters,
//! usually through an Ethernet-to-RS485 converter. A full read takes two
//! request/response exchanges whose results are merged into one snapshot.
//!
//! ## Features
//!
//! - **Typed values**: Energy, volts, amps and power factor scaled per field
//! - **Resolved codes**: Pulse inputs, current direction and outputs as enums
//! - **Aggregates**: Volts, amps and watts combined per wiring configuration
//! - **Cached reads**: Lookups refresh only once the snapshot is stale
//! - **Pluggable transport**: TCP by default, any [`Transport`] for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ekm_iserial::{Field, Meter, MeterConfig, TcpTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> ekm_iserial::Result<()> {
//!     let config = MeterConfig::new("300001234")?
//!         .power_configuration("single_phase_3wire".parse()?)
//!         .verify_checksums(true);
//!     let transport = TcpTransport::new(TransportConfig::new("192.168.1.50"));
//!     let meter = Meter::new(config, transport);
//!
//!     let snapshot = meter.read().await?;
//!     for (field, value) in &snapshot {
//!         println!("{}: {}", field, value);
//!     }
//!
//!     // Served from the snapshot unless it is older than 250 ms
//!     println!("{}", meter.get(Field::NetKwh).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol Overview
//!
//! The meter answers an ASCII read request with a fixed 255-byte response.
//! Two response shapes exist:
//!
//! - **Variant A** (`00`): Energy totals, instantaneous values, pulse counts
//! - **Variant B** (`01`): Time-of-use energy, maximum demand, ratios
//!
//! ```text
//! Request:  /?000300001234 00 !\r\n
//!
//! Response (255 bytes):
//! +-----+------------------------------------+-------------------+-----+
//! | STX | fixed-width ASCII fields           | 00 ! CR LF ETX    | CRC |
//! +-----+------------------------------------+-------------------+-----+
//! ```
//!
//! Energy registers of both variants are scaled by the decimal places
//! reported in variant A, so a read always requests A before B.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregate;
pub mod cast;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod frame;
pub mod meter;
pub mod observer;
pub mod request;
pub mod snapshot;
pub mod transport;
pub mod types;

// Re-export main types
pub use aggregate::{NetEnergy, PowerConfiguration};
pub use cast::{decode, CastContext, Reading};
pub use checksum::{ChecksumFields, ChecksumParams, TrailerOrder};
pub use codec::IserialCodec;
pub use error::{MeterError, Result};
pub use frame::{Frame, RawField};
pub use meter::{Meter, MeterConfig, MERGE_ORDER};
pub use observer::{MeterEvent, Observer, TracingObserver};
pub use request::{MeterNumber, Request};
pub use snapshot::Snapshot;
pub use transport::{TcpTransport, Transport, TransportConfig};
pub use types::*;
