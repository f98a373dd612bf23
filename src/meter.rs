//! Meter session.
//!
//! A [`Meter`] owns one transport and the merged [`Snapshot`]. Reads are
//! serialized behind a single async mutex: the staleness check, the two
//! request/response exchanges and the commit all happen under the lock,
//! so at most one read cycle is in flight per session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::aggregate::PowerConfiguration;
use crate::cast::{self, CastContext, Reading};
use crate::checksum::ChecksumParams;
use crate::error::{MeterError, Result};
use crate::frame::Frame;
use crate::observer::{MeterEvent, Observer, TracingObserver};
use crate::request::{MeterNumber, Request};
use crate::snapshot::Snapshot;
use crate::transport::Transport;
use crate::types::{Field, ResponseVariant, Value};

/// Default staleness threshold in milliseconds.
pub const DEFAULT_STALE_AFTER_MS: u64 = 250;

/// Order in which the variants are requested and merged.
///
/// Fields present in both responses (identity, per-line values, meter
/// clock) end up with the value from the later variant.
pub const MERGE_ORDER: [ResponseVariant; 2] = [ResponseVariant::A, ResponseVariant::B];

/// Session configuration.
#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Target meter
    pub meter_number: MeterNumber,
    /// Wiring used for the aggregate values
    pub power_configuration: PowerConfiguration,
    /// Check response trailers
    pub verify_checksums: bool,
    /// Age after which a lookup triggers a new read cycle
    pub stale_after: Duration,
    /// Offset the meter clock is set to
    pub utc_offset: FixedOffset,
    /// CRC parameters used when verification is enabled
    pub checksum: ChecksumParams,
}

impl MeterConfig {
    /// Create a new configuration for the given meter number.
    ///
    /// Fails with [`MeterError::InvalidMeterNumber`] unless the number is
    /// 1 to 12 digits.
    pub fn new(meter_number: &str) -> Result<Self> {
        Ok(Self {
            meter_number: MeterNumber::new(meter_number)?,
            power_configuration: PowerConfiguration::default(),
            verify_checksums: false,
            stale_after: Duration::from_millis(DEFAULT_STALE_AFTER_MS),
            utc_offset: FixedOffset::east_opt(0)
                .ok_or_else(|| MeterError::configuration("invalid UTC offset"))?,
            checksum: ChecksumParams::default(),
        })
    }

    /// Set the wiring.
    pub fn power_configuration(mut self, config: PowerConfiguration) -> Self {
        self.power_configuration = config;
        self
    }

    /// Enable or disable trailer verification.
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Set the staleness threshold.
    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Set the offset of the meter clock.
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Set the CRC parameters.
    pub fn checksum_params(mut self, params: ChecksumParams) -> Self {
        self.checksum = params;
        self
    }
}

struct Session<T> {
    transport: T,
    snapshot: Snapshot,
    last_read: Option<Instant>,
}

impl<T> Session<T> {
    fn is_stale(&self, stale_after: Duration) -> bool {
        self.last_read
            .map_or(true, |at| at.elapsed() >= stale_after)
    }
}

/// A meter read session.
///
/// # Example
///
/// ```rust,ignore
/// use ekm_iserial::{Field, Meter, MeterConfig, TcpTransport, TransportConfig};
///
/// let config = MeterConfig::new("300001234")?
///     .power_configuration("three_phase_4wire".parse()?);
/// let meter = Meter::new(config, TcpTransport::new(TransportConfig::new("192.168.1.50")));
///
/// let volts = meter.get(Field::Volts).await?;
/// let net = meter.get_by_name("net_kwh").await?;
/// ```
pub struct Meter<T> {
    config: MeterConfig,
    observer: Arc<dyn Observer>,
    session: Mutex<Session<T>>,
}

impl<T: Transport> Meter<T> {
    /// Create a session that logs events through `tracing`.
    pub fn new(config: MeterConfig, transport: T) -> Self {
        Self::with_observer(config, transport, Arc::new(TracingObserver))
    }

    /// Create a session with an event observer.
    pub fn with_observer(config: MeterConfig, transport: T, observer: Arc<dyn Observer>) -> Self {
        Self {
            config,
            observer,
            session: Mutex::new(Session {
                transport,
                snapshot: Snapshot::new(),
                last_read: None,
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Run a full read cycle and return the merged snapshot.
    pub async fn read(&self) -> Result<Snapshot> {
        let mut session = self.session.lock().await;
        self.cycle(&mut session).await?;
        Ok(session.snapshot.clone())
    }

    /// Look up a field, refreshing first if the snapshot is stale.
    ///
    /// Fails with [`MeterError::UnknownField`] if neither variant produced
    /// the field.
    pub async fn get(&self, field: Field) -> Result<Value> {
        let mut session = self.session.lock().await;
        if session.is_stale(self.config.stale_after) {
            self.observer.on_event(&MeterEvent::Refresh);
            self.cycle(&mut session).await?;
        }
        session
            .snapshot
            .get(field)
            .cloned()
            .ok_or_else(|| MeterError::UnknownField(field.to_string()))
    }

    /// Look up a field by its snake_case name.
    ///
    /// An unknown name fails before any refresh.
    pub async fn get_by_name(&self, name: &str) -> Result<Value> {
        let field = name.parse::<Field>()?;
        self.get(field).await
    }

    /// The current snapshot, without refreshing.
    pub async fn snapshot(&self) -> Snapshot {
        self.session.lock().await.snapshot.clone()
    }

    /// Wall-clock time of the last completed read cycle.
    pub async fn last_read_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.snapshot.captured_at()
    }

    async fn cycle(&self, session: &mut Session<T>) -> Result<()> {
        match self.read_cycle(session).await {
            Ok(mut snapshot) => {
                snapshot.derive(self.config.power_configuration);
                snapshot.set_captured_at(Utc::now());
                let fields = snapshot.len();

                session.snapshot = snapshot;
                session.last_read = Some(Instant::now());
                self.observer.on_event(&MeterEvent::CycleCompleted { fields });
                Ok(())
            }
            Err(e) => {
                self.observer.on_event(&MeterEvent::CycleFailed {
                    error: e.to_string(),
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }

    /// Request and decode each variant, merging into a copy of the snapshot.
    async fn read_cycle(&self, session: &mut Session<T>) -> Result<Snapshot> {
        let ctx = CastContext::new(self.config.utc_offset);
        let mut snapshot = session.snapshot.clone();
        let mut decimal_places = None;

        for variant in MERGE_ORDER {
            let reading = self
                .read_variant(&mut session.transport, variant, decimal_places, &ctx)
                .await?;
            decimal_places = reading.decimal_places().or(decimal_places);
            snapshot.merge(reading);
        }

        Ok(snapshot)
    }

    async fn read_variant(
        &self,
        transport: &mut T,
        variant: ResponseVariant,
        decimal_places: Option<u32>,
        ctx: &CastContext,
    ) -> Result<Reading> {
        let request = Request::new(self.config.meter_number.clone(), variant);
        debug!(meter = %self.config.meter_number, %request, "Requesting response");

        // Connect failures and timeouts mean the meter gave no data
        let raw = transport.exchange(&request).await.map_err(|e| {
            if e.is_cycle_abort() {
                e
            } else {
                MeterError::no_response(variant, e.to_string())
            }
        })?;
        if raw.is_empty() {
            return Err(MeterError::no_response(variant, "empty response"));
        }
        let frame = Frame::parse(variant, raw)?;

        let checksum = if self.config.verify_checksums {
            let fields = self.config.checksum.check(&frame);
            self.observer.on_event(&if fields.matches() {
                MeterEvent::ChecksumVerified { variant }
            } else {
                MeterEvent::ChecksumMismatch {
                    variant,
                    expected: fields.expected,
                    computed: fields.computed,
                }
            });
            Some(fields)
        } else {
            None
        };

        let mut reading = cast::decode(&frame, decimal_places, ctx)?;
        reading.checksum = checksum;

        if let Some(raw) = &reading.timestamp_fallback {
            self.observer.on_event(&MeterEvent::TimestampFallback {
                variant,
                raw: raw.clone(),
            });
        }

        Ok(reading)
    }
}
