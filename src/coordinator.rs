//! # Poll Coordinator
//!
//! Owns one MAC unit end to end: the poll cycle, the write path, and the
//! published value snapshot consumers read from.
//!
//! ## Poll Cycle
//!
//! Every cycle runs on a fresh connection and walks a fixed sequence:
//!
//! 1. Take the device lock (writes wait until the cycle finishes).
//! 2. Connect; a settle delay plus random jitter gives the controller's
//!    small TCP stack room to breathe and spreads reconnects when several
//!    pollers share a gateway.
//! 3. Warm-up read of register 1001; failures are logged and ignored, the
//!    read exists to shake stale state out of the device's server loop.
//! 4. First successful cycle only: batch-read the static registers
//!    (hardware type, software version, heater type) and remember them for
//!    the rest of the session.
//! 5. Batch-read all polled registers span by span; a failing span is
//!    retried, then skipped, leaving its keys out of this cycle's map.
//! 6. Merge static + fresh values, derive the v2 user-state flags, publish
//!    the snapshot.
//! 7. Close the connection no matter what happened.
//!
//! A cycle that cannot produce any data at all (connect failure, every
//! span failing) surfaces as [`ModbusError::UpdateFailed`]; partial
//! failures never do.
//!
//! Writes run through a separate long-lived connection under the same
//! device lock, and report communication failure as `Ok(false)` rather
//! than an error. Only programmer mistakes (unknown key, read-only key,
//! unencodable value) fail loudly.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::batcher::{plan_read_spans, total_registers, ReadSpan};
use crate::client::ParmairClient;
use crate::codec;
use crate::compat::UnitIdShim;
use crate::config::DeviceConfig;
use crate::constants::{
    CONNECT_JITTER_MAX, CONNECT_JITTER_MIN, CONNECT_SETTLE, INTER_READ_DELAY, MAX_READ_REGISTERS,
    SPAN_RETRIES, SPAN_RETRY_DELAY, WARMUP_ATTEMPTS, WARMUP_REGISTER_ADDRESS, WRITE_SETTLE,
};
use crate::error::{ModbusError, ModbusResult};
use crate::registers::{FirmwareFamily, RegisterCatalog, RegisterDefinition};
use crate::states::{hardware_model, ControlStateV2};
use crate::transport::{ModbusConnector, ModbusTransport, TcpConnector};

/// Register facts consumers show as diagnostic attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterMetadata {
    pub address: u16,
    pub label: &'static str,
    pub scale: f64,
    pub writable: bool,
}

impl From<&RegisterDefinition> for RegisterMetadata {
    fn from(definition: &RegisterDefinition) -> Self {
        Self {
            address: definition.address,
            label: definition.label,
            scale: definition.scale,
            writable: definition.writable,
        }
    }
}

/// Per-device mutable state behind the device lock
struct PollState<T: ModbusTransport> {
    /// One-time-read values, kept for the whole session
    static_data: HashMap<&'static str, f64>,
    /// Set once every static span has succeeded; never cleared
    static_read: bool,
    /// Long-lived write connection, opened on first write
    write_client: Option<ParmairClient<T>>,
}

impl<T: ModbusTransport> PollState<T> {
    fn new() -> Self {
        Self {
            static_data: HashMap::new(),
            static_read: false,
            write_client: None,
        }
    }
}

/// Poller for one MAC unit
///
/// Generic over the connector so tests can substitute a simulated device;
/// production code uses [`PollCoordinator::from_config`] which wires in
/// TCP.
pub struct PollCoordinator<C: ModbusConnector> {
    connector: C,
    catalog: RegisterCatalog,
    shim: UnitIdShim,
    peer: String,
    scan_interval: Duration,
    state: Mutex<PollState<C::Transport>>,
    values: RwLock<HashMap<&'static str, f64>>,
    shutdown: Notify,
}

impl PollCoordinator<TcpConnector> {
    /// TCP coordinator for a validated configuration.
    ///
    /// The configuration must carry a resolved firmware family; run
    /// detection or pick one manually before building the coordinator.
    pub fn from_config(config: &DeviceConfig) -> ModbusResult<Self> {
        config.validate()?;
        let family = config.family.ok_or_else(|| {
            ModbusError::configuration("Firmware family not resolved; detect or choose one")
        })?;
        let connector = TcpConnector::new(config.socket_addr(), config.timeout);
        Ok(Self::new(config, family, connector))
    }
}

impl<C: ModbusConnector> PollCoordinator<C> {
    /// Coordinator over an arbitrary connector
    pub fn new(config: &DeviceConfig, family: FirmwareFamily, connector: C) -> Self {
        Self {
            connector,
            catalog: family.catalog(),
            shim: UnitIdShim::new(config.normalized_unit_id()),
            peer: config.socket_addr(),
            scan_interval: config.scan_interval,
            state: Mutex::new(PollState::new()),
            values: RwLock::new(HashMap::new()),
            shutdown: Notify::new(),
        }
    }

    /// The firmware family this coordinator polls
    #[inline]
    pub fn family(&self) -> FirmwareFamily {
        self.catalog.family()
    }

    /// The catalog backing lookups and the poll plan
    #[inline]
    pub fn catalog(&self) -> RegisterCatalog {
        self.catalog
    }

    /// Last published value for `key`; `None` means unavailable this cycle
    pub fn get_value(&self, key: &str) -> Option<f64> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Clone of the full published snapshot
    pub fn snapshot(&self) -> HashMap<&'static str, f64> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Catalog facts for `key`, for diagnostic surfaces
    pub fn get_register_metadata(&self, key: &str) -> ModbusResult<RegisterMetadata> {
        Ok(RegisterMetadata::from(self.catalog.get(key)?))
    }

    /// Marketing model string, e.g. "MAC 120", once static data is in
    pub fn model(&self) -> Option<String> {
        let raw = self.get_value("hardware_type")? as u16;
        Some(format!("MAC {}", hardware_model(self.family(), raw)))
    }

    /// Software version formatted with two decimals, once static data is in
    pub fn software_version(&self) -> Option<String> {
        self.get_value("software_version")
            .map(|version| format!("{version:.2}"))
    }

    /// Run one full poll cycle and publish the results.
    ///
    /// Returns [`ModbusError::UpdateFailed`] when the cycle produced no
    /// data; per-register failures are logged and absorbed.
    pub async fn poll_once(&self) -> ModbusResult<()> {
        let mut state = self.state.lock().await;

        debug!("Poll cycle starting for {} ({} layout)", self.peer, self.family());
        let transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(err) => {
                warn!("Poll connect to {} failed: {err}", self.peer);
                return Err(ModbusError::update_failed(format!("connect failed: {err}")));
            }
        };
        let mut client = ParmairClient::new(transport);

        let result = self.run_cycle(&mut state, &mut client).await;

        if let Err(err) = client.close().await {
            debug!("Closing poll connection failed: {err}");
        }

        match result {
            Ok(merged) => {
                let count = merged.len();
                *self.values.write().unwrap_or_else(PoisonError::into_inner) = merged;
                debug!("Poll cycle complete: {count} values published");
                Ok(())
            }
            Err(err @ ModbusError::UpdateFailed { .. }) => Err(err),
            Err(err) => Err(ModbusError::update_failed(err.to_string())),
        }
    }

    /// Poll on the configured interval until [`PollCoordinator::shutdown`]
    pub async fn run(&self) {
        info!(
            "Polling {} every {:?} ({} layout)",
            self.peer,
            self.scan_interval,
            self.family()
        );
        loop {
            if let Err(err) = self.poll_once().await {
                warn!("{err}");
            }
            tokio::select! {
                _ = sleep(self.scan_interval) => {}
                _ = self.shutdown.notified() => {
                    debug!("Poll loop for {} stopping", self.peer);
                    break;
                }
            }
        }
    }

    /// Stop the poll loop and close the write connection, best-effort
    pub async fn shutdown(&self) {
        self.shutdown.notify_one();
        let mut state = self.state.lock().await;
        if let Some(mut client) = state.write_client.take() {
            if let Err(err) = client.close().await {
                debug!("Closing write connection failed: {err}");
            }
        }
    }

    /// Write an engineering value to a writable register.
    ///
    /// Communication failure returns `Ok(false)`. Unknown keys, read-only
    /// keys and unencodable values are programmer errors and fail loudly
    /// before any I/O.
    pub async fn write(&self, key: &str, value: f64) -> ModbusResult<bool> {
        let definition = self.catalog.get(key)?;
        if !definition.writable {
            return Err(ModbusError::invalid_data(format!(
                "Register '{key}' is read-only"
            )));
        }
        let raw = codec::encode_value(definition, value)?;

        let mut state = self.state.lock().await;

        // A dead connection from an earlier failure gets replaced here
        if state.write_client.as_ref().is_some_and(|client| !client.is_connected()) {
            state.write_client = None;
        }
        if state.write_client.is_none() {
            match self.connector.connect().await {
                Ok(transport) => state.write_client = Some(ParmairClient::new(transport)),
                Err(err) => {
                    warn!("Write connect to {} failed: {err}", self.peer);
                    return Ok(false);
                }
            }
        }
        let Some(client) = state.write_client.as_mut() else {
            return Ok(false);
        };

        match self.shim.write_single(client, definition.address, raw).await {
            Ok(()) => {
                sleep(WRITE_SETTLE).await;
                debug!("Wrote {key}={value} (raw {raw} at {})", definition.address);
                Ok(true)
            }
            Err(err) => {
                warn!("Write to '{key}' failed: {err}");
                if let Some(mut dead) = state.write_client.take() {
                    let _ = dead.close().await;
                }
                Ok(false)
            }
        }
    }

    async fn run_cycle(
        &self,
        state: &mut PollState<C::Transport>,
        client: &mut ParmairClient<C::Transport>,
    ) -> ModbusResult<HashMap<&'static str, f64>> {
        let jitter_ms = rand::thread_rng().gen_range(
            CONNECT_JITTER_MIN.as_millis() as u64..=CONNECT_JITTER_MAX.as_millis() as u64,
        );
        sleep(CONNECT_SETTLE + Duration::from_millis(jitter_ms)).await;

        self.warm_up(client).await;
        sleep(INTER_READ_DELAY).await;

        if !state.static_read {
            self.read_static(state, client).await;
            sleep(INTER_READ_DELAY).await;
        }

        let fresh = self.read_dynamic(client).await?;

        let mut merged = state.static_data.clone();
        merged.extend(fresh);
        if self.family() == FirmwareFamily::V2 {
            derive_v2_flags(&mut merged);
        }
        Ok(merged)
    }

    /// Read a known-always-present register to shake the device's server
    /// loop awake; failure is expected on some units and never fatal
    async fn warm_up(&self, client: &mut ParmairClient<C::Transport>) {
        for attempt in 1..=WARMUP_ATTEMPTS {
            match self.shim.read_block(client, WARMUP_REGISTER_ADDRESS, 1).await {
                Ok(_) => return,
                Err(err) => {
                    debug!("Warm-up read failed (attempt {attempt}/{WARMUP_ATTEMPTS}): {err}");
                }
            }
            if attempt < WARMUP_ATTEMPTS {
                sleep(SPAN_RETRY_DELAY).await;
            }
        }
    }

    async fn read_static(
        &self,
        state: &mut PollState<C::Transport>,
        client: &mut ParmairClient<C::Transport>,
    ) {
        let definitions: Vec<&'static RegisterDefinition> =
            self.catalog.static_definitions().collect();
        let addresses: Vec<u16> = definitions.iter().map(|d| d.address).collect();
        let spans = plan_read_spans(&addresses, MAX_READ_REGISTERS as u16);

        let (raw_by_address, failed) = self.read_spans(client, &spans).await;
        for definition in &definitions {
            if let Some(&raw) = raw_by_address.get(&definition.address) {
                if let Some(value) = codec::decode_value(definition, raw) {
                    state.static_data.insert(definition.key, value);
                }
            }
        }

        if failed.is_empty() {
            state.static_read = true;
            debug!("Static registers read ({} keys)", state.static_data.len());
        } else {
            warn!(
                "Static registers unavailable this cycle: {}; retrying next cycle",
                describe_failed(&definitions, &failed)
            );
        }
    }

    async fn read_dynamic(
        &self,
        client: &mut ParmairClient<C::Transport>,
    ) -> ModbusResult<HashMap<&'static str, f64>> {
        let definitions: Vec<&'static RegisterDefinition> = self.catalog.polled().collect();
        let addresses: Vec<u16> = definitions.iter().map(|d| d.address).collect();
        let spans = plan_read_spans(&addresses, MAX_READ_REGISTERS as u16);

        let (raw_by_address, failed) = self.read_spans(client, &spans).await;

        if !spans.is_empty() && failed.len() == spans.len() {
            return Err(ModbusError::update_failed("all register reads failed"));
        }
        if !failed.is_empty() {
            warn!(
                "Registers unavailable this cycle: {}",
                describe_failed(&definitions, &failed)
            );
        }

        let mut fresh = HashMap::new();
        for definition in &definitions {
            if let Some(&raw) = raw_by_address.get(&definition.address) {
                if let Some(value) = codec::decode_value(definition, raw) {
                    fresh.insert(definition.key, value);
                }
            }
        }
        debug!(
            "Dynamic read: {} keys from {} registers over {} spans",
            fresh.len(),
            total_registers(&spans),
            spans.len()
        );
        Ok(fresh)
    }

    /// Read every span, pausing between them; failed spans are collected,
    /// not escalated
    async fn read_spans(
        &self,
        client: &mut ParmairClient<C::Transport>,
        spans: &[ReadSpan],
    ) -> (HashMap<u16, u16>, Vec<ReadSpan>) {
        let mut raw_by_address = HashMap::new();
        let mut failed = Vec::new();

        for (index, span) in spans.iter().enumerate() {
            if index > 0 {
                sleep(INTER_READ_DELAY).await;
            }
            match self.read_span_with_retries(client, span).await {
                Some(words) => {
                    for (address, word) in span.addresses().zip(words) {
                        raw_by_address.insert(address, word);
                    }
                }
                None => failed.push(*span),
            }
        }

        (raw_by_address, failed)
    }

    async fn read_span_with_retries(
        &self,
        client: &mut ParmairClient<C::Transport>,
        span: &ReadSpan,
    ) -> Option<Vec<u16>> {
        // One initial read plus SPAN_RETRIES retries
        for attempt in 0..=SPAN_RETRIES {
            if attempt > 0 {
                sleep(SPAN_RETRY_DELAY).await;
            }
            match self.shim.read_block(client, span.start, span.count).await {
                Ok(words) => return Some(words),
                Err(err) => {
                    debug!(
                        "Span {span} read failed (attempt {}/{}): {err}",
                        attempt + 1,
                        SPAN_RETRIES + 1
                    );
                }
            }
        }
        None
    }
}

/// "LABEL(id)" list of the registers covered by failed spans
fn describe_failed(definitions: &[&'static RegisterDefinition], failed: &[ReadSpan]) -> String {
    let names: Vec<String> = definitions
        .iter()
        .filter(|definition| failed.iter().any(|span| span.contains(definition.address)))
        .map(|definition| definition.describe())
        .collect();
    names.join(", ")
}

/// V2 firmware folds the home/boost/overpressure flags into one
/// user-state word; expand them back into the flag keys v1 reads natively
fn derive_v2_flags(values: &mut HashMap<&'static str, f64>) {
    let Some(&control) = values.get("control_state") else {
        return;
    };
    let control = ControlStateV2::from(control as u16);
    let flag = |on: bool| if on { 1.0 } else { 0.0 };
    values.insert("home_state", flag(control == ControlStateV2::Home));
    values.insert("boost_state", flag(control == ControlStateV2::Boost));
    values.insert("overpressure_state", flag(control.creates_overpressure()));
}

// ============================================================================
// Tests
// ============================================================================
