use chrono::{DateTime, Timelike, Utc};
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::SupervisorConfig;
use crate::link::{DeviceLink, LinkError};
use crate::readings::ReadingStore;
use crate::state::{DeviceStatus, StateStore, ZoneColor};
use crate::telemetry::{self, TelemetryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Disconnected,
    Connected,
}

/// Owns the device link and drives the whole device-communication loop:
/// sub-minute polling for pending color pushes, a minute-boundary telemetry
/// checkpoint, the minute-59 hourly rollup, and opportunistic reconnects.
///
/// Every link/store/parse failure is caught here and mapped to a status
/// transition or a no-op; nothing escapes to the process level. One
/// supervisor task runs per process, for the lifetime of the process.
pub struct Supervisor<L: DeviceLink, S: StateStore> {
    link: L,
    store: S,
    readings: ReadingStore,
    config: SupervisorConfig,
    state: LinkState,
    port: String,
    pushes_ok: u64,
    reads_ok: u64,
    reads_err: u64,
    reconnects: u64,
    last_minute: Option<u32>,
}

impl<L: DeviceLink, S: StateStore> Supervisor<L, S> {
    pub fn new(link: L, store: S, config: SupervisorConfig) -> Self {
        Self {
            link,
            store,
            readings: ReadingStore::new(),
            config,
            state: LinkState::Disconnected,
            port: String::new(),
            pushes_ok: 0,
            reads_ok: 0,
            reads_err: 0,
            reconnects: 0,
            last_minute: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn readings(&self) -> &ReadingStore {
        &self.readings
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Startup: sweep stale readings, then the first connect attempt. A
    /// reachable device gets an immediate push so the strip matches the
    /// stored zone colors.
    pub async fn initialize(&mut self) {
        self.readings.startup_sweep(Utc::now());
        self.refresh_port();

        match self.link.connect(&self.port).await {
            Ok(()) => {
                self.state = LinkState::Connected;
                info!(port = %self.port, "device connected");
                self.publish_status(DeviceStatus::UpdateRequested);
            }
            Err(err) => {
                self.state = LinkState::Disconnected;
                warn!(port = %self.port, error = %err, "initial connect failed");
                self.publish_status(DeviceStatus::Offline);
            }
        }
    }

    /// Runs the cadence forever. A checkpoint fires when the wall-clock
    /// minute changes; every other tick is a poll for pending color pushes.
    pub async fn run(mut self) {
        self.initialize().await;
        self.last_minute = Some(Utc::now().minute());

        let mut ticker = interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let minute = now.minute();

            if self.last_minute != Some(minute) {
                self.last_minute = Some(minute);
                self.checkpoint(now).await;
                // Give the device time to react before the next poll.
                sleep(self.config.settle_delay).await;
            } else {
                self.poll_tick().await;
            }
        }
    }

    /// Sub-minute wake: delivers a pending color update, if any. A request
    /// seen while disconnected stays pending until the link comes back.
    pub async fn poll_tick(&mut self) {
        let pending = match self.store.get_status() {
            Ok(status) => status == DeviceStatus::UpdateRequested,
            Err(err) => {
                warn!(error = %err, "failed to read device status");
                false
            }
        };
        if !pending {
            return;
        }

        // Port changes ride in on the update flag; re-read it even when the
        // push itself is deferred.
        self.refresh_port();

        if self.state != LinkState::Connected {
            debug!("color update pending while disconnected, deferred");
            return;
        }

        match self.push_colors().await {
            Ok(()) => {
                self.pushes_ok += 1;
                info!(pushes_ok = self.pushes_ok, "zone colors pushed");
                self.publish_status(DeviceStatus::Online);
            }
            Err(err) => {
                warn!(error = %err, "color push failed");
                self.drop_link().await;
            }
        }
    }

    /// Minute-boundary work: one telemetry read when connected, otherwise a
    /// reconnect attempt; the minute-59 checkpoint also rolls the hour up.
    pub async fn checkpoint(&mut self, now: DateTime<Utc>) {
        if self.state == LinkState::Connected {
            self.ingest_telemetry(now).await;
        } else {
            self.publish_status(DeviceStatus::Offline);
            self.try_reconnect().await;
        }

        if now.minute() == 59 {
            if let Some(aggregate) = self.readings.rollup_hour(now) {
                info!(value = aggregate.value, "hourly rollup");
                self.readings.insert_aggregate(aggregate);
                self.readings.prune_aggregates();
            }
        }

        debug!(
            reads_ok = self.reads_ok,
            reads_err = self.reads_err,
            reconnects = self.reconnects,
            connected = self.is_connected(),
            "checkpoint complete"
        );
    }

    async fn ingest_telemetry(&mut self, now: DateTime<Utc>) {
        match self.link.read().await {
            Ok(bytes) if bytes.is_empty() => {
                debug!("no telemetry this cycle");
            }
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let line = text.trim_end_matches(['\r', '\n']);
                match telemetry::parse_line(line) {
                    Ok(frame) => {
                        self.reads_ok += 1;
                        self.readings.record_raw(frame.value, now);
                        self.publish_status(DeviceStatus::Online);
                        debug!(value = frame.value, "temperature recorded");
                    }
                    Err(TelemetryError::NotTelemetry) => {
                        debug!(line = %line, "ignoring non-telemetry line");
                    }
                    Err(err) => {
                        warn!(line = %line, error = %err, "dropping malformed telemetry");
                    }
                }
            }
            Err(err) => {
                self.reads_err += 1;
                warn!(error = %err, "telemetry read failed");
                self.drop_link().await;
            }
        }
    }

    async fn push_colors(&mut self) -> Result<(), LinkError> {
        let zones = self.zone_colors();
        let frames = codec::encode(&zones);
        for (frame, (color, _)) in frames.iter().zip(&zones) {
            self.link.write(frame.as_bytes()).await?;
            debug!(zone = %color.zone, frame = %frame, "zone frame sent");
        }
        Ok(())
    }

    fn zone_colors(&self) -> Vec<(ZoneColor, usize)> {
        let mut zones = Vec::with_capacity(self.config.zones.len());
        for (index, name) in self.config.zones.iter().enumerate() {
            match self.store.get_zone_color(name) {
                Ok(Some(color)) => zones.push((color, index)),
                Ok(None) => warn!(zone = %name, "zone missing from store, skipped"),
                Err(err) => warn!(zone = %name, error = %err, "failed to read zone color"),
            }
        }
        zones
    }

    /// One reconnect attempt per checkpoint, with the last-read port.
    async fn try_reconnect(&mut self) {
        match self.link.connect(&self.port).await {
            Ok(()) => {
                self.reconnects += 1;
                self.state = LinkState::Connected;
                info!(port = %self.port, reconnects = self.reconnects, "device reconnected");
            }
            Err(err) => {
                debug!(port = %self.port, error = %err, "reconnect failed");
            }
        }
    }

    async fn drop_link(&mut self) {
        self.link.close().await;
        self.state = LinkState::Disconnected;
        self.publish_status(DeviceStatus::Offline);
    }

    fn refresh_port(&mut self) {
        match self.store.get_port() {
            Ok(port) => self.port = port,
            Err(err) => warn!(error = %err, "failed to read device port"),
        }
    }

    fn publish_status(&self, status: DeviceStatus) {
        debug!(status = %status, "publishing device status");
        if let Err(err) = self.store.set_status(status) {
            warn!(error = %err, "failed to publish device status");
        }
    }
}
