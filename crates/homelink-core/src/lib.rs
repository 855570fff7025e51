pub mod codec;
pub mod config;
pub mod link;
pub mod readings;
pub mod state;
pub mod supervisor;
pub mod telemetry;

pub use config::{LinkConfig, SupervisorConfig};
pub use link::{DeviceLink, LinkError, SerialLink};
pub use readings::{HourlyAggregate, RawSample, ReadingStore, MAX_AGGREGATES};
pub use state::{
    DeviceStatus, JsonFileStore, MemoryStore, StateStore, StoreDocument, StoreError, ZoneColor,
};
pub use supervisor::Supervisor;
pub use telemetry::{TelemetryError, TelemetryFrame};

#[cfg(test)]
mod protocol_tests;
#[cfg(test)]
mod readings_tests;
