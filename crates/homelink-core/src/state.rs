use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connectivity/request indicator shared between the device loop and the
/// dashboard. The supervisor owns the Offline/Online transitions; external
/// actors only ever raise `UpdateRequested`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Offline,
    Online,
    #[serde(rename = "update")]
    UpdateRequested,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Offline => "offline",
            DeviceStatus::Online => "online",
            DeviceStatus::UpdateRequested => "update",
        };
        f.write_str(s)
    }
}

impl FromStr for DeviceStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offline" => Ok(DeviceStatus::Offline),
            "online" => Ok(DeviceStatus::Online),
            "update" => Ok(DeviceStatus::UpdateRequested),
            other => Err(StoreError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneColor {
    pub zone: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(String),
    #[error("store serialization error: {0}")]
    Serde(String),
    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

/// External persistence collaborator shared with the web layer. Every call
/// is individually atomic; callers never assume read-your-writes across
/// calls without re-fetching.
pub trait StateStore: Send + Sync {
    fn get_status(&self) -> Result<DeviceStatus, StoreError>;
    fn set_status(&self, status: DeviceStatus) -> Result<(), StoreError>;
    fn get_port(&self) -> Result<String, StoreError>;
    fn set_port(&self, port: &str) -> Result<(), StoreError>;
    fn get_zone_color(&self, zone: &str) -> Result<Option<ZoneColor>, StoreError>;
    fn set_zone_color(&self, zone: &str, red: u8, green: u8, blue: u8) -> Result<(), StoreError>;

    /// External-actor entry point: flags a pending color push, but never
    /// clobbers one already in flight.
    fn request_update(&self) -> Result<(), StoreError> {
        if self.get_status()? != DeviceStatus::UpdateRequested {
            self.set_status(DeviceStatus::UpdateRequested)?;
        }
        Ok(())
    }
}

/// Everything the store holds, also the on-disk JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    pub status: DeviceStatus,
    pub port: String,
    pub zones: Vec<ZoneColor>,
}

impl StoreDocument {
    /// Fresh document: device offline, all zones dark.
    pub fn seed(port: &str, zones: &[String]) -> Self {
        Self {
            status: DeviceStatus::Offline,
            port: port.to_string(),
            zones: zones
                .iter()
                .map(|zone| ZoneColor {
                    zone: zone.clone(),
                    red: 0,
                    green: 0,
                    blue: 0,
                })
                .collect(),
        }
    }

    fn set_zone(&mut self, zone: &str, red: u8, green: u8, blue: u8) {
        match self.zones.iter_mut().find(|z| z.zone == zone) {
            Some(existing) => {
                existing.red = red;
                existing.green = green;
                existing.blue = blue;
            }
            None => self.zones.push(ZoneColor {
                zone: zone.to_string(),
                red,
                green,
                blue,
            }),
        }
    }
}

/// In-process store. Per-call atomicity via the mutex.
pub struct MemoryStore {
    doc: Mutex<StoreDocument>,
}

impl MemoryStore {
    pub fn new(doc: StoreDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreDocument>, StoreError> {
        self.doc
            .lock()
            .map_err(|_| StoreError::Io("state store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStore {
    fn get_status(&self) -> Result<DeviceStatus, StoreError> {
        Ok(self.lock()?.status)
    }

    fn set_status(&self, status: DeviceStatus) -> Result<(), StoreError> {
        self.lock()?.status = status;
        Ok(())
    }

    fn get_port(&self) -> Result<String, StoreError> {
        Ok(self.lock()?.port.clone())
    }

    fn set_port(&self, port: &str) -> Result<(), StoreError> {
        self.lock()?.port = port.to_string();
        Ok(())
    }

    fn get_zone_color(&self, zone: &str) -> Result<Option<ZoneColor>, StoreError> {
        Ok(self.lock()?.zones.iter().find(|z| z.zone == zone).cloned())
    }

    fn set_zone_color(&self, zone: &str, red: u8, green: u8, blue: u8) -> Result<(), StoreError> {
        self.lock()?.set_zone(zone, red, green, blue);
        Ok(())
    }
}

/// Single JSON document on disk, shared with other processes. Writes go
/// through a temp file and an atomic rename, so readers always see a whole
/// document; the mutex serializes read-modify-write within this process.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates the store file with seed contents when missing.
    pub fn seed_if_missing(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(doc)
    }

    pub fn document(&self) -> Result<StoreDocument, StoreError> {
        self.load()
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        let bytes = fs::read(&self.path)
            .map_err(|err| StoreError::Io(format!("read {}: {err}", self.path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Serde(format!("parse {}: {err}", self.path.display())))
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|err| StoreError::Serde(err.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .map_err(|err| StoreError::Io(format!("write {}: {err}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|err| StoreError::Io(format!("rename into {}: {err}", self.path.display())))
    }

    fn update(&self, apply: impl FnOnce(&mut StoreDocument)) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Io("state store lock poisoned".to_string()))?;
        let mut doc = self.load()?;
        apply(&mut doc);
        self.save(&doc)
    }
}

impl StateStore for JsonFileStore {
    fn get_status(&self) -> Result<DeviceStatus, StoreError> {
        Ok(self.load()?.status)
    }

    fn set_status(&self, status: DeviceStatus) -> Result<(), StoreError> {
        self.update(|doc| doc.status = status)
    }

    fn get_port(&self) -> Result<String, StoreError> {
        Ok(self.load()?.port)
    }

    fn set_port(&self, port: &str) -> Result<(), StoreError> {
        self.update(|doc| doc.port = port.to_string())
    }

    fn get_zone_color(&self, zone: &str) -> Result<Option<ZoneColor>, StoreError> {
        Ok(self.load()?.zones.into_iter().find(|z| z.zone == zone))
    }

    fn set_zone_color(&self, zone: &str, red: u8, green: u8, blue: u8) -> Result<(), StoreError> {
        self.update(|doc| doc.set_zone(zone, red, green, blue))
    }
}
