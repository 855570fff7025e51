use std::time::Instant;

use async_trait::async_trait;
use serialport::SerialPort;
use thiserror::Error;
use tracing::warn;

use crate::config::LinkConfig;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("not connected")]
    NotConnected,
}

/// Transport to the device. No protocol knowledge lives here; callers get
/// raw bytes and typed failures. A `Connect` error is expected and common
/// (device unplugged, wrong port); an `Io` error means the handle is dead.
#[async_trait]
pub trait DeviceLink: Send {
    async fn connect(&mut self, port: &str) -> Result<(), LinkError>;

    /// Reads whatever the device has sent, up to one line. An empty result
    /// means nothing arrived within the read timeout and is not an error.
    async fn read(&mut self) -> Result<Vec<u8>, LinkError>;

    async fn write(&mut self, frame: &[u8]) -> Result<(), LinkError>;

    /// Releases the handle; safe to call when already closed.
    async fn close(&mut self);

    fn is_connected(&self) -> bool;
}

pub struct SerialLink {
    config: LinkConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    pub fn new(config: LinkConfig) -> Self {
        Self { config, port: None }
    }

    fn drain_line(port: &mut dyn SerialPort, deadline: Instant) -> Result<Vec<u8>, LinkError> {
        let mut buf = Vec::with_capacity(128);
        let mut chunk = [0_u8; 64];

        loop {
            match port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if chunk[..n].contains(&b'\n') {
                        break;
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::TimedOut => break,
                Err(err) => return Err(LinkError::Io(format!("serial read failed: {err}"))),
            }

            if Instant::now() >= deadline {
                break;
            }
        }

        Ok(buf)
    }
}

#[async_trait]
impl DeviceLink for SerialLink {
    async fn connect(&mut self, port: &str) -> Result<(), LinkError> {
        self.port = None;
        let opened = serialport::new(port, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|err| {
                LinkError::Connect(format!("failed to open serial port {port}: {err}"))
            })?;
        self.port = Some(opened);
        Ok(())
    }

    async fn read(&mut self) -> Result<Vec<u8>, LinkError> {
        let Some(port) = self.port.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        // The per-chunk timeout already bounds each read; the deadline keeps
        // a chatty device from pinning us here past one line's worth.
        let deadline = Instant::now() + self.config.read_timeout * 4;
        match Self::drain_line(port.as_mut(), deadline) {
            Ok(buf) => Ok(buf),
            Err(err) => {
                self.port = None;
                Err(err)
            }
        }
    }

    async fn write(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        let Some(port) = self.port.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        let result = port
            .write_all(frame)
            .and_then(|_| port.flush())
            .map_err(|err| LinkError::Io(format!("serial write failed: {err}")));

        if result.is_err() {
            self.port = None;
        }
        result
    }

    async fn close(&mut self) {
        if self.port.is_some() {
            warn!("closing serial link");
        }
        self.port = None;
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}
