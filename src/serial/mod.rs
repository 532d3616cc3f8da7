//! # Serial Communication Module
//!
//! Serial transport at both ends of the bridge:
//!
//! - [`sink`]: the CRSF output toward the RF transmitter module
//! - [`SensorLink`]: the head-tracking sensor input stream
//!
//! Both sides are non-blocking from the control loop's perspective. The
//! sink write is fire-and-forget per tick; the sensor link drains whatever
//! bytes a background reader task has forwarded since the last tick and
//! never awaits.

pub mod sink;

pub use sink::{FrameSink, SerialSink};

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{RcBridgeError, Result};

/// Read buffer size for the sensor reader task.
const SENSOR_READ_BUF: usize = 512;

/// Head-tracking sensor input link.
///
/// A spawned reader task pulls bytes off the serial port and forwards them
/// over an unbounded channel; [`SensorLink::read_available`] drains the
/// channel without awaiting. When the port errors or hits EOF the task
/// ends, which the next drain reports as a dead link - the caller then
/// drops the handle, freezing orientation at its last value.
#[derive(Debug)]
pub struct SensorLink {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    reader: JoinHandle<()>,
    port_name: String,
}

impl SensorLink {
    /// Open a sensor link on the given serial port
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyACM1")
    /// * `baud_rate` - Line rate (e.g., 115200)
    ///
    /// # Errors
    ///
    /// Returns [`RcBridgeError::Serial`] if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let mut port = sink::open_port(path, baud_rate)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let task_path = path.to_string();

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; SENSOR_READ_BUF];
            loop {
                match port.read(&mut buf).await {
                    Ok(0) => {
                        debug!("Sensor port {} reached EOF", task_path);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            // Link handle dropped; stop reading
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Sensor port {} read failed: {}", task_path, e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            rx,
            reader,
            port_name: path.to_string(),
        })
    }

    /// Drain all bytes received since the last tick, without blocking
    ///
    /// Returns an empty vec when nothing arrived this tick.
    ///
    /// # Errors
    ///
    /// Returns [`RcBridgeError::Sensor`] once the reader task has ended and
    /// every pending byte has been drained; the link is dead and should be
    /// dropped.
    pub fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();

        loop {
            match self.rx.try_recv() {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(bytes),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if bytes.is_empty() {
                        return Err(RcBridgeError::Sensor(format!(
                            "sensor link {} closed",
                            self.port_name
                        )));
                    }
                    // Deliver the tail first; the next tick reports the loss
                    return Ok(bytes);
                }
            }
        }
    }

    /// The device path this link was opened on.
    #[must_use]
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Stops the reader task and closes the port.
    pub fn close(self) {
        self.reader.abort();
    }

    /// Builds a link directly from a channel, bypassing the serial port.
    #[cfg(test)]
    pub(crate) fn from_channel(
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
        reader: JoinHandle<()>,
        port_name: &str,
    ) -> Self {
        Self {
            rx,
            reader,
            port_name: port_name.to_string(),
        }
    }
}

impl Drop for SensorLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
