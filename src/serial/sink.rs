//! # Frame Sink
//!
//! Trait abstraction for the byte-stream output sink so the control loop
//! can be exercised against a mock in tests.
//!
//! The contract is deliberately small: a write either fails or succeeds and
//! does not block indefinitely. No acknowledgment is awaited and no
//! backpressure queue exists - a slow sink costs dropped or late frames,
//! never a stalled control loop.

use async_trait::async_trait;
use std::io;

/// Byte-stream output sink for encoded link frames.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one complete frame to the sink.
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Human-readable name of the sink (device path) for status logging.
    fn name(&self) -> &str;
}

/// Serial-port frame sink backed by `tokio_serial::SerialStream`.
pub struct SerialSink {
    port: tokio_serial::SerialStream,
    port_name: String,
}

impl SerialSink {
    /// Open a serial port as a frame sink
    ///
    /// Configures 8 data bits, no parity, one stop bit, no flow control.
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Line rate (e.g., 115200)
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RcBridgeError::Serial`] if the port cannot
    /// be opened.
    pub fn open(path: &str, baud_rate: u32) -> crate::error::Result<Self> {
        let port = open_port(path, baud_rate)?;

        Ok(Self {
            port,
            port_name: path.to_string(),
        })
    }
}

impl std::fmt::Debug for SerialSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSink")
            .field("port_name", &self.port_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FrameSink for SerialSink {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;

        self.port.write_all(frame).await?;
        self.port.flush().await
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// Open a serial port with the link's line settings.
pub(crate) fn open_port(
    path: &str,
    baud_rate: u32,
) -> crate::error::Result<tokio_serial::SerialStream> {
    use tokio_serial::SerialPortBuilderExt;

    tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| {
            crate::error::RcBridgeError::Serial(format!("Failed to open {}: {}", path, e))
        })
}
