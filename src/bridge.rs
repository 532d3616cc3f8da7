//! # Bridge Control Loop
//!
//! The state machine that turns operator input into transmitted frames.
//!
//! One [`Bridge::tick`] runs the whole pipeline on the fast cadence:
//! sample inputs, shape and normalize, map to channels, encode, write to
//! the sink. A global pause flag suspends only the final write - everything
//! upstream keeps computing so status output stays live.
//!
//! Every device is held as `Option<handle>`: `Some` is connected, `None`
//! is absent, and each consumer matches both arms. Read or write failure
//! detaches the handle (with a warning) and the loop keeps ticking on
//! neutral or frozen values; [`Bridge::rediscover`] reattaches devices on
//! its own slower cadence. The loop itself has no fatal path - only an
//! explicit shutdown stops it.
//!
//! Calibrate and pause commands arrive through gamepad button edges, read
//! on the loop task itself, so they always apply between ticks and a tick
//! never sees a half-applied calibration.

use tracing::{debug, info, warn};

use crate::config::{Config, HeadSource};
use crate::control::mapper::{ChannelMapper, PilotInputs};
use crate::control::orientation::Orientation;
use crate::control::shaper::AxisShaper;
use crate::crsf::encoder::encode_rc_channels_frame;
use crate::error::Result;
use crate::input::gamepad::{Gamepad, GamepadSnapshot, AXIS_HEAD_X, AXIS_HEAD_Y, AXIS_STEERING, AXIS_THROTTLE};
use crate::input::head::{secondary_axes_pose, LineParser};
use crate::serial::sink::FrameSink;
use crate::serial::{SensorLink, SerialSink};

/// Snapshot of loop state for status logging (the slow tick).
#[derive(Debug, Clone)]
pub struct BridgeStatus {
    pub steering: f32,
    pub throttle: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub reverse: bool,
    pub paused: bool,
    pub controller: Option<String>,
    pub sink: Option<String>,
    pub sensor: Option<String>,
    pub frames_sent: u64,
}

/// The control-loop state machine.
///
/// Owns every piece of per-session state: axis shapers, orientation,
/// device handles, the pause flag. All mutation happens from the loop
/// task - `tick`, `rediscover`, and the command methods are never called
/// concurrently.
pub struct Bridge {
    config: Config,
    steering: AxisShaper,
    throttle: AxisShaper,
    orientation: Orientation,
    mapper: ChannelMapper,
    parser: LineParser,

    gamepad: Option<Gamepad>,
    sensor: Option<SensorLink>,
    sink: Option<Box<dyn FrameSink>>,

    paused: bool,
    reverse_active: bool,
    frames_sent: u64,

    prev_share: bool,
    prev_options: bool,
}

impl Bridge {
    /// Builds a bridge from a validated configuration.
    ///
    /// No devices are opened here; call [`Bridge::rediscover`] to attach
    /// whatever is present.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the resolved tuning is out of
    /// range (the shapers fail fast on bad rates/deadzones).
    pub fn new(config: Config) -> Result<Self> {
        let tuning = config.control.tuning();
        let steering = AxisShaper::new(tuning.steering_rate, tuning.steering_deadzone)?;
        // Throttle is smoothed but never deadzoned
        let throttle = AxisShaper::new(tuning.throttle_rate, 0.0)?;
        let mapper = ChannelMapper::new(
            config.channels.low,
            config.channels.high,
            config.controller.reverse_threshold,
        );

        Ok(Self {
            config,
            steering,
            throttle,
            orientation: Orientation::new(),
            mapper,
            parser: LineParser::new(),
            gamepad: None,
            sensor: None,
            sink: None,
            paused: false,
            reverse_active: false,
            frames_sent: 0,
            prev_share: false,
            prev_options: false,
        })
    }

    /// Runs one fast-cadence tick of the pipeline.
    ///
    /// Never fails: device errors detach the device and the tick completes
    /// on neutral/frozen values.
    pub async fn tick(&mut self) {
        let snapshot = self.poll_gamepad();
        self.apply_button_commands(&snapshot);

        // Primary axes; neutral when no controller is present. Trigger
        // slots only count when the device actually has them, so a missing
        // trigger reads as released rather than mid-travel.
        let (raw_steer, raw_throttle, raw_secondary) = match &snapshot {
            Some(s) => (
                s.axis(AXIS_STEERING),
                trigger_value(s, AXIS_THROTTLE),
                trigger_value(s, self.config.controller.reverse_axis),
            ),
            None => (0.0, 0.0, 0.0),
        };

        let steering = self.steering.shape(raw_steer);
        let throttle = self.throttle.shape(raw_throttle);

        self.update_orientation(&snapshot);
        let (yaw, pitch) = self.orientation.normalized();

        self.reverse_active = self.mapper.reverse_active(raw_secondary);

        let channels = self.mapper.build(&PilotInputs {
            steering,
            throttle,
            yaw,
            pitch,
            reverse_trigger: raw_secondary,
        });
        let frame = encode_rc_channels_frame(&channels);

        if self.paused {
            return;
        }

        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.write_frame(&frame).await {
                warn!("Output sink {} write failed, detaching: {}", sink.name(), e);
                self.sink = None;
            } else {
                self.frames_sent += 1;
            }
        }
    }

    /// Polls the controller, detaching it on failure.
    fn poll_gamepad(&mut self) -> Option<GamepadSnapshot> {
        let pad = self.gamepad.as_mut()?;
        match pad.poll() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Controller lost: {}", e);
                self.gamepad = None;
                None
            }
        }
    }

    /// Applies calibrate/pause on button press edges.
    fn apply_button_commands(&mut self, snapshot: &Option<GamepadSnapshot>) {
        let (share, options) = match snapshot {
            Some(s) => (s.btn_share, s.btn_options),
            None => (false, false),
        };

        if share && !self.prev_share {
            self.calibrate();
        }
        if options && !self.prev_options {
            self.toggle_pause();
        }

        self.prev_share = share;
        self.prev_options = options;
    }

    /// Feeds the orientation state from the selected head source.
    ///
    /// When the source is absent or errors, the raw readings stay frozen
    /// at their last values.
    fn update_orientation(&mut self, snapshot: &Option<GamepadSnapshot>) {
        match self.config.head.source {
            HeadSource::Sensor => {
                let Some(sensor) = self.sensor.as_mut() else {
                    return;
                };

                match sensor.read_available() {
                    Ok(bytes) => {
                        for reading in self.parser.push_bytes(&bytes) {
                            if let Some(yaw) = reading.yaw {
                                self.orientation.set_yaw(yaw);
                            }
                            if let Some(pitch) = reading.pitch {
                                self.orientation.set_pitch(pitch);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Head sensor lost: {}", e);
                        self.sensor = None;
                        self.parser.reset();
                    }
                }
            }
            HeadSource::Controller => {
                let Some(s) = snapshot else {
                    return;
                };

                let (yaw, pitch) = secondary_axes_pose(
                    s.axis(AXIS_HEAD_X),
                    s.axis(AXIS_HEAD_Y),
                    self.config.head.deadzone,
                    self.config.head.yaw_scale,
                    self.config.head.pitch_scale,
                );
                self.orientation.set_yaw(yaw);
                self.orientation.set_pitch(pitch);
            }
        }
    }

    /// Attempts to attach any configured device that is currently absent.
    ///
    /// Runs on the reconnect cadence, well below the tick rate. Handles are
    /// swapped in whole; a tick sees either the old device or the new one,
    /// never a half-open state.
    pub fn rediscover(&mut self) {
        if self.gamepad.is_none() {
            match Gamepad::open() {
                Ok(pad) => self.gamepad = Some(pad),
                Err(e) => debug!("Controller discovery: {}", e),
            }
        }

        if self.sink.is_none() {
            match SerialSink::open(&self.config.serial.port, self.config.serial.baud_rate) {
                Ok(sink) => {
                    info!("Output connected: {}", sink.name());
                    self.sink = Some(Box::new(sink));
                }
                Err(e) => debug!("Output discovery: {}", e),
            }
        }

        if self.sensor.is_none()
            && self.config.sensor.enabled
            && self.config.head.source == HeadSource::Sensor
        {
            match SensorLink::open(&self.config.sensor.port, self.config.sensor.baud_rate) {
                Ok(link) => {
                    info!("Head-tracking input connected: {}", link.port_name());
                    self.parser.reset();
                    self.sensor = Some(link);
                }
                Err(e) => debug!("Sensor discovery: {}", e),
            }
        }
    }

    /// Zeroes the head orientation at its current reading.
    pub fn calibrate(&mut self) {
        self.orientation.calibrate();
        info!("Head calibrated");
    }

    /// Toggles frame transmission; upstream computation is unaffected.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(
            "{}",
            if self.paused { "Sending paused" } else { "Sending active" }
        );
    }

    /// True while transmission is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Attaches an output sink, replacing any current one.
    pub fn attach_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = Some(sink);
    }

    /// Attaches a sensor link, replacing any current one.
    pub fn attach_sensor(&mut self, sensor: SensorLink) {
        self.parser.reset();
        self.sensor = Some(sensor);
    }

    /// Current loop state for the slow status tick.
    #[must_use]
    pub fn status(&self) -> BridgeStatus {
        let (yaw, pitch) = self.orientation.normalized();
        BridgeStatus {
            steering: self.steering.value(),
            throttle: self.throttle.value(),
            yaw,
            pitch,
            reverse: self.reverse_active,
            paused: self.paused,
            controller: self
                .gamepad
                .as_ref()
                .map(|p| p.name().unwrap_or("controller").to_string()),
            sink: self.sink.as_ref().map(|s| s.name().to_string()),
            sensor: self.sensor.as_ref().map(|s| s.port_name().to_string()),
            frames_sent: self.frames_sent,
        }
    }

    /// Total frames written to the sink this session.
    #[must_use]
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Closes every open device. The loop must not tick afterwards.
    pub fn shutdown(&mut self) {
        if let Some(sensor) = self.sensor.take() {
            sensor.close();
        }
        self.sink = None;
        self.gamepad = None;
        info!("Bridge shut down after {} frames", self.frames_sent);
    }
}

/// Rescales a trigger axis from [-1, 1] to [0, 1].
///
/// Triggers rest at -1 when released, so rest maps to 0.
#[inline]
fn rescale_trigger(raw: f32) -> f32 {
    (raw + 1.0) / 2.0
}

/// Reads a trigger slot, treating an absent axis as released.
#[inline]
fn trigger_value(snapshot: &GamepadSnapshot, slot: usize) -> f32 {
    if snapshot.has_axis(slot) {
        rescale_trigger(snapshot.axis(slot))
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::decoder::decode_rc_channels_frame;
    use crate::serial::sink::mocks::MockFrameSink;
    use tokio::sync::mpsc;

    fn test_bridge() -> Bridge {
        let mut config = Config::default();
        config.sensor.enabled = false;
        Bridge::new(config).unwrap()
    }

    #[test]
    fn test_rescale_trigger() {
        assert_eq!(rescale_trigger(-1.0), 0.0);
        assert_eq!(rescale_trigger(1.0), 1.0);
        assert_eq!(rescale_trigger(0.0), 0.5);
    }

    #[test]
    fn test_trigger_value_absent_axis_reads_released() {
        use crate::input::gamepad::{GamepadSnapshot, AXIS_THROTTLE};

        // Axis value is whatever, but the device does not expose the slot
        let mut snapshot = GamepadSnapshot::default();
        snapshot.axes[AXIS_THROTTLE] = 0.0;
        assert_eq!(trigger_value(&snapshot, AXIS_THROTTLE), 0.0);

        snapshot.present[AXIS_THROTTLE] = true;
        assert_eq!(trigger_value(&snapshot, AXIS_THROTTLE), 0.5);
    }

    #[test]
    fn test_new_rejects_bad_tuning() {
        let mut config = Config::default();
        config.control.steering_rate = 0.0;
        assert!(Bridge::new(config).is_err());
    }

    #[tokio::test]
    async fn test_tick_without_devices_does_not_panic() {
        let mut bridge = test_bridge();
        for _ in 0..5 {
            bridge.tick().await;
        }
        assert_eq!(bridge.frames_sent(), 0);
    }

    #[tokio::test]
    async fn test_tick_writes_neutral_frame() {
        let mut bridge = test_bridge();
        let mock = MockFrameSink::new();
        bridge.attach_sink(Box::new(mock.clone()));

        bridge.tick().await;

        let frames = mock.written_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(bridge.frames_sent(), 1);

        // No controller: steer 0 -> 991, throttle 0 -> 172, head 0 -> 991,
        // trigger 0 -> 172, everything else neutral
        let channels = decode_rc_channels_frame(&frames[0]).unwrap();
        assert_eq!(&channels[..5], &[991, 172, 991, 991, 172]);
        for ch in &channels[5..] {
            assert_eq!(*ch, 1024);
        }
    }

    #[tokio::test]
    async fn test_pause_gates_transmission_only() {
        let mut bridge = test_bridge();
        let mock = MockFrameSink::new();
        bridge.attach_sink(Box::new(mock.clone()));

        bridge.toggle_pause();
        assert!(bridge.is_paused());

        bridge.tick().await;
        bridge.tick().await;
        assert!(mock.written_frames().is_empty());
        assert_eq!(bridge.frames_sent(), 0);

        bridge.toggle_pause();
        bridge.tick().await;
        assert_eq!(mock.written_frames().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_detaches_without_crashing() {
        let mut bridge = test_bridge();
        let mock = MockFrameSink::new();
        mock.set_write_error(std::io::ErrorKind::BrokenPipe);
        bridge.attach_sink(Box::new(mock.clone()));

        bridge.tick().await;
        assert!(bridge.status().sink.is_none());

        // Subsequent ticks simply skip transmission
        bridge.tick().await;
        assert_eq!(bridge.frames_sent(), 0);
    }

    #[tokio::test]
    async fn test_sensor_feeds_orientation() {
        let mut config = Config::default();
        config.sensor.enabled = true;
        let mut bridge = Bridge::new(config).unwrap();

        let mock = MockFrameSink::new();
        bridge.attach_sink(Box::new(mock.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        bridge.attach_sensor(SensorLink::from_channel(rx, tokio::spawn(async {}), "test"));

        tx.send(b"YAW:45.0,PITCH:-10.0\n".to_vec()).unwrap();
        bridge.tick().await;

        let status = bridge.status();
        assert_eq!(status.yaw, 45.0);
        assert_eq!(status.pitch, -10.0);

        // Head channels carry the mapped orientation
        let channels = decode_rc_channels_frame(&mock.written_frames()[0]).unwrap();
        assert_eq!(channels[2], 1196); // 172 + 225/360 * 1639 = 1196.375
        assert_eq!(channels[3], 809); // 172 + 35/90 * 1639 = 809.39
    }

    #[tokio::test]
    async fn test_malformed_sensor_line_freezes_values() {
        let mut config = Config::default();
        config.sensor.enabled = true;
        let mut bridge = Bridge::new(config).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        bridge.attach_sensor(SensorLink::from_channel(rx, tokio::spawn(async {}), "test"));

        tx.send(b"YAW:45.0,PITCH:-10.0\n".to_vec()).unwrap();
        bridge.tick().await;
        tx.send(b"YAW:abc\n".to_vec()).unwrap();
        bridge.tick().await;

        let status = bridge.status();
        assert_eq!(status.yaw, 45.0);
        assert_eq!(status.pitch, -10.0);
    }

    #[tokio::test]
    async fn test_dead_sensor_link_detaches_and_freezes() {
        let mut config = Config::default();
        config.sensor.enabled = true;
        let mut bridge = Bridge::new(config).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        bridge.attach_sensor(SensorLink::from_channel(rx, tokio::spawn(async {}), "test"));

        tx.send(b"YAW:30.0\n".to_vec()).unwrap();
        drop(tx);

        bridge.tick().await; // delivers the tail
        bridge.tick().await; // reports the dead link, detaches

        let status = bridge.status();
        assert!(status.sensor.is_none());
        assert_eq!(status.yaw, 30.0); // frozen, not zeroed
    }

    #[tokio::test]
    async fn test_calibrate_zeroes_orientation() {
        let mut config = Config::default();
        config.sensor.enabled = true;
        let mut bridge = Bridge::new(config).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        bridge.attach_sensor(SensorLink::from_channel(rx, tokio::spawn(async {}), "test"));

        tx.send(b"YAW:20.0,PITCH:5.0\n".to_vec()).unwrap();
        bridge.tick().await;
        bridge.calibrate();

        let status = bridge.status();
        assert_eq!((status.yaw, status.pitch), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_shutdown_closes_devices() {
        let mut bridge = test_bridge();
        bridge.attach_sink(Box::new(MockFrameSink::new()));
        bridge.shutdown();

        let status = bridge.status();
        assert!(status.sink.is_none());
        assert!(status.sensor.is_none());
        assert!(status.controller.is_none());
    }
}
