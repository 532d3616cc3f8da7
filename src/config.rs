//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every previously hardcoded tuning value is exposed here: tick periods,
//! response rates, deadzones, channel codomain bounds, the reverse-trigger
//! axis and threshold, and the head-tracking source. Validation fails fast
//! on out-of-range values rather than clamping them - a bad rate is a setup
//! error, not something to paper over at runtime.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub sensor: SensorConfig,
    pub control: ControlConfig,
    pub head: HeadConfig,
    pub controller: ControllerConfig,
    pub channels: ChannelConfig,
}

/// CRSF output port configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub reconnect_interval_ms: u64,
}

/// Head-tracking sensor input port configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorConfig {
    pub port: String,
    pub baud_rate: u32,
    pub enabled: bool,
}

/// Control-loop timing and axis tuning
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlConfig {
    pub tick_period_ms: u64,
    pub status_interval_ms: u64,
    pub profile: Profile,
    pub steering_rate: f32,
    pub throttle_rate: f32,
    pub steering_deadzone: f32,
}

/// Head-tracking source and scaling
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HeadConfig {
    pub source: HeadSource,
    pub deadzone: f32,
    pub yaw_scale: f32,
    pub pitch_scale: f32,
}

/// Primary controller conventions
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerConfig {
    pub reverse_axis: usize,
    pub reverse_threshold: f32,
}

/// Channel codomain bounds
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChannelConfig {
    pub low: u16,
    pub high: u16,
}

/// Which device feeds head orientation.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeadSource {
    /// Serial sensor speaking the YAW:/PITCH: line protocol.
    Sensor,
    /// Secondary gamepad axes (right stick).
    Controller,
}

/// Driving profile presets.
///
/// `custom` uses the explicit rate/deadzone fields; the named presets
/// override them with fixed tunings.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Custom,
    Beginner,
    Sport,
    Race,
}

/// Resolved axis tuning after applying the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub steering_rate: f32,
    pub throttle_rate: f32,
    pub steering_deadzone: f32,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_sensor_port() -> String { "/dev/ttyACM1".to_string() }

fn default_tick_period_ms() -> u64 { 20 }
fn default_status_interval_ms() -> u64 { 200 }
fn default_rate() -> f32 { 0.2 }
fn default_steering_deadzone() -> f32 { 0.05 }

fn default_head_deadzone() -> f32 { 0.05 }
fn default_yaw_scale() -> f32 { -90.0 }
fn default_pitch_scale() -> f32 { -45.0 }

fn default_reverse_axis() -> usize { 4 }
fn default_reverse_threshold() -> f32 { 0.5 }

fn default_channel_low() -> u16 { 172 }
fn default_channel_high() -> u16 { 1811 }

const VALID_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115_200, 230_400, 420_000, 921_600];

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            sensor: SensorConfig::default(),
            control: ControlConfig::default(),
            head: HeadConfig::default(),
            controller: ControllerConfig::default(),
            channels: ChannelConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: default_sensor_port(),
            baud_rate: default_baud_rate(),
            enabled: true,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            status_interval_ms: default_status_interval_ms(),
            profile: Profile::default(),
            steering_rate: default_rate(),
            throttle_rate: default_rate(),
            steering_deadzone: default_steering_deadzone(),
        }
    }
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            source: HeadSource::Sensor,
            deadzone: default_head_deadzone(),
            yaw_scale: default_yaw_scale(),
            pitch_scale: default_pitch_scale(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reverse_axis: default_reverse_axis(),
            reverse_threshold: default_reverse_threshold(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            low: default_channel_low(),
            high: default_channel_high(),
        }
    }
}

impl ControlConfig {
    /// Resolves the effective axis tuning after applying the profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_bridge::config::{ControlConfig, Profile};
    ///
    /// let mut control = ControlConfig::default();
    /// control.profile = Profile::Race;
    ///
    /// let tuning = control.tuning();
    /// assert_eq!(tuning.steering_rate, 0.38);
    /// assert_eq!(tuning.steering_deadzone, 0.0);
    /// ```
    #[must_use]
    pub fn tuning(&self) -> Tuning {
        match self.profile {
            Profile::Custom => Tuning {
                steering_rate: self.steering_rate,
                throttle_rate: self.throttle_rate,
                steering_deadzone: self.steering_deadzone,
            },
            Profile::Beginner => Tuning {
                steering_rate: 0.12,
                throttle_rate: 0.12,
                steering_deadzone: 0.10,
            },
            Profile::Sport => Tuning {
                steering_rate: 0.25,
                throttle_rate: 0.25,
                steering_deadzone: 0.05,
            },
            Profile::Race => Tuning {
                steering_rate: 0.38,
                throttle_rate: 0.38,
                steering_deadzone: 0.0,
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("serial baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 420000, 921600")
            ));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("reconnect_interval_ms must be between 1 and 60000")
            ));
        }

        if self.sensor.enabled && self.sensor.port.is_empty() {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("sensor port cannot be empty when enabled")
            ));
        }

        if !VALID_BAUD_RATES.contains(&self.sensor.baud_rate) {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("sensor baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 420000, 921600")
            ));
        }

        if self.control.tick_period_ms == 0 || self.control.tick_period_ms > 1000 {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("tick_period_ms must be between 1 and 1000")
            ));
        }

        if self.control.status_interval_ms == 0 || self.control.status_interval_ms > 60000 {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("status_interval_ms must be between 1 and 60000")
            ));
        }

        let tuning = self.control.tuning();
        for (name, rate) in [
            ("steering_rate", tuning.steering_rate),
            ("throttle_rate", tuning.throttle_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(crate::error::RcBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be within (0.0, 1.0]", name))
                ));
            }
        }

        for (name, deadzone) in [
            ("steering_deadzone", tuning.steering_deadzone),
            ("head deadzone", self.head.deadzone),
        ] {
            if !(0.0..1.0).contains(&deadzone) {
                return Err(crate::error::RcBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be within [0.0, 1.0)", name))
                ));
            }
        }

        if !self.head.yaw_scale.is_finite()
            || self.head.yaw_scale == 0.0
            || self.head.yaw_scale.abs() > 180.0
        {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("yaw_scale must be non-zero with magnitude at most 180")
            ));
        }

        if !self.head.pitch_scale.is_finite()
            || self.head.pitch_scale == 0.0
            || self.head.pitch_scale.abs() > 45.0
        {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("pitch_scale must be non-zero with magnitude at most 45")
            ));
        }

        if self.controller.reverse_axis >= crate::input::gamepad::AXIS_SLOTS {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom(format!(
                    "reverse_axis must be between 0 and {}",
                    crate::input::gamepad::AXIS_SLOTS - 1
                ))
            ));
        }

        if !(self.controller.reverse_threshold > 0.0 && self.controller.reverse_threshold < 1.0) {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("reverse_threshold must be within (0.0, 1.0)")
            ));
        }

        if self.channels.low >= self.channels.high {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("channel low must be less than high")
            ));
        }

        if self.channels.high > 2047 {
            return Err(crate::error::RcBridgeError::Config(
                toml::de::Error::custom("channel high must be at most 2047 (11-bit)")
            ));
        }

        Ok(())
    }
}
