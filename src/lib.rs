//! # RC Bridge Library
//!
//! Drive an RC vehicle with a game controller and head tracker via CRSF.
//!
//! This library provides the control-loop core that turns live operator
//! inputs (gamepad axes and/or a serial head-orientation sensor) into a
//! continuous stream of CRSF-style RC channel frames for an RF transmitter
//! module. Any front end - the bundled daemon, a GUI, a test harness - can
//! drive it.

pub mod bridge;
pub mod config;
pub mod control;
pub mod crsf;
pub mod error;
pub mod input;
pub mod serial;
