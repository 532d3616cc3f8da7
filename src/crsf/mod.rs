//! # CRSF Link Module
//!
//! Implementation of the CRSF-style link protocol spoken by the RF module.
//!
//! This module handles:
//! - RC channels frame encoding (16 channels, 11-bit resolution)
//! - Additive mod-256 checksum calculation
//! - Reference frame decoding and validation

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod protocol;
