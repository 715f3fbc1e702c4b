//! # Controller Module
//!
//! Logitech gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Reading stick, trigger, d-pad and button events
//! - Assembling normalized input snapshots for the teleop mapper

pub mod device;
pub mod events;
