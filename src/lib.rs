//! # FX10 Teleop Library
//!
//! Teleoperate an underwater vehicle with a Logitech gamepad.
//!
//! This library provides the core functionality for turning gamepad input
//! into pose/twist teleoperation commands and control-mode requests for the
//! vehicle's control subsystem.

pub mod config;
pub mod controller;
pub mod error;
pub mod publisher;
pub mod services;
pub mod teleop;
