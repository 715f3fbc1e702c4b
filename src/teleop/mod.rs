//! # Teleop Module
//!
//! Gamepad-to-vehicle command mapping.
//!
//! This module handles:
//! - The input snapshot and outbound command layouts
//! - The input mapper state machine (depth/heading setpoints, control modes)
//! - The mapping pipeline that publishes commands and dispatches mode changes

pub mod command;
pub mod mapper;
pub mod node;
pub mod snapshot;
