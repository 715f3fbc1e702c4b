//! # Input Mapper Module
//!
//! Turns gamepad snapshots into teleoperation commands and mode-change
//! requests.
//!
//! ## Control Layout
//!
//! | Input | Effect |
//! |-------|--------|
//! | Cross down / up | Step depth setpoint (pose Z) by ±0.05, saturating at ±1 |
//! | Cross right / left | Step heading setpoint (pose yaw) by ±0.05, wrapping at ±1 |
//! | Right stick | Surge (U) and sway (V) rates |
//! | Left stick | Heave (W) and yaw (R) rates |
//! | A | Depth in position, reset depth setpoint |
//! | Y | Depth in velocity, pitch to automatic |
//! | B | Yaw in position, reset heading setpoint |
//! | X | Yaw in velocity |
//! | Start / Back | Enable / disable station keeping |
//! | LT + LB | Manual pitch (depth position mode only) |
//! | RT + RB | Automatic pitch (depth position mode only) |
//! | LT + RT | Disable thrusters |
//! | LB + RB | Enable thrusters |
//!
//! ## Usage
//!
//! ```
//! use fx10_teleop::teleop::command::channels;
//! use fx10_teleop::teleop::mapper::InputMapper;
//! use fx10_teleop::teleop::snapshot::{axes, InputSnapshot};
//!
//! let mut mapper = InputMapper::new();
//! let mut snapshot = InputSnapshot::neutral();
//! snapshot.axes[axes::CROSS_VERTICAL] = axes::MOVE_DOWN;
//!
//! let (command, requests) = mapper.map(&snapshot);
//! assert!((command.axes[channels::POSE_Z] - 0.05).abs() < 1e-6);
//! assert!(requests.is_empty());
//! ```

use tracing::info;

use super::command::{channels, OutboundCommand, SideEffectRequest};
use super::snapshot::{axes, buttons, InputSnapshot};

/// Default accumulator increment per d-pad snapshot.
pub const DEFAULT_ACCUMULATOR_STEP: f64 = 0.05;

/// Default trigger level a trigger must drop below to count as pulled.
pub const DEFAULT_TRIGGER_THRESHOLD: f32 = -0.9;

/// Accumulator bound (both signs).
pub const ACCUMULATOR_LIMIT: f64 = 1.0;

/// Accumulators are rounded to 1 / this after every step.
const ACCUMULATOR_SCALE: f64 = 1e6;

/// Session state carried between mapping calls.
///
/// # Examples
///
/// ```
/// use fx10_teleop::teleop::mapper::MapperState;
///
/// let state = MapperState::default();
/// assert_eq!(state.vertical_accum, 0.0);
/// assert!(!state.depth_position_mode);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapperState {
    /// Depth setpoint in [-1, 1]. Saturates at the bounds.
    pub vertical_accum: f64,
    /// Heading setpoint in [-1, 1]. Wraps to the opposite bound.
    pub yaw_accum: f64,
    /// Depth is commanded as a position when true, as a rate when false.
    pub depth_position_mode: bool,
}

/// Tunables for [`map`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperSettings {
    pub accumulator_step: f64,
    pub trigger_threshold: f32,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            accumulator_step: DEFAULT_ACCUMULATOR_STEP,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
        }
    }
}

/// Maps one snapshot, updating `state` in place.
///
/// Steps run in a fixed order because later ones read selectors and flags
/// written by earlier ones in the same call. Requests are returned in the
/// order they were raised.
pub fn map(
    snapshot: &InputSnapshot,
    state: &mut MapperState,
    settings: &MapperSettings,
) -> (OutboundCommand, Vec<SideEffectRequest>) {
    let mut command = OutboundCommand {
        header: snapshot.header,
        ..OutboundCommand::default()
    };
    let mut requests = Vec::new();

    // Pitch selectors are only re-derived below
    command.buttons[channels::POSE_PITCH] = false;
    command.buttons[channels::TWIST_Q] = false;

    step_vertical(snapshot.axis(axes::CROSS_VERTICAL), state, settings.accumulator_step);
    step_yaw(snapshot.axis(axes::CROSS_HORIZONTAL), state, settings.accumulator_step);

    command.axes[channels::POSE_Z] = state.vertical_accum as f32;
    command.axes[channels::POSE_YAW] = state.yaw_accum as f32;
    command.axes[channels::TWIST_U] = snapshot.axis(axes::RIGHT_JOY_VERTICAL);
    command.axes[channels::TWIST_V] = -snapshot.axis(axes::RIGHT_JOY_HORIZONTAL);
    command.axes[channels::TWIST_W] = snapshot.axis(axes::LEFT_JOY_VERTICAL);
    command.axes[channels::TWIST_R] = -snapshot.axis(axes::LEFT_JOY_HORIZONTAL);

    // Depth: position (A) or velocity (Y)
    command.buttons[channels::POSE_Z] = snapshot.pressed(buttons::A);
    command.buttons[channels::TWIST_W] = snapshot.pressed(buttons::Y);
    if snapshot.pressed(buttons::A) {
        state.vertical_accum = 0.0;
        state.depth_position_mode = true;
        info!("Reset depth setpoint, depth in position mode");
    }
    if snapshot.pressed(buttons::Y) {
        state.depth_position_mode = false;
        command.buttons[channels::POSE_PITCH] = false;
        command.buttons[channels::TWIST_Q] = true;
    }

    // Yaw: position (B) or velocity (X)
    command.buttons[channels::POSE_YAW] = snapshot.pressed(buttons::B);
    command.buttons[channels::TWIST_R] = snapshot.pressed(buttons::X);
    if snapshot.pressed(buttons::B) {
        state.yaw_accum = 0.0;
        info!("Reset heading setpoint");
    }

    if snapshot.pressed(buttons::START) {
        info!("Start keep position");
        requests.push(SideEffectRequest::EnableStationKeeping);
    }
    if snapshot.pressed(buttons::BACK) {
        info!("Stop keep position");
        requests.push(SideEffectRequest::DisableStationKeeping);
    }

    let left_pulled = snapshot.axis(axes::LEFT_TRIGGER) < settings.trigger_threshold;
    let right_pulled = snapshot.axis(axes::RIGHT_TRIGGER) < settings.trigger_threshold;

    if state.depth_position_mode {
        if left_pulled && snapshot.pressed(buttons::LEFT) {
            command.buttons[channels::POSE_PITCH] = true;
            command.buttons[channels::TWIST_Q] = false;
            info!("Set pitch mode to manual");
        }
        if right_pulled && snapshot.pressed(buttons::RIGHT) {
            command.buttons[channels::POSE_PITCH] = false;
            command.buttons[channels::TWIST_Q] = true;
            info!("Set pitch mode to automatic");
        }
    }

    if left_pulled && right_pulled {
        info!("DISABLE THRUSTERS!");
        requests.push(SideEffectRequest::DisableThrusters);
    }

    if snapshot.pressed(buttons::LEFT) && snapshot.pressed(buttons::RIGHT) {
        info!("ENABLE THRUSTERS!");
        requests.push(SideEffectRequest::EnableThrusters);
    }

    (command, requests)
}

/// D-pad down raises the depth setpoint, up lowers it. Saturates.
fn step_vertical(cross: f32, state: &mut MapperState, step: f64) {
    if cross == axes::MOVE_DOWN {
        state.vertical_accum = quantize(state.vertical_accum + step).min(ACCUMULATOR_LIMIT);
    } else if cross == axes::MOVE_UP {
        state.vertical_accum = quantize(state.vertical_accum - step).max(-ACCUMULATOR_LIMIT);
    }
}

/// D-pad right raises the heading setpoint, left lowers it. Wraps to the
/// opposite bound, discarding any overshoot.
fn step_yaw(cross: f32, state: &mut MapperState, step: f64) {
    if cross == axes::MOVE_RIGHT {
        state.yaw_accum = quantize(state.yaw_accum + step);
        if state.yaw_accum > ACCUMULATOR_LIMIT {
            state.yaw_accum = -ACCUMULATOR_LIMIT;
        }
    } else if cross == axes::MOVE_LEFT {
        state.yaw_accum = quantize(state.yaw_accum - step);
        if state.yaw_accum < -ACCUMULATOR_LIMIT {
            state.yaw_accum = ACCUMULATOR_LIMIT;
        }
    }
}

/// Keeps repeated steps from drifting past a bound.
fn quantize(value: f64) -> f64 {
    (value * ACCUMULATOR_SCALE).round() / ACCUMULATOR_SCALE
}

/// Owns the mapper state for the lifetime of the process.
///
/// `map` takes `&mut self`, so a single owner sees at most one call in
/// flight.
#[derive(Debug, Default)]
pub struct InputMapper {
    state: MapperState,
    settings: MapperSettings,
}

impl InputMapper {
    /// Creates a mapper with zeroed accumulators and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper with custom settings.
    #[must_use]
    pub fn with_settings(settings: MapperSettings) -> Self {
        Self {
            state: MapperState::default(),
            settings,
        }
    }

    /// Maps one snapshot. See [`map`].
    pub fn map(&mut self, snapshot: &InputSnapshot) -> (OutboundCommand, Vec<SideEffectRequest>) {
        map(snapshot, &mut self.state, &self.settings)
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> &MapperState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }
}
