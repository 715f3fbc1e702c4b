//! # Outbound Command
//!
//! The teleoperation message sent to the vehicle's control stack, and the
//! mode-change requests a mapping call may raise.
//!
//! ## Channel Assignments
//!
//! | Index | Axis | Kind |
//! |-------|------|------|
//! | 0-5 | X, Y, Z, Roll, Pitch, Yaw | Pose (absolute setpoint) |
//! | 6-11 | U, V, W, P, Q, R | Twist (rate setpoint) |
//!
//! The `buttons` array uses the same indices: `true` means that degree of
//! freedom is driven by that channel.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::Header;

/// Number of pose + twist channels.
pub const NUM_CHANNELS: usize = 12;

/// Channel indices, shared by `axes` and `buttons`.
pub mod channels {
    pub const POSE_X: usize = 0;
    pub const POSE_Y: usize = 1;
    pub const POSE_Z: usize = 2;
    pub const POSE_ROLL: usize = 3;
    pub const POSE_PITCH: usize = 4;
    pub const POSE_YAW: usize = 5;
    /// Surge rate
    pub const TWIST_U: usize = 6;
    /// Sway rate
    pub const TWIST_V: usize = 7;
    /// Heave rate
    pub const TWIST_W: usize = 8;
    /// Roll rate
    pub const TWIST_P: usize = 9;
    /// Pitch rate
    pub const TWIST_Q: usize = 10;
    /// Yaw rate
    pub const TWIST_R: usize = 11;
}

/// Pose and twist setpoints plus per-channel mode selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub header: Header,
    pub axes: [f32; NUM_CHANNELS],
    pub buttons: [bool; NUM_CHANNELS],
}

impl Default for OutboundCommand {
    fn default() -> Self {
        Self {
            header: Header::default(),
            axes: [0.0; NUM_CHANNELS],
            buttons: [false; NUM_CHANNELS],
        }
    }
}

/// Mode change requested from the external control subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideEffectRequest {
    EnableStationKeeping,
    DisableStationKeeping,
    EnableThrusters,
    DisableThrusters,
}

impl SideEffectRequest {
    /// All variants, in dispatch priority order.
    pub const ALL: [SideEffectRequest; 4] = [
        SideEffectRequest::EnableStationKeeping,
        SideEffectRequest::DisableStationKeeping,
        SideEffectRequest::EnableThrusters,
        SideEffectRequest::DisableThrusters,
    ];

    /// Remote service name, relative to the control namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx10_teleop::teleop::command::SideEffectRequest;
    ///
    /// assert_eq!(SideEffectRequest::DisableThrusters.service_suffix(), "disable_thrusters");
    /// ```
    #[must_use]
    pub fn service_suffix(self) -> &'static str {
        match self {
            SideEffectRequest::EnableStationKeeping => "enable_keep_position_3dof",
            SideEffectRequest::DisableStationKeeping => "disable_keep_position",
            SideEffectRequest::EnableThrusters => "enable_thrusters",
            SideEffectRequest::DisableThrusters => "disable_thrusters",
        }
    }
}

impl fmt::Display for SideEffectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_zeroed() {
        let command = OutboundCommand::default();
        assert!(command.axes.iter().all(|&a| a == 0.0));
        assert!(command.buttons.iter().all(|&b| !b));
    }

    #[test]
    fn test_service_suffixes_are_distinct() {
        let mut names: Vec<_> = SideEffectRequest::ALL
            .iter()
            .map(|r| r.service_suffix())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_command_json_shape() {
        let mut command = OutboundCommand::default();
        command.axes[channels::POSE_Z] = 0.25;
        command.buttons[channels::TWIST_Q] = true;

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["axes"].as_array().unwrap().len(), NUM_CHANNELS);
        assert_eq!(json["axes"][channels::POSE_Z], 0.25);
        assert_eq!(json["buttons"][channels::TWIST_Q], true);
        assert_eq!(json["header"]["seq"], 0);
    }
}
