//! # Input Snapshot
//!
//! One complete reading of the gamepad: 8 normalized axes and 11 buttons.
//!
//! ## Axis Layout
//!
//! | Index | Axis | Range |
//! |-------|------|-------|
//! | 0 | Left stick horizontal | left +1, right -1 |
//! | 1 | Left stick vertical | up +1, down -1 |
//! | 2 | Left trigger | released 1, pulled -1 |
//! | 3 | Right stick horizontal | left +1, right -1 |
//! | 4 | Right stick vertical | up +1, down -1 |
//! | 5 | Right trigger | released 1, pulled -1 |
//! | 6 | Cross (d-pad) horizontal | left +1, right -1 |
//! | 7 | Cross (d-pad) vertical | up +1, down -1 |
//!
//! ## Button Layout
//!
//! A, B, X, Y, left shoulder, right shoulder, back, start, logitech,
//! left stick click, right stick click. Each reads 0.0 or 1.0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of axes in a snapshot.
pub const NUM_AXES: usize = 8;

/// Number of buttons in a snapshot.
pub const NUM_BUTTONS: usize = 11;

/// Axis indices for semantic access.
pub mod axes {
    /// Left stick horizontal (left +, right -)
    pub const LEFT_JOY_HORIZONTAL: usize = 0;
    /// Left stick vertical (up +, down -)
    pub const LEFT_JOY_VERTICAL: usize = 1;
    /// Left trigger (released 1, pulled -1)
    pub const LEFT_TRIGGER: usize = 2;
    /// Right stick horizontal (left +, right -)
    pub const RIGHT_JOY_HORIZONTAL: usize = 3;
    /// Right stick vertical (up +, down -)
    pub const RIGHT_JOY_VERTICAL: usize = 4;
    /// Right trigger (released 1, pulled -1)
    pub const RIGHT_TRIGGER: usize = 5;
    /// D-pad horizontal (left +, right -)
    pub const CROSS_HORIZONTAL: usize = 6;
    /// D-pad vertical (up +, down -)
    pub const CROSS_VERTICAL: usize = 7;

    /// D-pad pressed up.
    pub const MOVE_UP: f32 = 1.0;
    /// D-pad pressed down.
    pub const MOVE_DOWN: f32 = -1.0;
    /// D-pad pressed left.
    pub const MOVE_LEFT: f32 = 1.0;
    /// D-pad pressed right.
    pub const MOVE_RIGHT: f32 = -1.0;
}

/// Button indices for semantic access.
pub mod buttons {
    pub const A: usize = 0;
    pub const B: usize = 1;
    pub const X: usize = 2;
    pub const Y: usize = 3;
    /// Left shoulder
    pub const LEFT: usize = 4;
    /// Right shoulder
    pub const RIGHT: usize = 5;
    pub const BACK: usize = 6;
    pub const START: usize = 7;
    pub const LOGITECH: usize = 8;
    /// Left stick click
    pub const LEFT_JOY: usize = 9;
    /// Right stick click
    pub const RIGHT_JOY: usize = 10;

    /// Raw value of an asserted button.
    pub const PRESSED: f32 = 1.0;
    /// Raw value of a released button.
    pub const RELEASED: f32 = 0.0;
}

/// Sequence number and acquisition time of a snapshot.
///
/// The default header has `seq` 0 and a Unix-epoch stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub seq: u64,
    pub stamp: DateTime<Utc>,
}

/// A single, immutable reading of every axis and button.
///
/// # Examples
///
/// ```
/// use fx10_teleop::teleop::snapshot::{buttons, InputSnapshot};
///
/// let mut snapshot = InputSnapshot::neutral();
/// snapshot.buttons[buttons::A] = buttons::PRESSED;
/// assert!(snapshot.pressed(buttons::A));
/// assert!(!snapshot.pressed(buttons::B));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub header: Header,
    pub axes: [f32; NUM_AXES],
    pub buttons: [f32; NUM_BUTTONS],
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

impl InputSnapshot {
    /// Creates a snapshot with every axis at 0.0 and every button released.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            header: Header::default(),
            axes: [0.0; NUM_AXES],
            buttons: [buttons::RELEASED; NUM_BUTTONS],
        }
    }

    /// Returns the value of an axis.
    ///
    /// # Panics
    ///
    /// Panics if `index >= NUM_AXES`.
    #[must_use]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes[index]
    }

    /// Returns true if the button reads exactly 1.0.
    ///
    /// # Panics
    ///
    /// Panics if `index >= NUM_BUTTONS`.
    #[must_use]
    pub fn pressed(&self, index: usize) -> bool {
        self.buttons[index] == buttons::PRESSED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_snapshot() {
        let snapshot = InputSnapshot::neutral();
        assert!(snapshot.axes.iter().all(|&a| a == 0.0));
        assert!((0..NUM_BUTTONS).all(|b| !snapshot.pressed(b)));
        assert_eq!(snapshot.header.seq, 0);
    }

    #[test]
    fn test_pressed_requires_exact_one() {
        let mut snapshot = InputSnapshot::neutral();
        snapshot.buttons[buttons::START] = 0.5;
        assert!(!snapshot.pressed(buttons::START));

        snapshot.buttons[buttons::START] = 1.0;
        assert!(snapshot.pressed(buttons::START));
    }

    #[test]
    fn test_layout_indices_fit() {
        assert!(axes::CROSS_VERTICAL < NUM_AXES);
        assert!(buttons::RIGHT_JOY < NUM_BUTTONS);
    }
}
