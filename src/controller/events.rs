//! # Snapshot Assembler Module
//!
//! Parses raw evdev events from the gamepad and assembles normalized
//! [`InputSnapshot`]s.
//!
//! ## Event Types
//!
//! - **EV_ABS (Absolute Axis)**: sticks, triggers and d-pad
//! - **EV_KEY (Key/Button)**: digital buttons
//! - **EV_SYN (SYN_REPORT)**: end of a device frame; emits a snapshot
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Raw Range | Snapshot Axis |
//! |------|------------|-----------|---------------|
//! | Left Stick X | ABS_X | -32768..32767 | Left horizontal (negated) |
//! | Left Stick Y | ABS_Y | -32768..32767 | Left vertical (negated) |
//! | LT | ABS_Z | 0-255 | Left trigger |
//! | Right Stick X | ABS_RX | -32768..32767 | Right horizontal (negated) |
//! | Right Stick Y | ABS_RY | -32768..32767 | Right vertical (negated) |
//! | RT | ABS_RZ | 0-255 | Right trigger |
//! | D-Pad X | ABS_HAT0X | -1/0/1 | Cross horizontal (negated) |
//! | D-Pad Y | ABS_HAT0Y | -1/0/1 | Cross vertical (negated) |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code |
//! |--------|------------|
//! | A | BTN_SOUTH |
//! | B | BTN_EAST |
//! | X | BTN_NORTH |
//! | Y | BTN_WEST |
//! | LB | BTN_TL |
//! | RB | BTN_TR |
//! | Back | BTN_SELECT |
//! | Start | BTN_START |
//! | Logitech | BTN_MODE |
//! | Left stick click | BTN_THUMBL |
//! | Right stick click | BTN_THUMBR |

use chrono::Utc;
use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key, Synchronization};

use crate::teleop::snapshot::{axes, buttons, Header, InputSnapshot};

/// Full-scale stick deflection.
pub const STICK_MAX: f32 = 32767.0;

/// Fully pulled raw trigger value.
pub const TRIGGER_MAX: f32 = 255.0;

/// Normalize a raw stick value to [-1, 1], flipping sign so left/up is positive.
fn normalize_stick(value: i32) -> f32 {
    (-(value as f32) / STICK_MAX).clamp(-1.0, 1.0)
}

/// Normalize a raw trigger value: 1.0 released, -1.0 fully pulled.
fn normalize_trigger(value: i32) -> f32 {
    (1.0 - 2.0 * value as f32 / TRIGGER_MAX).clamp(-1.0, 1.0)
}

/// Normalize a raw hat value so left/up is +1.
fn normalize_hat(value: i32) -> f32 {
    -(value.signum() as f32)
}

/// Accumulates evdev events into snapshots.
///
/// # Thread Safety
///
/// `SnapshotAssembler` is not thread-safe. Use from a single task/thread only.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use fx10_teleop::controller::events::SnapshotAssembler;
/// use fx10_teleop::teleop::snapshot::axes;
///
/// let mut assembler = SnapshotAssembler::new();
/// let hat = InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_HAT0Y.0, 1);
/// assert!(assembler.process_event(&hat).is_none());
///
/// let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
/// let snapshot = assembler.process_event(&sync).unwrap();
/// assert_eq!(snapshot.axes[axes::CROSS_VERTICAL], axes::MOVE_DOWN);
/// ```
#[derive(Debug)]
pub struct SnapshotAssembler {
    current: InputSnapshot,
    seq: u64,
}

impl Default for SnapshotAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotAssembler {
    /// Creates an assembler with centered sticks, released triggers and buttons.
    #[must_use]
    pub fn new() -> Self {
        let mut current = InputSnapshot::neutral();
        current.axes[axes::LEFT_TRIGGER] = 1.0;
        current.axes[axes::RIGHT_TRIGGER] = 1.0;
        Self { current, seq: 0 }
    }

    /// The values accumulated so far (header not yet stamped).
    #[must_use]
    pub fn current(&self) -> &InputSnapshot {
        &self.current
    }

    /// Processes one event. Returns a stamped snapshot on `SYN_REPORT`.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<InputSnapshot> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
                None
            }
            InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
                None
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => Some(self.emit()),
            _ => None,
        }
    }

    fn emit(&mut self) -> InputSnapshot {
        self.seq += 1;
        let mut snapshot = self.current.clone();
        snapshot.header = Header {
            seq: self.seq,
            stamp: Utc::now(),
        };
        snapshot
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let (index, normalized) = match axis {
            AbsoluteAxisType::ABS_X => (axes::LEFT_JOY_HORIZONTAL, normalize_stick(value)),
            AbsoluteAxisType::ABS_Y => (axes::LEFT_JOY_VERTICAL, normalize_stick(value)),
            AbsoluteAxisType::ABS_Z => (axes::LEFT_TRIGGER, normalize_trigger(value)),
            AbsoluteAxisType::ABS_RX => (axes::RIGHT_JOY_HORIZONTAL, normalize_stick(value)),
            AbsoluteAxisType::ABS_RY => (axes::RIGHT_JOY_VERTICAL, normalize_stick(value)),
            AbsoluteAxisType::ABS_RZ => (axes::RIGHT_TRIGGER, normalize_trigger(value)),
            AbsoluteAxisType::ABS_HAT0X => (axes::CROSS_HORIZONTAL, normalize_hat(value)),
            AbsoluteAxisType::ABS_HAT0Y => (axes::CROSS_VERTICAL, normalize_hat(value)),
            _ => return,
        };
        self.current.axes[index] = normalized;
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let index = match key {
            Key::BTN_SOUTH => buttons::A,
            Key::BTN_EAST => buttons::B,
            // xpad reports X as BTN_NORTH and Y as BTN_WEST
            Key::BTN_NORTH => buttons::X,
            Key::BTN_WEST => buttons::Y,
            Key::BTN_TL => buttons::LEFT,
            Key::BTN_TR => buttons::RIGHT,
            Key::BTN_SELECT => buttons::BACK,
            Key::BTN_START => buttons::START,
            Key::BTN_MODE => buttons::LOGITECH,
            Key::BTN_THUMBL => buttons::LEFT_JOY,
            Key::BTN_THUMBR => buttons::RIGHT_JOY,
            _ => return,
        };
        self.current.buttons[index] = if pressed {
            buttons::PRESSED
        } else {
            buttons::RELEASED
        };
    }

    /// Forget all accumulated input, e.g. after a reconnect.
    pub fn reset(&mut self) {
        let seq = self.seq;
        *self = Self::new();
        self.seq = seq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn make_axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn make_key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    fn make_sync_event() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
    }

    #[test]
    fn test_new_assembler_is_released() {
        let assembler = SnapshotAssembler::new();
        let current = assembler.current();
        assert_eq!(current.axes[axes::LEFT_JOY_HORIZONTAL], 0.0);
        assert_eq!(current.axes[axes::LEFT_TRIGGER], 1.0);
        assert_eq!(current.axes[axes::RIGHT_TRIGGER], 1.0);
        assert!(current.buttons.iter().all(|&b| b == buttons::RELEASED));
    }

    #[test]
    fn test_snapshot_only_on_sync() {
        let mut assembler = SnapshotAssembler::new();
        assert!(assembler
            .process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 1000))
            .is_none());
        assert!(assembler
            .process_event(&make_key_event(Key::BTN_SOUTH, true))
            .is_none());

        let snapshot = assembler.process_event(&make_sync_event()).unwrap();
        assert!(snapshot.pressed(buttons::A));
        assert_eq!(snapshot.header.seq, 1);
    }

    #[test]
    fn test_seq_increments() {
        let mut assembler = SnapshotAssembler::new();
        let first = assembler.process_event(&make_sync_event()).unwrap();
        let second = assembler.process_event(&make_sync_event()).unwrap();
        assert_eq!(first.header.seq, 1);
        assert_eq!(second.header.seq, 2);
        assert!(second.header.stamp >= first.header.stamp);
    }

    #[test]
    fn test_stick_normalization() {
        let mut assembler = SnapshotAssembler::new();
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, -32768));
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, 32767));
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_RX, 0));
        let snapshot = assembler.process_event(&make_sync_event()).unwrap();

        // Full left is +1, full down is -1
        assert_eq!(snapshot.axes[axes::LEFT_JOY_HORIZONTAL], 1.0);
        assert_eq!(snapshot.axes[axes::LEFT_JOY_VERTICAL], -1.0);
        assert_eq!(snapshot.axes[axes::RIGHT_JOY_HORIZONTAL], 0.0);
    }

    #[test]
    fn test_trigger_normalization() {
        let mut assembler = SnapshotAssembler::new();
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_Z, 255));
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_RZ, 0));
        let snapshot = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(snapshot.axes[axes::LEFT_TRIGGER], -1.0);
        assert_eq!(snapshot.axes[axes::RIGHT_TRIGGER], 1.0);
    }

    #[test]
    fn test_dpad_directions() {
        let mut assembler = SnapshotAssembler::new();
        // evdev: -1 is left/up
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, 1));
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0Y, -1));
        let snapshot = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(snapshot.axes[axes::CROSS_HORIZONTAL], axes::MOVE_RIGHT);
        assert_eq!(snapshot.axes[axes::CROSS_VERTICAL], axes::MOVE_UP);
    }

    #[test]
    fn test_all_buttons_mapped() {
        let cases = [
            (Key::BTN_SOUTH, buttons::A),
            (Key::BTN_EAST, buttons::B),
            (Key::BTN_NORTH, buttons::X),
            (Key::BTN_WEST, buttons::Y),
            (Key::BTN_TL, buttons::LEFT),
            (Key::BTN_TR, buttons::RIGHT),
            (Key::BTN_SELECT, buttons::BACK),
            (Key::BTN_START, buttons::START),
            (Key::BTN_MODE, buttons::LOGITECH),
            (Key::BTN_THUMBL, buttons::LEFT_JOY),
            (Key::BTN_THUMBR, buttons::RIGHT_JOY),
        ];

        for (key, index) in cases {
            let mut assembler = SnapshotAssembler::new();
            assembler.process_event(&make_key_event(key, true));
            let snapshot = assembler.process_event(&make_sync_event()).unwrap();
            assert!(snapshot.pressed(index), "{:?} should map to button {}", key, index);

            assembler.process_event(&make_key_event(key, false));
            let snapshot = assembler.process_event(&make_sync_event()).unwrap();
            assert!(!snapshot.pressed(index));
        }
    }

    #[test]
    fn test_unknown_events_ignored() {
        let mut assembler = SnapshotAssembler::new();
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_MISC, 100));
        assembler.process_event(&make_key_event(Key::BTN_TRIGGER_HAPPY1, true));
        let snapshot = assembler.process_event(&make_sync_event()).unwrap();

        let mut expected = SnapshotAssembler::new().current().clone();
        expected.header = snapshot.header;
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn test_reset_keeps_sequence() {
        let mut assembler = SnapshotAssembler::new();
        assembler.process_event(&make_key_event(Key::BTN_START, true));
        assembler.process_event(&make_sync_event());

        assembler.reset();
        let snapshot = assembler.process_event(&make_sync_event()).unwrap();
        assert!(!snapshot.pressed(buttons::START));
        assert_eq!(snapshot.header.seq, 2);
    }
}
