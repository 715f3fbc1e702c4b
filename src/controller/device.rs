//! # Gamepad Device Module
//!
//! Detects and opens the Logitech gamepad through the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! The gamepad is identified by:
//! - Vendor ID: 0x046d (Logitech)
//! - Product ID: 0xc21d (F310), 0xc21e (F510) or 0xc21f (F710), all in XInput mode
//!
//! A configured device path skips detection.
//!
//! ## Input Axes
//!
//! - Left stick: ABS_X, ABS_Y (-32768..32767)
//! - Right stick: ABS_RX, ABS_RY (-32768..32767)
//! - Triggers: ABS_Z (LT), ABS_RZ (RT) (0-255)
//! - D-pad: ABS_HAT0X, ABS_HAT0Y (-1/0/1)

use evdev::Device;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::events::SnapshotAssembler;
use crate::error::{Result, TeleopError};
use crate::teleop::snapshot::InputSnapshot;

/// Logitech vendor ID
const LOGITECH_VENDOR_ID: u16 = 0x046d;

/// XInput-mode gamepad product IDs (F310, F510, F710)
const GAMEPAD_PRODUCT_IDS: &[u16] = &[0xc21d, 0xc21e, 0xc21f];

/// Gamepad handle
///
/// Represents an open evdev gamepad device.
pub struct GamepadDevice {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for GamepadDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadDevice")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

/// True if the vendor/product pair is a supported gamepad.
fn is_supported(vendor: u16, product: u16) -> bool {
    vendor == LOGITECH_VENDOR_ID && GAMEPAD_PRODUCT_IDS.contains(&product)
}

impl GamepadDevice {
    /// Detect and open the first supported gamepad
    ///
    /// Scans all `/dev/input/event*` devices in sorted order and matches vendor
    /// and product IDs.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No supported gamepad on the system
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fx10_teleop::controller::device::GamepadDevice;
    ///
    /// let gamepad = GamepadDevice::open()?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TeleopError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic pick when several gamepads are attached
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            match path.file_name() {
                Some(filename) if filename.to_string_lossy().starts_with("event") => {}
                _ => continue,
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_supported(id.vendor(), id.product()) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found Logitech gamepad at: {}", device_path);
                        return Ok(GamepadDevice {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::ControllerNotFound)
    }

    /// Open a specific event device, without checking its IDs.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be opened.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| TeleopError::Controller(format!("Failed to open {}: {}", path, e)))?;
        info!("Opened gamepad at: {}", path);
        Ok(GamepadDevice {
            device,
            device_path: path.to_string(),
        })
    }

    /// Open `path` if non-empty, otherwise auto-detect.
    pub fn open_configured(path: &str) -> Result<Self> {
        if path.is_empty() {
            Self::open()
        } else {
            Self::open_path(path)
        }
    }

    /// The `/dev/input/eventX` path this gamepad was opened from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name, e.g. "Logitech Gamepad F310"
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }
}

/// Read the gamepad asynchronously and forward complete snapshots.
///
/// The reader stops when the receiving side is dropped or the device fails.
///
/// # Errors
///
/// Returns `Controller` if the device cannot be registered with the runtime.
pub fn spawn_reader(device: GamepadDevice, tx: mpsc::Sender<InputSnapshot>) -> Result<JoinHandle<()>> {
    let device_path = device.device_path;
    let mut stream = device
        .device
        .into_event_stream()
        .map_err(|e| TeleopError::Controller(format!("Failed to stream {}: {}", device_path, e)))?;

    Ok(tokio::spawn(async move {
        let mut assembler = SnapshotAssembler::new();

        loop {
            let event = match stream.next_event().await {
                Ok(event) => event,
                Err(e) => {
                    error!("Gamepad {} stopped: {}", device_path, e);
                    return;
                }
            };

            if let Some(snapshot) = assembler.process_event(&event) {
                if tx.send(snapshot).await.is_err() {
                    debug!("Snapshot receiver closed, stopping gamepad reader");
                    return;
                }
            }
        }
    }))
}
