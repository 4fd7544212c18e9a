//! # evdev Joystick Module
//!
//! Linux joystick discovery and polling through the evdev interface.
//!
//! ## Controller Detection
//!
//! Any `/dev/input/event*` device that reports `BTN_SOUTH` and `ABS_X` is a
//! gamepad. Devices are scanned in path order, so the N-th gamepad found
//! becomes driver station port N unless the configuration pins explicit paths.
//!
//! ## Polling
//!
//! Each attached device gets one reader thread that blocks on
//! `fetch_events` and folds events into the shared [`DriverStation`] table.
//! Readers of the table only take the read lock.

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::hid::{
    channel_for_axis, AxisRange, HidMapper, HidState, JoystickSource, AXIS_COUNT, DEFAULT_RANGES,
};
use crate::config::JoystickConfig;
use crate::error::{OiError, Result};

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// Handle to one gamepad opened through evdev.
pub struct EvdevJoystick {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for EvdevJoystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevJoystick")
            .field("device_path", &self.device_path)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

impl EvdevJoystick {
    /// Open the gamepad at a specific path
    ///
    /// # Errors
    ///
    /// - `Controller`: device cannot be opened or is not a gamepad
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use frc_oi::controller::evdev_source::EvdevJoystick;
    ///
    /// let joystick = EvdevJoystick::open("/dev/input/event5")?;
    /// println!("Opened {:?}", joystick.name());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            OiError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !is_gamepad(&device) {
            return Err(OiError::Controller(format!(
                "{} is not a gamepad",
                path.display()
            )));
        }

        Ok(Self {
            device,
            device_path: path.to_string_lossy().to_string(),
        })
    }

    /// Find up to `count` gamepads, in device path order
    ///
    /// Devices that cannot be opened (usually permission denied) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the input directory cannot be read.
    pub fn discover(count: usize) -> Result<Vec<Self>> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(OiError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| OiError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| OiError::Controller(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        let mut found = Vec::new();
        for entry in entries {
            if found.len() == count {
                break;
            }

            let path = entry.path();
            let is_event_node = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        info!("Found gamepad at: {}", path.display());
                        found.push(Self {
                            device,
                            device_path: path.to_string_lossy().to_string(),
                        });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Ok(found)
    }

    /// Device path this gamepad was opened from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the kernel
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Per-channel value ranges reported by the device
    ///
    /// Channels the device does not report keep their default range.
    pub fn axis_ranges(&self) -> [AxisRange; AXIS_COUNT] {
        let mut ranges = DEFAULT_RANGES;

        let Some(supported) = self.device.supported_absolute_axes() else {
            return ranges;
        };

        let abs_state = match self.device.get_abs_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("Could not read axis ranges from {}: {}", self.device_path, e);
                return ranges;
            }
        };

        for axis in supported.iter() {
            let Some(channel) = channel_for_axis(axis) else {
                continue;
            };
            let Some(info) = abs_state.get(axis.0 as usize) else {
                continue;
            };
            ranges[channel] = AxisRange {
                min: info.minimum,
                max: info.maximum,
                kind: ranges[channel].kind,
            };
        }

        ranges
    }

    /// Fetch pending events, blocking until at least one is available
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the read fails (e.g., controller unplugged).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| OiError::Controller(format!("Failed to fetch events: {}", e)))
    }
}

/// Whether a device looks like a gamepad
fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH))
        && device
            .supported_absolute_axes()
            .is_some_and(|axes| axes.contains(AbsoluteAxisType::ABS_X))
}

/// Shared table of the latest input snapshot per driver station port.
///
/// Cloning shares the same table.
#[derive(Debug, Clone)]
pub struct DriverStation {
    ports: Arc<RwLock<Vec<HidState>>>,
}

impl DriverStation {
    /// Creates a table with `count` neutral ports.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            ports: Arc::new(RwLock::new(vec![HidState::default(); count])),
        }
    }

    /// Number of ports in the table.
    pub fn port_count(&self) -> usize {
        self.ports.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Latest snapshot for `port`. Unknown ports read neutral.
    pub fn snapshot(&self, port: usize) -> HidState {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(port)
            .copied()
            .unwrap_or_default()
    }

    /// Replaces the snapshot for `port`. Unknown ports are ignored.
    pub fn update(&self, port: usize, state: HidState) {
        let mut ports = self.ports.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = ports.get_mut(port) {
            *slot = state;
        }
    }

    /// Start a reader thread feeding `joystick` into `port`
    ///
    /// The thread runs until the device read fails, then resets the port to
    /// neutral and exits.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn attach(&self, port: usize, mut joystick: EvdevJoystick) -> Result<JoinHandle<()>> {
        let station = self.clone();
        let handle = thread::Builder::new()
            .name(format!("oi-port-{}", port))
            .spawn(move || {
                let mut mapper = HidMapper::with_ranges(joystick.axis_ranges());
                let device_path = joystick.device_path().to_string();
                info!(
                    "Port {} reading from {} ({})",
                    port,
                    device_path,
                    joystick.name().unwrap_or("unnamed")
                );

                while station.apply_batch(port, &mut mapper, joystick.fetch_events()) {}

                info!("Port {} stopped reading {}", port, device_path);
            })?;
        Ok(handle)
    }

    /// Fold one batch of device events into `port`
    ///
    /// Returns false once the device read has failed; the port is then
    /// back at neutral and the reader should stop.
    fn apply_batch<I>(&self, port: usize, mapper: &mut HidMapper, batch: Result<I>) -> bool
    where
        I: Iterator<Item = InputEvent>,
    {
        match batch {
            Ok(events) => {
                let mut changed = false;
                for event in events {
                    changed |= mapper.process_event(&event);
                }
                if changed {
                    self.update(port, *mapper.state());
                }
                true
            }
            Err(e) => {
                warn!("Port {} lost its controller: {}", port, e);
                mapper.reset();
                self.update(port, *mapper.state());
                false
            }
        }
    }

    /// Open the configured joysticks and start polling them
    ///
    /// Ports with an explicit path in `config.devices` use that device; the
    /// rest are filled from discovery. Ports left without a device read
    /// neutral.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit device cannot be opened, discovery
    /// cannot scan the input directory, or a reader thread cannot be spawned.
    pub fn connect(config: &JoystickConfig) -> Result<(Self, Vec<JoinHandle<()>>)> {
        let station = Self::new(config.count);
        let mut handles = Vec::new();

        let mut explicit = Vec::new();
        for path in &config.devices {
            explicit.push(EvdevJoystick::open(path)?);
        }

        let discovered: Vec<EvdevJoystick> = if explicit.len() < config.count {
            EvdevJoystick::discover(config.count)?
                .into_iter()
                .filter(|joystick| !config.devices.iter().any(|p| p == joystick.device_path()))
                .collect()
        } else {
            Vec::new()
        };
        let mut discovered = discovered.into_iter();

        let mut explicit = explicit.into_iter();
        for port in 0..config.count {
            match explicit.next().or_else(|| discovered.next()) {
                Some(joystick) => handles.push(station.attach(port, joystick)?),
                None => warn!("{}; port will read neutral", OiError::ControllerNotFound(port)),
            }
        }

        Ok((station, handles))
    }
}

impl JoystickSource for DriverStation {
    fn raw_axis(&self, port: usize, axis: usize) -> f64 {
        self.snapshot(port).axes.get(axis).copied().unwrap_or(0.0)
    }

    fn raw_button(&self, port: usize, button: usize) -> bool {
        self.snapshot(port).button(button)
    }

    fn pov(&self, port: usize) -> i32 {
        self.snapshot(port).pov()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::hid::{axes, POV_RELEASED};
    use evdev::EventType;

    #[test]
    fn test_new_station_is_neutral() {
        let station = DriverStation::new(2);
        assert_eq!(station.port_count(), 2);
        assert_eq!(station.snapshot(0), HidState::default());
        assert_eq!(station.raw_axis(1, axes::LEFT_X), 0.0);
        assert!(!station.raw_button(1, 0));
        assert_eq!(station.pov(0), POV_RELEASED);
    }

    #[test]
    fn test_update_is_visible_through_clones() {
        let station = DriverStation::new(2);
        let reader = station.clone();

        let mut state = HidState::default();
        state.axes[axes::RIGHT_X] = 0.25;
        state.set_button(2, true);
        state.dpad_y = 1;
        station.update(1, state);

        assert_eq!(reader.raw_axis(1, axes::RIGHT_X), 0.25);
        assert!(reader.raw_button(1, 2));
        assert_eq!(reader.pov(1), 180);
        assert_eq!(reader.snapshot(0), HidState::default());
    }

    #[test]
    fn test_unknown_port_reads_neutral() {
        let station = DriverStation::new(1);
        let mut state = HidState::default();
        state.set_button(0, true);
        station.update(4, state);

        assert!(!station.raw_button(4, 0));
        assert_eq!(station.raw_axis(4, axes::LEFT_Y), 0.0);
        assert_eq!(station.pov(4), POV_RELEASED);
    }

    fn axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), i32::from(pressed))
    }

    #[test]
    fn test_apply_batch_publishes_changes() {
        let station = DriverStation::new(2);
        let mut mapper = HidMapper::new();

        let batch = vec![
            axis_event(AbsoluteAxisType::ABS_X, 32767),
            key_event(Key::BTN_EAST, true),
            axis_event(AbsoluteAxisType::ABS_HAT0X, 1),
        ];
        assert!(station.apply_batch(1, &mut mapper, Ok(batch.into_iter())));

        let state = station.snapshot(1);
        assert_eq!(state.axes[axes::LEFT_X], 1.0);
        assert!(state.button(1));
        assert_eq!(state.pov(), 90);
        assert_eq!(station.snapshot(0), HidState::default());
    }

    #[test]
    fn test_apply_batch_empty_keeps_reading() {
        let station = DriverStation::new(1);
        let mut mapper = HidMapper::new();
        assert!(station.apply_batch(0, &mut mapper, Ok(std::iter::empty())));
        assert_eq!(station.snapshot(0), HidState::default());
    }

    #[test]
    fn test_apply_batch_read_failure_resets_port() {
        let station = DriverStation::new(1);
        let mut mapper = HidMapper::new();

        let batch = vec![
            key_event(Key::BTN_SOUTH, true),
            axis_event(AbsoluteAxisType::ABS_RY, -32768),
        ];
        assert!(station.apply_batch(0, &mut mapper, Ok(batch.into_iter())));
        assert_ne!(station.snapshot(0), HidState::default());

        let failed: Result<std::vec::IntoIter<InputEvent>> =
            Err(OiError::Controller("Failed to fetch events: No such device".to_string()));
        assert!(!station.apply_batch(0, &mut mapper, failed));
        assert_eq!(station.snapshot(0), HidState::default());
        assert_eq!(*mapper.state(), HidState::default());
    }

    #[test]
    fn test_open_invalid_path_returns_error() {
        let result = EvdevJoystick::open("/dev/input/nonexistent_event_12345");
        match result {
            Err(OiError::Controller(msg)) => {
                assert!(msg.contains("/dev/input/nonexistent_event_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    #[test]
    fn test_connect_with_invalid_explicit_path_fails() {
        let config = JoystickConfig {
            count: 1,
            deadzone: 0.01,
            devices: vec!["/dev/input/nonexistent_event_12345".to_string()],
        };
        assert!(DriverStation::connect(&config).is_err());
    }

    #[test]
    fn test_discover_zero_finds_nothing() {
        // Either the directory is missing (error) or nothing is returned
        if let Ok(found) = EvdevJoystick::discover(0) {
            assert!(found.is_empty());
        }
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_discover_with_real_hardware() {
        let found = EvdevJoystick::discover(2).expect("Failed to scan /dev/input");
        assert!(!found.is_empty(), "Should detect a connected gamepad");

        for joystick in &found {
            println!("Found {:?}", joystick);
            assert!(joystick.device_path().starts_with("/dev/input/event"));
            let ranges = joystick.axis_ranges();
            assert!(ranges[axes::LEFT_X].max > ranges[axes::LEFT_X].min);
        }
    }
}
