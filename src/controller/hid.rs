//! # HID Source Module
//!
//! The hardware-polling layer underneath the [`InputMapper`](super::input_mapper::InputMapper).
//!
//! [`JoystickSource`] is the seam: it answers "raw axis value", "raw button
//! pressed" and "POV angle" for a driver station port. [`HidState`] is the
//! per-port snapshot those answers come from, and [`HidMapper`] folds evdev
//! events into it.
//!
//! ## Axis Channels (xpad layout)
//!
//! | Channel | evdev Code | Input |
//! |---------|------------|-------|
//! | 0 | ABS_X | Left stick X |
//! | 1 | ABS_Y | Left stick Y (down = positive) |
//! | 2 | ABS_Z | Left trigger |
//! | 3 | ABS_RZ | Right trigger |
//! | 4 | ABS_RX | Right stick X |
//! | 5 | ABS_RY | Right stick Y (down = positive) |
//!
//! ## Button Numbers
//!
//! | Button | evdev Code | Xbox label |
//! |--------|------------|------------|
//! | 0 | BTN_SOUTH | A |
//! | 1 | BTN_EAST | B |
//! | 2 | BTN_WEST | X |
//! | 3 | BTN_NORTH | Y |
//! | 4 | BTN_TL | LB |
//! | 5 | BTN_TR | RB |
//! | 6 | BTN_SELECT | Back |
//! | 7 | BTN_START | Start |

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

/// Number of analog channels per controller.
pub const AXIS_COUNT: usize = 6;
/// Number of raw buttons per controller.
pub const BUTTON_COUNT: usize = 8;
/// Number of POV directions per controller.
pub const POV_COUNT: usize = 8;
/// Angle between adjacent POV directions.
pub const POV_STEP_DEGREES: i32 = 45;
/// POV value reported when the D-pad is released.
pub const POV_RELEASED: i32 = -1;

/// Raw analog channel numbers.
pub mod axes {
    pub const LEFT_X: usize = 0;
    pub const LEFT_Y: usize = 1;
    pub const LEFT_TRIGGER: usize = 2;
    pub const RIGHT_TRIGGER: usize = 3;
    pub const RIGHT_X: usize = 4;
    pub const RIGHT_Y: usize = 5;
}

/// The hardware-polling primitives the input mapper reads through.
///
/// `port` is the driver station port (controller index). Implementations
/// return neutral values for ports with nothing attached.
#[cfg_attr(test, mockall::automock)]
pub trait JoystickSource {
    /// Raw analog value for `axis` on `port`, in -1.0..=1.0.
    fn raw_axis(&self, port: usize, axis: usize) -> f64;

    /// Whether raw button `button` on `port` is held.
    fn raw_button(&self, port: usize, button: usize) -> bool;

    /// Current POV angle in degrees (0 = up, clockwise), or [`POV_RELEASED`].
    fn pov(&self, port: usize) -> i32;
}

/// Snapshot of one controller's inputs, already normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HidState {
    /// Analog channels, indexed by [`axes`] constants.
    pub axes: [f64; AXIS_COUNT],
    /// Held buttons, bit `n` for button `n`.
    pub buttons: u16,
    /// D-pad X axis. -1 = left, 0 = center, 1 = right.
    pub dpad_x: i32,
    /// D-pad Y axis. -1 = up, 0 = center, 1 = down.
    pub dpad_y: i32,
}

impl Default for HidState {
    /// Sticks centered, triggers released, no buttons held.
    fn default() -> Self {
        Self {
            axes: [0.0; AXIS_COUNT],
            buttons: 0,
            dpad_x: 0,
            dpad_y: 0,
        }
    }
}

impl HidState {
    /// Whether button `button` is held. Buttons past 15 are never held.
    #[must_use]
    pub fn button(&self, button: usize) -> bool {
        button < 16 && self.buttons & (1 << button) != 0
    }

    /// Sets or clears button `button`.
    pub fn set_button(&mut self, button: usize, pressed: bool) {
        if button >= 16 {
            return;
        }
        if pressed {
            self.buttons |= 1 << button;
        } else {
            self.buttons &= !(1 << button);
        }
    }

    /// D-pad direction as a POV angle.
    ///
    /// 0 = up, 90 = right, 180 = down, 270 = left, with 45° diagonals.
    /// Returns [`POV_RELEASED`] when the D-pad is centered.
    ///
    /// # Examples
    ///
    /// ```
    /// use frc_oi::controller::hid::{HidState, POV_RELEASED};
    ///
    /// let mut state = HidState::default();
    /// assert_eq!(state.pov(), POV_RELEASED);
    ///
    /// state.dpad_x = 1;
    /// state.dpad_y = -1;
    /// assert_eq!(state.pov(), 45);
    /// ```
    #[must_use]
    pub fn pov(&self) -> i32 {
        match (self.dpad_x.signum(), self.dpad_y.signum()) {
            (0, -1) => 0,
            (1, -1) => 45,
            (1, 0) => 90,
            (1, 1) => 135,
            (0, 1) => 180,
            (-1, 1) => 225,
            (-1, 0) => 270,
            (-1, -1) => 315,
            _ => POV_RELEASED,
        }
    }
}

impl JoystickSource for [HidState] {
    fn raw_axis(&self, port: usize, axis: usize) -> f64 {
        self.get(port)
            .and_then(|state| state.axes.get(axis).copied())
            .unwrap_or(0.0)
    }

    fn raw_button(&self, port: usize, button: usize) -> bool {
        self.get(port).is_some_and(|state| state.button(button))
    }

    fn pov(&self, port: usize) -> i32 {
        self.get(port).map_or(POV_RELEASED, HidState::pov)
    }
}

impl JoystickSource for Vec<HidState> {
    fn raw_axis(&self, port: usize, axis: usize) -> f64 {
        self.as_slice().raw_axis(port, axis)
    }

    fn raw_button(&self, port: usize, button: usize) -> bool {
        self.as_slice().raw_button(port, button)
    }

    fn pov(&self, port: usize) -> i32 {
        self.as_slice().pov(port)
    }
}

/// How a raw evdev range maps onto a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Sticks: min..max maps to -1.0..1.0.
    Bipolar,
    /// Triggers: min..max maps to 0.0..1.0.
    Unipolar,
}

/// Raw value range reported by the kernel for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
    pub kind: AxisKind,
}

impl AxisRange {
    /// Xbox-style stick range.
    pub const STICK: AxisRange = AxisRange {
        min: -32768,
        max: 32767,
        kind: AxisKind::Bipolar,
    };

    /// Xbox-style trigger range.
    pub const TRIGGER: AxisRange = AxisRange {
        min: 0,
        max: 255,
        kind: AxisKind::Unipolar,
    };

    /// Converts a raw kernel value to a normalized value.
    ///
    /// A degenerate range (`max <= min`) always reads as 0.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use frc_oi::controller::hid::AxisRange;
    ///
    /// assert_eq!(AxisRange::STICK.normalize(-32768), -1.0);
    /// assert_eq!(AxisRange::STICK.normalize(32767), 1.0);
    /// assert_eq!(AxisRange::TRIGGER.normalize(255), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        let span = f64::from(self.max) - f64::from(self.min);
        let fraction = ((f64::from(raw) - f64::from(self.min)) / span).clamp(0.0, 1.0);
        match self.kind {
            AxisKind::Bipolar => fraction * 2.0 - 1.0,
            AxisKind::Unipolar => fraction,
        }
    }
}

/// Default ranges per channel, used until the device reports its own.
pub const DEFAULT_RANGES: [AxisRange; AXIS_COUNT] = [
    AxisRange::STICK,
    AxisRange::STICK,
    AxisRange::TRIGGER,
    AxisRange::TRIGGER,
    AxisRange::STICK,
    AxisRange::STICK,
];

/// Returns the analog channel an evdev axis feeds, if any.
#[must_use]
pub fn channel_for_axis(axis: AbsoluteAxisType) -> Option<usize> {
    match axis {
        AbsoluteAxisType::ABS_X => Some(axes::LEFT_X),
        AbsoluteAxisType::ABS_Y => Some(axes::LEFT_Y),
        AbsoluteAxisType::ABS_Z => Some(axes::LEFT_TRIGGER),
        AbsoluteAxisType::ABS_RZ => Some(axes::RIGHT_TRIGGER),
        AbsoluteAxisType::ABS_RX => Some(axes::RIGHT_X),
        AbsoluteAxisType::ABS_RY => Some(axes::RIGHT_Y),
        _ => None,
    }
}

/// Returns the raw button number an evdev key feeds, if any.
#[must_use]
pub fn button_for_key(key: Key) -> Option<usize> {
    match key {
        Key::BTN_SOUTH => Some(0),
        Key::BTN_EAST => Some(1),
        Key::BTN_WEST => Some(2),
        Key::BTN_NORTH => Some(3),
        Key::BTN_TL => Some(4),
        Key::BTN_TR => Some(5),
        Key::BTN_SELECT => Some(6),
        Key::BTN_START => Some(7),
        _ => None,
    }
}

/// Folds evdev events into a [`HidState`].
///
/// Not thread-safe on its own; the driver station wraps snapshots in a lock.
#[derive(Debug, Clone)]
pub struct HidMapper {
    state: HidState,
    ranges: [AxisRange; AXIS_COUNT],
}

impl Default for HidMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl HidMapper {
    /// Creates a mapper using [`DEFAULT_RANGES`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_ranges(DEFAULT_RANGES)
    }

    /// Creates a mapper using device-reported ranges.
    #[must_use]
    pub fn with_ranges(ranges: [AxisRange; AXIS_COUNT]) -> Self {
        Self {
            state: HidState::default(),
            ranges,
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn state(&self) -> &HidState {
        &self.state
    }

    /// Returns the axis ranges in use.
    #[must_use]
    pub fn ranges(&self) -> &[AxisRange; AXIS_COUNT] {
        &self.ranges
    }

    /// Processes a single evdev event. Returns true if the snapshot changed.
    pub fn process_event(&mut self, event: &InputEvent) -> bool {
        let before = self.state;
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => {
                if let Some(button) = button_for_key(key) {
                    self.state.set_button(button, event.value() != 0);
                }
            }
            _ => {
                // Sync and misc events carry no input
            }
        }
        self.state != before
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_HAT0X => self.state.dpad_x = value.signum(),
            AbsoluteAxisType::ABS_HAT0Y => self.state.dpad_y = value.signum(),
            _ => {
                if let Some(channel) = channel_for_axis(axis) {
                    self.state.axes[channel] = self.ranges[channel].normalize(value);
                }
            }
        }
    }

    /// Resets to neutral. Used when a controller disconnects.
    pub fn reset(&mut self) {
        self.state = HidState::default();
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
        InputEvent::new(EventType::KEY, key.code(), i32::from(pressed))
    }

    // ==================== HidState Tests ====================

    #[test]
    fn test_hid_state_default() {
        let state = HidState::default();
        assert_eq!(state.axes, [0.0; AXIS_COUNT]);
        assert_eq!(state.buttons, 0);
        assert_eq!(state.pov(), POV_RELEASED);
    }

    #[test]
    fn test_set_button() {
        let mut state = HidState::default();
        state.set_button(3, true);
        assert!(state.button(3));
        assert!(!state.button(2));
        state.set_button(3, false);
        assert!(!state.button(3));
    }

    #[test]
    fn test_button_out_of_range() {
        let mut state = HidState::default();
        state.set_button(40, true);
        assert_eq!(state.buttons, 0);
        assert!(!state.button(40));
    }

    #[test]
    fn test_pov_all_directions() {
        let cases = [
            ((0, -1), 0),
            ((1, -1), 45),
            ((1, 0), 90),
            ((1, 1), 135),
            ((0, 1), 180),
            ((-1, 1), 225),
            ((-1, 0), 270),
            ((-1, -1), 315),
            ((0, 0), POV_RELEASED),
        ];
        for ((x, y), angle) in cases {
            let state = HidState {
                dpad_x: x,
                dpad_y: y,
                ..HidState::default()
            };
            assert_eq!(state.pov(), angle, "dpad ({}, {})", x, y);
        }
    }

    #[test]
    fn test_slice_source_neutral_for_missing_port() {
        let states = vec![HidState::default()];
        assert_eq!(states.raw_axis(5, 0), 0.0);
        assert!(!states.raw_button(5, 0));
        assert_eq!(states.pov(5), POV_RELEASED);
    }

    #[test]
    fn test_slice_source_reads_state() {
        let mut state = HidState::default();
        state.axes[axes::RIGHT_Y] = -0.75;
        state.set_button(7, true);
        state.dpad_x = -1;
        let states = vec![HidState::default(), state];

        assert_eq!(states.raw_axis(1, axes::RIGHT_Y), -0.75);
        assert!(states.raw_button(1, 7));
        assert!(!states.raw_button(0, 7));
        assert_eq!(states.pov(1), 270);
    }

    // ==================== AxisRange Tests ====================

    #[test]
    fn test_normalize_stick() {
        assert_eq!(AxisRange::STICK.normalize(-32768), -1.0);
        assert_eq!(AxisRange::STICK.normalize(32767), 1.0);
        assert!(AxisRange::STICK.normalize(0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_trigger() {
        assert_eq!(AxisRange::TRIGGER.normalize(0), 0.0);
        assert_eq!(AxisRange::TRIGGER.normalize(255), 1.0);
        assert!((AxisRange::TRIGGER.normalize(128) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(AxisRange::TRIGGER.normalize(-10), 0.0);
        assert_eq!(AxisRange::TRIGGER.normalize(1000), 1.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        let range = AxisRange {
            min: 5,
            max: 5,
            kind: AxisKind::Bipolar,
        };
        assert_eq!(range.normalize(5), 0.0);
    }

    // ==================== HidMapper Tests ====================

    #[test]
    fn test_axis_channels() {
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_X), Some(0));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_Y), Some(1));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_Z), Some(2));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_RZ), Some(3));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_RX), Some(4));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_RY), Some(5));
        assert_eq!(channel_for_axis(AbsoluteAxisType::ABS_HAT0X), None);
    }

    #[test]
    fn test_button_numbers() {
        assert_eq!(button_for_key(Key::BTN_SOUTH), Some(0));
        assert_eq!(button_for_key(Key::BTN_START), Some(7));
        assert_eq!(button_for_key(Key::BTN_THUMBL), None);
    }

    #[test]
    fn test_process_axis_event() {
        let mut mapper = HidMapper::new();
        assert!(mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 32767)));
        assert_eq!(mapper.state().axes[axes::LEFT_X], 1.0);

        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_RZ, 255));
        assert_eq!(mapper.state().axes[axes::RIGHT_TRIGGER], 1.0);
    }

    #[test]
    fn test_process_key_event() {
        let mut mapper = HidMapper::new();
        mapper.process_event(&make_key_event(Key::BTN_TR, true));
        assert!(mapper.state().button(5));
        mapper.process_event(&make_key_event(Key::BTN_TR, false));
        assert!(!mapper.state().button(5));
    }

    #[test]
    fn test_process_dpad() {
        let mut mapper = HidMapper::new();
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0Y, 1));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, -1));
        assert_eq!(mapper.state().pov(), 225);
    }

    #[test]
    fn test_unknown_events_ignored() {
        let mut mapper = HidMapper::new();
        assert!(!mapper.process_event(&make_key_event(Key::BTN_THUMBL, true)));
        assert!(!mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_WHEEL, 3)));
        assert_eq!(*mapper.state(), HidState::default());
    }

    #[test]
    fn test_custom_ranges() {
        let mut ranges = DEFAULT_RANGES;
        ranges[axes::LEFT_X] = AxisRange {
            min: 0,
            max: 255,
            kind: AxisKind::Bipolar,
        };
        let mut mapper = HidMapper::with_ranges(ranges);
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 0));
        assert_eq!(mapper.state().axes[axes::LEFT_X], -1.0);
    }

    #[test]
    fn test_reset() {
        let mut mapper = HidMapper::new();
        mapper.process_event(&make_key_event(Key::BTN_SOUTH, true));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, -32768));
        mapper.reset();
        assert_eq!(*mapper.state(), HidState::default());
    }
}
