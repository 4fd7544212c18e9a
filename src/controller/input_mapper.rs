//! # Input Mapper Module
//!
//! Owns the driver station joysticks and turns their raw readings into robot
//! control values.
//!
//! Each joystick gets 8 raw button bindings (buttons 0-7) and 8 POV bindings
//! (0°, 45°, ..., 315°), built once at construction. Analog accessors read
//! the raw channel, flip the Y axes so that pushing up is positive, and run
//! the result through the deadzone.
//!
//! Controller, button and POV indices are preconditions: an index past the
//! configured counts panics.
//!
//! ## Usage
//!
//! ```
//! use frc_oi::controller::hid::{axes, HidState};
//! use frc_oi::controller::input_mapper::InputMapper;
//!
//! let mut driver = HidState::default();
//! driver.axes[axes::LEFT_Y] = -0.5; // stick pushed forward
//! driver.set_button(0, true);
//!
//! let oi = InputMapper::new(vec![driver, HidState::default()]);
//! assert!(oi.left_y(0) > 0.0);
//! assert!(oi.get(oi.button(0, 0)));
//! ```

use tracing::debug;

use super::deadzone::Deadzone;
use super::hid::{axes, JoystickSource, BUTTON_COUNT, POV_COUNT, POV_STEP_DEGREES};
use crate::config::Config;

/// Number of joysticks the operator interface drives by default.
pub const DEFAULT_DEVICE_COUNT: usize = 2;

/// What a [`DigitalInput`] is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A physical button number.
    Raw(usize),
    /// A POV angle in degrees.
    Pov(i32),
}

/// A polled boolean signal on one joystick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigitalInput {
    port: usize,
    binding: Binding,
}

impl DigitalInput {
    fn raw(port: usize, button: usize) -> Self {
        Self {
            port,
            binding: Binding::Raw(button),
        }
    }

    fn pov(port: usize, angle: i32) -> Self {
        Self {
            port,
            binding: Binding::Pov(angle),
        }
    }

    /// Driver station port this input belongs to.
    #[must_use]
    pub fn port(&self) -> usize {
        self.port
    }

    /// What this input is wired to.
    #[must_use]
    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// Polls the input.
    ///
    /// A POV input is pressed only when the D-pad reports exactly its angle.
    pub fn get<S: JoystickSource + ?Sized>(&self, source: &S) -> bool {
        match self.binding {
            Binding::Raw(button) => source.raw_button(self.port, button),
            Binding::Pov(angle) => source.pov(self.port) == angle,
        }
    }
}

/// One driver station joystick and its prebuilt bindings.
#[derive(Debug, Clone)]
pub struct Joystick {
    port: usize,
    raw_buttons: [DigitalInput; BUTTON_COUNT],
    pov_buttons: [DigitalInput; POV_COUNT],
}

impl Joystick {
    /// Builds the bindings for `port`.
    #[must_use]
    pub fn new(port: usize) -> Self {
        Self {
            port,
            raw_buttons: std::array::from_fn(|button| DigitalInput::raw(port, button)),
            pov_buttons: std::array::from_fn(|index| {
                // index < POV_COUNT, so the cast cannot truncate
                DigitalInput::pov(port, index as i32 * POV_STEP_DEGREES)
            }),
        }
    }

    /// Driver station port.
    #[must_use]
    pub fn port(&self) -> usize {
        self.port
    }

    /// Raw button bindings, indexed by button number.
    #[must_use]
    pub fn raw_buttons(&self) -> &[DigitalInput; BUTTON_COUNT] {
        &self.raw_buttons
    }

    /// POV bindings, indexed by direction (angle / 45).
    #[must_use]
    pub fn pov_buttons(&self) -> &[DigitalInput; POV_COUNT] {
        &self.pov_buttons
    }
}

/// All six mapped axes of one joystick, read together.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisSnapshot {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
    pub left_trigger: f64,
    pub right_trigger: f64,
}

/// Maps raw joystick readings to deadzoned control values.
///
/// The mapper owns its [`JoystickSource`] and every joystick binding for its
/// whole lifetime. All state is fixed at construction; every accessor is an
/// independent read.
#[derive(Debug)]
pub struct InputMapper<S> {
    source: S,
    sticks: Vec<Joystick>,
    deadzone: Deadzone,
}

impl<S: JoystickSource> InputMapper<S> {
    /// Creates a mapper for [`DEFAULT_DEVICE_COUNT`] joysticks with the default deadzone.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_config(source, DEFAULT_DEVICE_COUNT, Deadzone::default())
    }

    /// Creates a mapper for `device_count` joysticks.
    #[must_use]
    pub fn with_config(source: S, device_count: usize, deadzone: Deadzone) -> Self {
        let sticks: Vec<Joystick> = (0..device_count).map(Joystick::new).collect();
        debug!(
            "Built {} joysticks with {} buttons and {} POV directions each (deadzone {})",
            sticks.len(),
            BUTTON_COUNT,
            POV_COUNT,
            deadzone.threshold()
        );

        Self {
            source,
            sticks,
            deadzone,
        }
    }

    /// Creates a mapper from the `[joysticks]` configuration section.
    #[must_use]
    pub fn from_config(source: S, config: &Config) -> Self {
        Self::with_config(
            source,
            config.joysticks.count,
            Deadzone::new(config.joysticks.deadzone),
        )
    }

    /// Number of joysticks.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.sticks.len()
    }

    /// Deadzone applied to every axis.
    #[must_use]
    pub fn deadzone(&self) -> Deadzone {
        self.deadzone
    }

    /// The underlying hardware source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Joystick on `controller`.
    pub fn joystick(&self, controller: usize) -> &Joystick {
        &self.sticks[controller]
    }

    fn read_axis(&self, controller: usize, axis: usize) -> f64 {
        let port = self.joystick(controller).port();
        self.source.raw_axis(port, axis)
    }

    /// Left stick X, right = positive.
    pub fn left_x(&self, controller: usize) -> f64 {
        self.deadzone.apply(self.read_axis(controller, axes::LEFT_X))
    }

    /// Left stick Y, up = positive.
    pub fn left_y(&self, controller: usize) -> f64 {
        self.deadzone.apply(-self.read_axis(controller, axes::LEFT_Y))
    }

    /// Right stick X, right = positive.
    pub fn right_x(&self, controller: usize) -> f64 {
        self.deadzone.apply(self.read_axis(controller, axes::RIGHT_X))
    }

    /// Right stick Y, up = positive.
    pub fn right_y(&self, controller: usize) -> f64 {
        self.deadzone.apply(-self.read_axis(controller, axes::RIGHT_Y))
    }

    /// Left trigger, deadzoned like a stick.
    pub fn left_trigger(&self, controller: usize) -> f64 {
        self.deadzone.apply(self.read_axis(controller, axes::LEFT_TRIGGER))
    }

    /// Right trigger, deadzoned like a stick.
    pub fn right_trigger(&self, controller: usize) -> f64 {
        self.deadzone.apply(self.read_axis(controller, axes::RIGHT_TRIGGER))
    }

    /// Reads all six axes of `controller`.
    pub fn sample(&self, controller: usize) -> AxisSnapshot {
        AxisSnapshot {
            left_x: self.left_x(controller),
            left_y: self.left_y(controller),
            right_x: self.right_x(controller),
            right_y: self.right_y(controller),
            left_trigger: self.left_trigger(controller),
            right_trigger: self.right_trigger(controller),
        }
    }

    /// Raw button binding `button` (0-7) on `controller`.
    pub fn button(&self, controller: usize, button: usize) -> &DigitalInput {
        &self.joystick(controller).raw_buttons[button]
    }

    /// POV binding `pov` (0-7, at `pov * 45` degrees) on `controller`.
    pub fn pov_button(&self, controller: usize, pov: usize) -> &DigitalInput {
        &self.joystick(controller).pov_buttons[pov]
    }

    /// Polls a binding against this mapper's source.
    pub fn get(&self, input: &DigitalInput) -> bool {
        input.get(&self.source)
    }

    /// Whether raw button `button` on `controller` is held.
    pub fn is_button_pressed(&self, controller: usize, button: usize) -> bool {
        self.get(self.button(controller, button))
    }

    /// Whether POV direction `pov` on `controller` is held.
    pub fn is_pov_pressed(&self, controller: usize, pov: usize) -> bool {
        self.get(self.pov_button(controller, pov))
    }
}
