//! # Controller Module
//!
//! Joystick input handling for the operator interface.
//!
//! This module handles:
//! - Gamepad detection and polling via evdev
//! - Normalizing raw axis, button and D-pad readings
//! - Applying the stick deadzone
//! - Mapping joysticks to robot control values and button bindings

pub mod deadzone;
pub mod evdev_source;
pub mod hid;
pub mod input_mapper;
