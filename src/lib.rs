//! # FRC Operator Interface Library
//!
//! Maps driver station joysticks to deadzoned robot control values.
//!
//! This library provides the operator interface for an FRC robot: it owns the
//! joystick bindings, reads raw axes, buttons and POV directions through a
//! [`JoystickSource`](controller::hid::JoystickSource), and returns
//! normalized values ready for drive code.

pub mod config;
pub mod controller;
pub mod error;
