//! # Deadzone Module
//!
//! Controller sticks are a little loose, so readings near rest are noise.
//! Values whose magnitude is below the threshold are forced to exactly 0.0,
//! and the remaining travel is rescaled so that the point just past the
//! threshold maps to 0.0 instead of jumping to ±threshold.
//!
//! The formula used is: `output = sign(v) * (|v| - t) / (1 - t)`
//!
//! ## Usage
//!
//! ```
//! use frc_oi::controller::deadzone::{deadzone, Deadzone};
//!
//! assert_eq!(deadzone(0.005), 0.0);
//! assert_eq!(deadzone(1.0), 1.0);
//!
//! let wide = Deadzone::new(0.1);
//! assert!((wide.apply(0.55) - 0.5).abs() < 1e-9);
//! ```

/// Default deadzone threshold.
pub const DEFAULT_DEADZONE: f64 = 0.01;

/// Largest threshold accepted by [`Deadzone::new`].
pub const MAX_DEADZONE: f64 = 0.25;

/// Applies the default 0.01 deadzone to a raw axis value in -1.0..=1.0.
///
/// # Examples
///
/// ```
/// use frc_oi::controller::deadzone::deadzone;
///
/// assert_eq!(deadzone(-0.009), 0.0);
/// assert!((deadzone(0.5) - 0.49 / 0.99).abs() < 1e-12);
/// assert_eq!(deadzone(-1.0), -1.0);
/// ```
#[must_use]
pub fn deadzone(value: f64) -> f64 {
    Deadzone::default().apply(value)
}

/// Deadzone with a configurable threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadzone {
    /// Threshold as a fraction of full travel (0.0 to 0.25).
    threshold: f64,
}

impl Default for Deadzone {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEADZONE,
        }
    }
}

impl Deadzone {
    /// Creates a deadzone with the given threshold.
    ///
    /// Thresholds outside `0.0..=0.25` are clamped; NaN falls back to the default.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        if threshold.is_nan() {
            return Self::default();
        }
        Self {
            threshold: threshold.clamp(0.0, MAX_DEADZONE),
        }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Applies the deadzone and rescale to a raw value.
    ///
    /// # Arguments
    ///
    /// * `value` - Raw axis value (-1.0 to 1.0)
    ///
    /// # Returns
    ///
    /// 0.0 when `|value| < threshold`, otherwise the rescaled value with the
    /// sign of `value`.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        let magnitude = value.abs();
        if magnitude < self.threshold {
            return 0.0;
        }
        if magnitude == 0.0 {
            // Zero threshold: avoid returning -0.0 for negative zero input
            return 0.0;
        }

        value.signum() * (magnitude - self.threshold) / (1.0 - self.threshold)
    }
}
