//! # FRC OI Monitor
//!
//! Polls the driver station joysticks at the robot control loop rate and logs
//! the mapped values.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Set up logging with tracing subscriber
//!    - Load configuration (defaults when no file is given)
//!    - Open gamepads and start one reader thread per port
//!
//! 2. **Main Loop**
//!    - Every `period_ms` (20 ms by default), sample every joystick
//!    - Log axes, held buttons and POV direction every `log_interval_loops`
//!    - Handle Ctrl+C for graceful shutdown
//!
//! Expected output:
//! ```text
//! INFO frc_oi: FRC OI v0.1.0 starting...
//! INFO frc_oi::controller::evdev_source: Found gamepad at: /dev/input/event17
//! INFO frc_oi: Port 0: lx=+0.000 ly=+0.495 rx=+0.000 ry=+0.000 lt=+0.000 rt=+0.000 buttons=[0] pov=none
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use frc_oi::config::Config;
use frc_oi::controller::evdev_source::DriverStation;
use frc_oi::controller::hid::{JoystickSource, BUTTON_COUNT};
use frc_oi::controller::input_mapper::{Binding, InputMapper};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("FRC OI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(path)?
        }
        None => {
            debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let (station, readers) = DriverStation::connect(&config.joysticks)?;
    info!(
        "{} of {} joystick ports attached",
        readers.len(),
        config.joysticks.count
    );

    let oi = InputMapper::from_config(station, &config);

    let mut loop_interval = interval(Duration::from_millis(config.control_loop.period_ms));

    info!(
        "Starting control loop every {}ms",
        config.control_loop.period_ms
    );
    info!("Press Ctrl+C to exit");

    let mut loop_count: u64 = 0;

    loop {
        tokio::select! {
            _ = loop_interval.tick() => {
                loop_count += 1;

                if loop_count % config.control_loop.log_interval_loops == 0 {
                    for controller in 0..oi.device_count() {
                        info!("Port {}: {}", controller, describe(&oi, controller));
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total control loops: {}", loop_count);
                break;
            }
        }
    }

    Ok(())
}

/// Raw buttons currently held on `controller`
fn pressed_buttons<S: JoystickSource>(oi: &InputMapper<S>, controller: usize) -> Vec<usize> {
    (0..BUTTON_COUNT)
        .filter(|&button| oi.is_button_pressed(controller, button))
        .collect()
}

/// Angle of the POV direction held on `controller`, if any
fn pressed_pov<S: JoystickSource>(oi: &InputMapper<S>, controller: usize) -> Option<i32> {
    oi.joystick(controller)
        .pov_buttons()
        .iter()
        .find(|input| oi.get(input))
        .and_then(|input| match input.binding() {
            Binding::Pov(angle) => Some(angle),
            Binding::Raw(_) => None,
        })
}

/// One-line summary of a joystick's mapped state
fn describe<S: JoystickSource>(oi: &InputMapper<S>, controller: usize) -> String {
    let axes = oi.sample(controller);
    let pov = pressed_pov(oi, controller)
        .map_or_else(|| "none".to_string(), |angle| angle.to_string());
    format!(
        "lx={:+.3} ly={:+.3} rx={:+.3} ry={:+.3} lt={:+.3} rt={:+.3} buttons={:?} pov={}",
        axes.left_x,
        axes.left_y,
        axes.right_x,
        axes.right_y,
        axes.left_trigger,
        axes.right_trigger,
        pressed_buttons(oi, controller),
        pov
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use frc_oi::controller::hid::{axes, HidState};

    fn mapper(state: HidState) -> InputMapper<Vec<HidState>> {
        InputMapper::new(vec![state, HidState::default()])
    }

    #[test]
    fn test_args_parse_config_path() {
        let args = Args::parse_from(["frc-oi", "--config", "robot.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("robot.toml")));

        let args = Args::parse_from(["frc-oi"]);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_pressed_buttons() {
        let mut state = HidState::default();
        state.set_button(0, true);
        state.set_button(6, true);

        let oi = mapper(state);
        assert_eq!(pressed_buttons(&oi, 0), vec![0, 6]);
        assert!(pressed_buttons(&oi, 1).is_empty());
    }

    #[test]
    fn test_pressed_pov() {
        let mut state = HidState::default();
        state.dpad_x = 1;

        let oi = mapper(state);
        assert_eq!(pressed_pov(&oi, 0), Some(90));
        assert_eq!(pressed_pov(&oi, 1), None);
    }

    #[test]
    fn test_describe_neutral() {
        let oi = mapper(HidState::default());
        let line = describe(&oi, 1);
        assert!(line.contains("lx=+0.000"));
        assert!(line.contains("buttons=[]"));
        assert!(line.ends_with("pov=none"));
    }

    #[test]
    fn test_describe_inverts_y() {
        let mut state = HidState::default();
        state.axes[axes::LEFT_Y] = -1.0;

        let oi = mapper(state);
        assert!(describe(&oi, 0).contains("ly=+1.000"));
    }
}
