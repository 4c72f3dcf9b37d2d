use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dynamics::state::FlightMode;
use crate::error::{ConfigError, ConfigResult};

// ---------------------------------------------------------------------------
// Controller tuning
// ---------------------------------------------------------------------------

/// Tuning and policy knobs. Every field has a default, so a TOML file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Slope of the quadratic throttle curve. Higher holds speed tighter
    /// but jitters more.
    pub gain: f64,
    /// Gain used for chemical-fuel thrusters while eco mode is on.
    /// 0 keeps them idle, `gain` makes eco mode a no-op.
    pub eco_gain: f64,
    pub max_output: f64,
    /// Keep-alive fraction; also the value both groups float at inside the dead zone.
    pub idle_floor: f64,
    pub dead_zone: f64, // m/s, symmetric
    pub eco_mode: bool,
    /// Drop back to Normal when the pilot leaves the seat.
    pub reset_mode_on_exit: bool,
    pub double_tap_window: u32, // ticks, 60 per second
    pub time_offset: f64,
    pub tick_modulus: u32,
    pub max_target_speed: f64, // m/s
    /// Mode selected the first time actuators are acquired.
    pub acquire_mode: FlightMode,
    /// Name fragment that marks a cockpit or remote as the main control seat.
    pub seat_tag: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            gain: 1.5,
            eco_gain: 0.1,
            max_output: 1.0,
            idle_floor: 0.0001,
            dead_zone: 0.0,
            eco_mode: true,
            reset_mode_on_exit: true,
            double_tap_window: 15,
            time_offset: 0.35,
            tick_modulus: 2_000_000_000,
            max_target_speed: 100.0,
            acquire_mode: FlightMode::Cruise,
            seat_tag: "!main".to_string(),
        }
    }
}

impl ControlConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: ControlConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let finite = [
            ("gain", self.gain),
            ("eco_gain", self.eco_gain),
            ("max_output", self.max_output),
            ("idle_floor", self.idle_floor),
            ("dead_zone", self.dead_zone),
            ("time_offset", self.time_offset),
            ("max_target_speed", self.max_target_speed),
        ];
        for (field, value) in finite {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{value} must be finite and non-negative")));
            }
        }
        if self.max_output > 1.0 || self.max_output == 0.0 {
            return Err(invalid("max_output", "must be in (0, 1]".into()));
        }
        if self.idle_floor > self.max_output {
            return Err(invalid("idle_floor", "exceeds max_output".into()));
        }
        if self.eco_gain > self.gain {
            return Err(invalid("eco_gain", format!("must not exceed gain ({})", self.gain)));
        }
        if self.seat_tag.trim().is_empty() {
            return Err(invalid("seat_tag", "must not be blank".into()));
        }
        if self.tick_modulus == 0 {
            return Err(invalid("tick_modulus", "must be positive".into()));
        }
        if self.double_tap_window == 0 || self.double_tap_window >= self.tick_modulus / 2 {
            return Err(invalid(
                "double_tap_window",
                "must be positive and under half the tick modulus".into(),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
