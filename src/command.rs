use std::str::FromStr;

use crate::config::ControlConfig;
use crate::dynamics::state::FlightMode;
use crate::error::{CommandError, CommandResult};

// ---------------------------------------------------------------------------
// Resolved external commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcoSwitch {
    On,
    Off,
    Toggle,
}

impl EcoSwitch {
    pub fn apply(self, current: bool) -> bool {
        match self {
            EcoSwitch::On => true,
            EcoSwitch::Off => false,
            EcoSwitch::Toggle => !current,
        }
    }
}

/// A request from the operator's command channel. These bypass the
/// double-tap hierarchy and take effect on the tick they arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Stop,
    SetMode(FlightMode),
    SetEco(EcoSwitch),
    SetTargetSpeed(f64),
}

impl Command {
    /// Range-check against the controller's limits.
    pub fn validate(&self, config: &ControlConfig) -> CommandResult<()> {
        if let Command::SetTargetSpeed(v) = *self {
            if !v.is_finite() {
                return Err(CommandError::InvalidTarget(v));
            }
            if !(0.0..=config.max_target_speed).contains(&v) {
                return Err(CommandError::TargetOutOfRange { value: v, max: config.max_target_speed });
            }
        }
        Ok(())
    }
}

/// Case-insensitive text form: `stop`, `normal`, `cruise`, `cruise+`,
/// `decoupled`, `eco`, `eco on`, `eco off`, or a target speed in m/s.
impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();
        let cmd = match words.as_slice() {
            ["stop"] => Command::Stop,
            ["normal"] => Command::SetMode(FlightMode::Normal),
            ["cruise"] => Command::SetMode(FlightMode::Cruise),
            ["cruise+"] => Command::SetMode(FlightMode::CruisePlus),
            ["decoupled"] => Command::SetMode(FlightMode::Decoupled),
            ["eco"] => Command::SetEco(EcoSwitch::Toggle),
            ["eco", "on"] => Command::SetEco(EcoSwitch::On),
            ["eco", "off"] => Command::SetEco(EcoSwitch::Off),
            [number] => match number.parse::<f64>() {
                Ok(v) if v.is_finite() => Command::SetTargetSpeed(v),
                Ok(v) => return Err(CommandError::InvalidTarget(v)),
                Err(_) => return Err(CommandError::Unrecognized(s.trim().to_string())),
            },
            _ => return Err(CommandError::Unrecognized(s.trim().to_string())),
        };
        Ok(cmd)
    }
}
