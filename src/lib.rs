pub mod command;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod vehicle;
mod control_mod;
pub mod sim;
pub mod io;

// The control module: expose control_mod as `control` publicly
pub mod control {
    pub use crate::control_mod::*;
}

// Flat re-exports for host integrations
pub mod types {
    pub use crate::command::{Command, EcoSwitch};
    pub use crate::config::ControlConfig;
    pub use crate::control_mod::{ThrottleController, ThrusterBus, TickOutcome, TickStatus};
    pub use crate::dynamics::state::{ControlState, FlightMode, InputVector};
    pub use crate::vehicle::{Actuator, ActuatorId, ControlSource, Override};
}
