pub mod runner;
pub mod scenario;
pub mod script;
pub mod vessel;

pub use runner::{simulate, simulate_with, SimConfig, SimRun};
pub use scenario::Scenario;
pub use script::{PilotScript, ScriptAction, ScriptEvent};
pub use vessel::{PointMassVessel, ThrusterBank, TICK_DT};
