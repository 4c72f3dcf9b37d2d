use std::fmt;

use crate::dynamics::state::InputVector;
use super::script::{PilotScript, ScriptAction};
use super::vessel::PointMassVessel;

const MASS: f64 = 20_000.0; // kg
const THRUST: f64 = 50_000.0; // N per thruster

// ---------------------------------------------------------------------------
// Preset flights
// ---------------------------------------------------------------------------

/// Scripted flights used by the binary, the demos and the integration tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Accelerate by hand, let go, and hold the speed.
    Cruise,
    /// Double-tap into Cruise+, then brake to re-capture a lower speed.
    CruisePlus,
    /// Hold a full 3-axis velocity after pulses on two axes.
    Decoupled,
    /// Pilot leaves mid-cruise, comes back, then the seat disappears.
    ExitSafety,
    /// Drive everything from operator text commands.
    Commands,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Cruise,
        Scenario::CruisePlus,
        Scenario::Decoupled,
        Scenario::ExitSafety,
        Scenario::Commands,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Cruise => "cruise",
            Scenario::CruisePlus => "cruise-plus",
            Scenario::Decoupled => "decoupled",
            Scenario::ExitSafety => "exit-safety",
            Scenario::Commands => "commands",
        }
    }

    pub fn vessel(self) -> PointMassVessel {
        PointMassVessel::standard(MASS, THRUST)
    }

    pub fn ticks(self) -> u32 {
        match self {
            Scenario::Cruise | Scenario::CruisePlus | Scenario::Commands => 1200,
            Scenario::Decoupled => 900,
            Scenario::ExitSafety => 1500,
        }
    }

    pub fn script(self) -> PilotScript {
        let script = PilotScript::new();
        match self {
            Scenario::Cruise => script.hold(30, 270, InputVector::FORWARD),
            Scenario::CruisePlus => script
                .double_tap(30, InputVector::FORWARD)
                .hold(60, 300, InputVector::FORWARD)
                .hold(600, 640, InputVector::BACKWARD),
            Scenario::Decoupled => script
                .command(10, "decoupled")
                .hold(20, 200, InputVector::FORWARD)
                .hold(250, 310, InputVector::new(1, 0, 0))
                .hold(350, 380, InputVector::new(0, -1, 0)),
            Scenario::ExitSafety => script
                .hold(30, 270, InputVector::FORWARD)
                .leave(600)
                .enter(900)
                .at(1100, ScriptAction::SeatPresent(false))
                .at(1200, ScriptAction::SeatPresent(true)),
            Scenario::Commands => script
                .command(10, "25")
                .command(300, "eco off")
                .command(400, "cruise+")
                .command(450, "warp 9")
                .command(500, "150")
                .command(900, "stop"),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
