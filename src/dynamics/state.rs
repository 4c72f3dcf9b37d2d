use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::control::debounce::DoubleTapDebouncer;
use crate::config::ControlConfig;

// ---------------------------------------------------------------------------
// Body-frame axes
// ---------------------------------------------------------------------------

/// Principal body axes. Velocity vectors are stored as `[right, up, forward]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Lateral,      // +right / -left
    Vertical,     // +up / -down
    Longitudinal, // +forward / -backward
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Lateral, Axis::Vertical, Axis::Longitudinal];

    /// Component index into a body-frame `Vector3`.
    pub fn index(self) -> usize {
        match self {
            Axis::Lateral => 0,
            Axis::Vertical => 1,
            Axis::Longitudinal => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Pilot input
// ---------------------------------------------------------------------------

/// Discretized pilot intent for one tick, each component in {-1, 0, 1}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputVector {
    pub right: i8,
    pub up: i8,
    pub forward: i8,
}

impl InputVector {
    pub const IDLE: InputVector = InputVector { right: 0, up: 0, forward: 0 };
    pub const FORWARD: InputVector = InputVector { right: 0, up: 0, forward: 1 };
    pub const BACKWARD: InputVector = InputVector { right: 0, up: 0, forward: -1 };

    pub fn new(right: i8, up: i8, forward: i8) -> Self {
        Self {
            right: right.signum(),
            up: up.signum(),
            forward: forward.signum(),
        }
    }

    /// Discretize an analog move indicator (`[right, up, forward]`, each in
    /// [-1, 1]). Deflections under half travel count as no input.
    pub fn from_indicator(indicator: &Vector3<f64>) -> Self {
        let step = |v: f64| -> i8 {
            if v >= 0.5 {
                1
            } else if v <= -0.5 {
                -1
            } else {
                0
            }
        };
        Self {
            right: step(indicator.x),
            up: step(indicator.y),
            forward: step(indicator.z),
        }
    }

    pub fn to_indicator(self) -> Vector3<f64> {
        Vector3::new(self.right as f64, self.up as f64, self.forward as f64)
    }

    pub fn axis(&self, axis: Axis) -> i8 {
        match axis {
            Axis::Lateral => self.right,
            Axis::Vertical => self.up,
            Axis::Longitudinal => self.forward,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.right == 0 && self.up == 0 && self.forward == 0
    }
}

// ---------------------------------------------------------------------------
// Flight modes
// ---------------------------------------------------------------------------

/// Operating modes, ordered along the double-tap hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlightMode {
    #[default]
    Normal,
    Cruise,
    CruisePlus,
    Decoupled,
}

impl FlightMode {
    /// Next mode up the hierarchy, capped at `Decoupled`.
    pub fn advance(self) -> Self {
        match self {
            FlightMode::Normal => FlightMode::Cruise,
            FlightMode::Cruise => FlightMode::CruisePlus,
            FlightMode::CruisePlus | FlightMode::Decoupled => FlightMode::Decoupled,
        }
    }

    /// Next mode down the hierarchy, floored at `Normal`.
    pub fn retreat(self) -> Self {
        match self {
            FlightMode::Normal | FlightMode::Cruise => FlightMode::Normal,
            FlightMode::CruisePlus => FlightMode::Cruise,
            FlightMode::Decoupled => FlightMode::CruisePlus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FlightMode::Normal => "NORMAL",
            FlightMode::Cruise => "CRUISE",
            FlightMode::CruisePlus => "CRUISE+",
            FlightMode::Decoupled => "DECOUPLED",
        }
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tick counter
// ---------------------------------------------------------------------------

/// Monotonic tick counter that wraps to zero at `modulus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCounter {
    value: u32,
    modulus: u32,
}

impl TickCounter {
    pub fn new(modulus: u32) -> Self {
        Self { value: 0, modulus: modulus.max(1) }
    }

    /// Start at an arbitrary tick (taken modulo the bound).
    pub fn starting_at(value: u32, modulus: u32) -> Self {
        let modulus = modulus.max(1);
        Self { value: value % modulus, modulus }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    pub fn advance(&mut self) -> u32 {
        self.value = if self.value + 1 >= self.modulus { 0 } else { self.value + 1 };
        self.value
    }

    /// Shortest distance between the current tick and `earlier` on the ring.
    pub fn since(&self, earlier: u32) -> u32 {
        let m = u64::from(self.modulus);
        let a = u64::from(self.value);
        let b = u64::from(earlier) % m;
        let forward = (a + m - b) % m;
        forward.min(m - forward) as u32
    }
}

// ---------------------------------------------------------------------------
// Control state
// ---------------------------------------------------------------------------

/// All mutable controller state. One instance per session, handed by
/// reference to every per-tick routine.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub flight_mode: FlightMode,
    pub cruise_enabled: bool,
    pub target_speed: f64,              // m/s, Normal/Cruise/Cruise+
    pub target_velocity: Vector3<f64>,  // m/s, body frame, Decoupled
    pub current_speed: f64,             // m/s
    pub current_velocity: Vector3<f64>, // m/s, body frame
    pub eco_mode: bool,
    pub throttle: f64,           // last primary fraction, telemetry only
    pub secondary_throttle: f64, // last eco fraction, telemetry only
    pub active: bool,
    pub tick: TickCounter,
    pub taps: DoubleTapDebouncer,
}

impl ControlState {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            flight_mode: FlightMode::Normal,
            cruise_enabled: false,
            target_speed: 0.0,
            target_velocity: Vector3::zeros(),
            current_speed: 0.0,
            current_velocity: Vector3::zeros(),
            eco_mode: config.eco_mode,
            throttle: 0.0,
            secondary_throttle: 0.0,
            active: true,
            tick: TickCounter::new(config.tick_modulus),
            taps: DoubleTapDebouncer::new(config.double_tap_window),
        }
    }

    /// Refresh velocity telemetry. Mode logic only ever reads these.
    pub fn observe(&mut self, velocity: Vector3<f64>) {
        self.current_velocity = velocity;
        self.current_speed = match self.flight_mode {
            FlightMode::Decoupled => velocity.norm(),
            _ => velocity[Axis::Longitudinal.index()],
        };
    }

    /// Snap every Decoupled target component to the measured velocity.
    pub fn hold_current_velocity(&mut self) {
        self.target_velocity = self.current_velocity;
    }
}
