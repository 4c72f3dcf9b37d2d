use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Actuator definition (one thruster, owned by the host environment)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActuatorId(pub usize);

/// Propellant family. Eco mode biases thrust away from `Chemical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FuelKind {
    #[default]
    Electric,
    Chemical,
}

/// Value written to a thruster each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Override {
    /// Hand control back to the baseline dampeners.
    Disabled,
    /// Commanded fraction of maximum thrust, in [0, 1].
    Fraction(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actuator {
    pub id: ActuatorId,
    pub push_axis: Vector3<f64>, // body frame [right, up, forward], direction of the force on the vessel
    pub max_thrust: f64,         // N
    pub fuel: FuelKind,
}

// ---------------------------------------------------------------------------
// Actuator builder
// ---------------------------------------------------------------------------

pub struct ActuatorBuilder {
    id: ActuatorId,
    push_axis: Vector3<f64>,
    max_thrust: f64,
    fuel: FuelKind,
}

impl ActuatorBuilder {
    pub fn new(id: usize) -> Self {
        Self {
            id: ActuatorId(id),
            push_axis: Vector3::z(),
            max_thrust: 100_000.0,
            fuel: FuelKind::Electric,
        }
    }

    pub fn push_axis(mut self, v: Vector3<f64>) -> Self { self.push_axis = v; self }
    pub fn max_thrust(mut self, v: f64) -> Self { self.max_thrust = v; self }
    pub fn fuel(mut self, v: FuelKind) -> Self { self.fuel = v; self }

    pub fn build(self) -> Actuator {
        Actuator {
            id: self.id,
            push_axis: self.push_axis,
            max_thrust: self.max_thrust,
            fuel: self.fuel,
        }
    }
}
