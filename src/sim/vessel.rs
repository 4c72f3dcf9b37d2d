use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::control::ThrusterBus;
use crate::dynamics::state::{Axis, InputVector};
use crate::vehicle::{
    Actuator, ActuatorBuilder, ActuatorId, Cockpit, ControlSource, Direction, DualSeat, FuelKind,
    Override, RemoteControl, SeatCandidate,
};

/// Host tick length, s. The controller runs at 60 ticks per second.
pub const TICK_DT: f64 = 1.0 / 60.0;

/// Fraction a released thruster fires per m/s of drift while damping.
const DAMPENER_GAIN: f64 = 0.5;

// ---------------------------------------------------------------------------
// Thruster bank
// ---------------------------------------------------------------------------

/// The vessel's thrusters and their current overrides. Anything never
/// written reads as released.
#[derive(Debug, Clone, Default)]
pub struct ThrusterBank {
    actuators: Vec<Actuator>,
    overrides: BTreeMap<ActuatorId, Override>,
    writes: usize,
}

impl ThrusterBank {
    pub fn new(actuators: Vec<Actuator>) -> Self {
        Self { actuators, overrides: BTreeMap::new(), writes: 0 }
    }

    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    pub fn override_of(&self, id: ActuatorId) -> Override {
        self.overrides.get(&id).copied().unwrap_or(Override::Disabled)
    }

    /// No thruster carries an override.
    pub fn all_released(&self) -> bool {
        self.overrides.values().all(|v| *v == Override::Disabled)
    }

    /// Total bus writes since construction.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// True when any thruster pushing along `axis` is overridden. Overrides
    /// on an axis keep the dampeners off it.
    fn axis_overridden(&self, axis: Axis) -> bool {
        self.actuators.iter().any(|a| {
            Direction::from_push_axis(&a.push_axis).map(|d| d.axis()) == Some(axis)
                && matches!(self.override_of(a.id), Override::Fraction(_))
        })
    }
}

impl ThrusterBus for ThrusterBank {
    fn acquire(&self) -> Vec<Actuator> {
        self.actuators.clone()
    }

    fn write(&mut self, id: ActuatorId, value: Override) {
        self.writes += 1;
        self.overrides.insert(id, value);
    }
}

// ---------------------------------------------------------------------------
// Point-mass vessel
// ---------------------------------------------------------------------------

/// Rigid point mass in free space with axis-aligned thrusters, flown from a
/// cockpit and optionally a remote. Released thrusters behave like stock
/// flight control: pilot input fires the matching group, otherwise
/// dampeners oppose drift.
#[derive(Debug, Clone)]
pub struct PointMassVessel {
    pub seat: Cockpit,
    pub remote: Option<RemoteControl>,
    /// Further seats the host reports during main-seat discovery. Nobody
    /// ever flies them.
    pub spare_seats: Vec<SeatCandidate>,
    pub bank: ThrusterBank,
    pub velocity: Vector3<f64>, // m/s, body frame
    pub mass: f64,              // kg
    pub dampeners: bool,
    /// When false the controller sees no control seat at all.
    pub seat_present: bool,
    /// When false the seat reports no velocity.
    pub velocity_sensor: bool,
}

impl PointMassVessel {
    pub fn new(mass: f64, actuators: Vec<Actuator>) -> Self {
        let mut vessel = Self {
            seat: Cockpit::new("Cockpit [cruise]"),
            remote: None,
            spare_seats: Vec::new(),
            bank: ThrusterBank::new(actuators),
            velocity: Vector3::zeros(),
            mass,
            dampeners: true,
            seat_present: true,
            velocity_sensor: true,
        };
        vessel.seat.telemetry.occupied = true;
        vessel.sync_seat();
        vessel
    }

    /// One electric thruster per direction plus a chemical pair on the
    /// longitudinal axis, all rated at `thrust` newtons.
    pub fn standard(mass: f64, thrust: f64) -> Self {
        let mut actuators: Vec<Actuator> = Direction::ALL
            .iter()
            .enumerate()
            .map(|(i, d)| ActuatorBuilder::new(i).push_axis(d.unit()).max_thrust(thrust).build())
            .collect();
        for (i, d) in [(6, Direction::Forward), (7, Direction::Backward)] {
            actuators.push(
                ActuatorBuilder::new(i)
                    .push_axis(d.unit())
                    .max_thrust(thrust)
                    .fuel(FuelKind::Chemical)
                    .build(),
            );
        }
        Self::new(mass, actuators)
    }

    /// Add an empty main remote control station.
    pub fn with_remote(mut self) -> Self {
        self.remote = Some(RemoteControl::new("Remote Control !main"));
        self.sync_seat();
        self
    }

    pub fn set_input(&mut self, input: InputVector) {
        self.seat.telemetry.indicator = input.to_indicator();
    }

    pub fn set_occupied(&mut self, occupied: bool) {
        self.seat.telemetry.occupied = occupied;
    }

    /// No-op on a vessel without a remote.
    pub fn set_remote_occupied(&mut self, occupied: bool) {
        if let Some(remote) = self.remote.as_mut() {
            remote.telemetry.occupied = occupied;
        }
    }

    /// Copy the true state into every seat's sensor readings.
    pub fn sync_seat(&mut self) {
        let velocity = self.velocity_sensor.then_some(self.velocity);
        self.seat.telemetry.velocity = velocity;
        self.seat.telemetry.mass = Some(self.mass);
        if let Some(remote) = self.remote.as_mut() {
            remote.telemetry.velocity = velocity;
            remote.telemetry.mass = Some(self.mass);
        }
    }

    /// Stick input from whichever seat is being flown.
    fn pilot_input(&self) -> InputVector {
        DualSeat {
            cockpit: Some(&self.seat),
            remote: self.remote.as_ref().map(|r| r as &dyn ControlSource),
        }
        .input()
    }

    /// Fraction a released thruster fires at.
    fn baseline(&self, dir: Direction, input: InputVector) -> f64 {
        let axis = dir.axis();
        let sign = if dir.is_positive() { 1.0 } else { -1.0 };
        let pilot = input.axis(axis) as f64;
        if pilot != 0.0 {
            return if pilot == sign { 1.0 } else { 0.0 };
        }
        if !self.dampeners || self.bank.axis_overridden(axis) {
            return 0.0;
        }
        let drift = self.velocity[axis.index()];
        if drift * sign < 0.0 {
            (drift.abs() * DAMPENER_GAIN).min(1.0)
        } else {
            0.0
        }
    }

    /// Net thrust, N, body frame.
    pub fn thrust(&self) -> Vector3<f64> {
        let input = self.pilot_input();
        let mut force = Vector3::zeros();
        for a in self.bank.actuators() {
            let fraction = match self.bank.override_of(a.id) {
                Override::Fraction(f) => f,
                Override::Disabled => match Direction::from_push_axis(&a.push_axis) {
                    Some(dir) => self.baseline(dir, input),
                    None => 0.0,
                },
            };
            if let Some(unit) = a.push_axis.try_normalize(1e-9) {
                force += unit * a.max_thrust * fraction;
            }
        }
        force
    }

    /// Explicit Euler step.
    pub fn step(&mut self, dt: f64) {
        if self.mass > 0.0 {
            self.velocity += self.thrust() / self.mass * dt;
        }
        self.sync_seat();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_thrusters_follow_the_pilot() {
        let mut v = PointMassVessel::standard(1000.0, 500.0);
        v.set_input(InputVector::FORWARD);
        // electric + chemical forward at full
        assert_eq!(v.thrust(), Vector3::new(0.0, 0.0, 1000.0));
    }

    #[test]
    fn dampeners_oppose_drift_only_on_free_axes() {
        let mut v = PointMassVessel::standard(1000.0, 500.0);
        v.velocity = Vector3::new(0.0, 0.0, 10.0);
        assert!(v.thrust().z < 0.0);

        v.bank.write(ActuatorId(0), Override::Fraction(0.0001));
        let f = v.thrust();
        assert!(f.z > 0.0 && f.z < 1.0);
    }

    #[test]
    fn override_wins_over_input() {
        let mut v = PointMassVessel::standard(1000.0, 500.0);
        v.dampeners = false;
        v.bank.write(ActuatorId(6), Override::Fraction(0.5));
        v.bank.write(ActuatorId(0), Override::Fraction(0.5));
        v.set_input(InputVector::BACKWARD);
        // overridden forward pair still pushes, released backward pair follows input
        assert_eq!(v.thrust(), Vector3::new(0.0, 0.0, 500.0 - 1000.0));
    }

    #[test]
    fn step_integrates_velocity() {
        let mut v = PointMassVessel::standard(1000.0, 500.0);
        v.dampeners = false;
        v.bank.write(ActuatorId(0), Override::Fraction(1.0));
        v.step(0.5);
        assert!((v.velocity.z - 0.25).abs() < 1e-12);
        assert_eq!(v.seat.telemetry.velocity, Some(v.velocity));
    }

    #[test]
    fn remote_shares_the_sensors() {
        let mut v = PointMassVessel::standard(1000.0, 500.0).with_remote();
        v.velocity = Vector3::new(0.0, 0.0, 3.0);
        v.sync_seat();
        let remote = v.remote.as_ref().unwrap();
        assert_eq!(remote.telemetry.velocity, Some(v.velocity));
        assert_eq!(remote.telemetry.mass, Some(1000.0));
        assert!(!remote.is_under_control());
        v.set_remote_occupied(true);
        assert!(v.remote.as_ref().unwrap().is_under_control());
    }
}
