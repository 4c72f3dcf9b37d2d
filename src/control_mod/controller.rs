use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::ControlConfig;
use crate::dynamics::state::{ControlState, FlightMode, InputVector};
use crate::error::{AcquisitionError, CommandError, CommandResult, ConfigResult};
use crate::io::telemetry::{TelemetryRecord, TelemetrySink};
use crate::vehicle::{ActuatorGroups, ControlSource, Direction};
use super::eta::time_to_target;
use super::modes::{emergency_stop, enter_mode, ModeMachine, ModeTransition, TransitionCause};
use super::sink::{self, Actuation, CommandFrame, ThrusterBus};
use super::supervisor::{SafetySupervisor, Verdict};

// ---------------------------------------------------------------------------
// Tick outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No control seat; nothing is commanded.
    Unconfigured,
    /// Seat found but nobody in it yet. Actuators are not classified.
    AwaitingPilot,
    /// Actuators classified on this tick.
    Acquired,
    /// Pilot left. Overrides released, mode logic skipped.
    Suspended,
    Running,
}

/// How often the host should call `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRate {
    Fast,
    Slow,
}

impl PollRate {
    pub fn ticks(self) -> u32 {
        match self {
            PollRate::Fast => 1,
            PollRate::Slow => 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub status: TickStatus,
    pub poll_rate: PollRate,
    /// Everything written to the bus this tick, in order.
    pub frame: CommandFrame,
    pub transitions: Vec<ModeTransition>,
    pub rejected: Option<CommandError>,
    /// Why no control seat could be resolved, when that is the reason
    /// for `Unconfigured`.
    pub seat_error: Option<AcquisitionError>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// One control session: configuration, state and the classified actuator
/// groups, advanced by exactly one `tick` call per host tick.
pub struct ThrottleController {
    config: ControlConfig,
    state: ControlState,
    groups: Option<ActuatorGroups>,
    supervisor: SafetySupervisor,
    machine: ModeMachine,
    acquired_once: bool,
}

impl ThrottleController {
    pub fn new(config: ControlConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    pub fn with_defaults() -> Self {
        Self::from_valid(ControlConfig::default())
    }

    fn from_valid(config: ControlConfig) -> Self {
        Self {
            state: ControlState::new(&config),
            groups: None,
            supervisor: SafetySupervisor::new(config.reset_mode_on_exit),
            machine: ModeMachine::new(&config),
            acquired_once: false,
            config,
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ControlState {
        &mut self.state
    }

    pub fn groups(&self) -> Option<&ActuatorGroups> {
        self.groups.as_ref()
    }

    pub fn is_acquired(&self) -> bool {
        self.groups.is_some()
    }

    /// Disable every override on the bus. Call once at startup so a new
    /// session never inherits a previous one's thrust.
    pub fn release_all(&self, bus: &mut dyn ThrusterBus) {
        let mut frame = CommandFrame::default();
        frame.push(Actuation::ReleaseAll);
        sink::apply(&frame, self.groups.as_ref(), bus);
    }

    /// Forget the actuator groups; they are rebuilt on the next tick with a pilot.
    pub fn reacquire(&mut self) {
        if self.groups.take().is_some() {
            info!("actuator groups dropped, will reacquire");
        }
    }

    fn acquire(&mut self, bus: &dyn ThrusterBus, frame: &mut CommandFrame) -> Option<ModeTransition> {
        let groups = ActuatorGroups::classify(&bus.acquire());
        if groups.is_empty() {
            warn!("no thrusters aligned with a body axis");
        }
        info!(
            thrusters = groups.all().len(),
            unaligned = groups.unaligned(),
            "actuators acquired"
        );
        self.groups = Some(groups);
        self.state.active = true;

        if self.acquired_once {
            return None;
        }
        self.acquired_once = true;
        enter_mode(&mut self.state, self.config.acquire_mode, TransitionCause::Acquisition, frame)
    }

    /// Apply an operator command directly, bypassing the double-tap hierarchy.
    /// A rejected command leaves state untouched.
    pub fn apply_command(
        &mut self,
        command: Command,
        frame: &mut CommandFrame,
    ) -> CommandResult<Option<ModeTransition>> {
        if self.groups.is_none() {
            return Err(CommandError::NotReady);
        }
        command.validate(&self.config)?;
        info!(?command, "command accepted");

        let state = &mut self.state;
        let transition = match command {
            Command::Stop => emergency_stop(state, true, TransitionCause::Command, frame),
            Command::SetMode(mode) => {
                if mode == FlightMode::Normal && !frame.releases_all() {
                    frame.push(Actuation::ReleaseAll);
                }
                enter_mode(state, mode, TransitionCause::Command, frame)
            }
            Command::SetEco(switch) => {
                state.eco_mode = switch.apply(state.eco_mode);
                None
            }
            Command::SetTargetSpeed(speed) => {
                state.target_speed = speed;
                if speed > 0.0 {
                    state.cruise_enabled = true;
                } else if state.cruise_enabled {
                    state.cruise_enabled = false;
                    state.throttle = 0.0;
                    state.secondary_throttle = 0.0;
                    frame.push(Actuation::ReleaseAll);
                }
                None
            }
        };
        Ok(transition)
    }

    /// Advance one tick. Supervisor evaluation precedes mode logic, which
    /// precedes every bus write; telemetry is reported last.
    pub fn tick(
        &mut self,
        source: Option<&dyn ControlSource>,
        bus: &mut dyn ThrusterBus,
        telemetry: &mut dyn TelemetrySink,
        command: Option<Command>,
    ) -> TickOutcome {
        self.state.tick.advance();
        let mut frame = CommandFrame::default();
        let mut transitions = Vec::new();
        let mut rejected = None;

        let mut status = TickStatus::Running;
        if self.groups.is_none() {
            match source {
                Some(src) if src.is_under_control() => {
                    transitions.extend(self.acquire(bus, &mut frame));
                    status = TickStatus::Acquired;
                }
                _ => {
                    if let Some(cmd) = command {
                        warn!(?cmd, "command ignored before acquisition");
                        rejected = Some(CommandError::NotReady);
                    }
                    self.state.active = false;
                    let status = if source.is_some() {
                        TickStatus::AwaitingPilot
                    } else {
                        TickStatus::Unconfigured
                    };
                    self.report(telemetry, None);
                    return TickOutcome {
                        status,
                        poll_rate: PollRate::Slow,
                        frame,
                        transitions,
                        rejected,
                        seat_error: None,
                    };
                }
            }
        }

        let (verdict, forced) = self.supervisor.evaluate(&mut self.state, source, &mut frame);
        transitions.extend(forced);

        let mut run_modes = verdict == Verdict::Proceed;
        if run_modes {
            match source.and_then(|s| s.velocity()) {
                Some(v) => self.state.observe(v),
                None => {
                    debug!("velocity unavailable, skipping mode logic");
                    run_modes = false;
                }
            }
        }

        if verdict != Verdict::Reacquire {
            if let Some(cmd) = command {
                match self.apply_command(cmd, &mut frame) {
                    Ok(t) => transitions.extend(t),
                    Err(e) => {
                        warn!(error = %e, "command rejected");
                        rejected = Some(e);
                    }
                }
            }
        } else if command.is_some() {
            rejected = Some(CommandError::NotReady);
        }

        if run_modes {
            let input = source.map(|s| s.input()).unwrap_or(InputVector::IDLE);
            transitions.extend(self.machine.step(&mut self.state, input, &mut frame));
        }

        sink::apply(&frame, self.groups.as_ref(), bus);

        let mass = source.and_then(|s| s.mass());
        self.report(telemetry, mass);

        match verdict {
            Verdict::Reacquire => self.reacquire(),
            Verdict::Suspend => status = TickStatus::Suspended,
            Verdict::Proceed => {}
        }
        let status = if verdict == Verdict::Reacquire { TickStatus::Unconfigured } else { status };
        let poll_rate = match status {
            TickStatus::Running | TickStatus::Acquired => PollRate::Fast,
            _ => PollRate::Slow,
        };
        TickOutcome { status, poll_rate, frame, transitions, rejected, seat_error: None }
    }

    /// Advance one tick from the result of main-seat discovery. A discovery
    /// failure is handled like a missing seat and carried on the outcome;
    /// discovery is expected to run again next tick.
    pub fn tick_discovered(
        &mut self,
        seat: Result<Option<&dyn ControlSource>, AcquisitionError>,
        bus: &mut dyn ThrusterBus,
        telemetry: &mut dyn TelemetrySink,
        command: Option<Command>,
    ) -> TickOutcome {
        match seat {
            Ok(source) => self.tick(source, bus, telemetry, command),
            Err(e) => {
                warn!(error = %e, "control seat unavailable");
                let mut outcome = self.tick(None, bus, telemetry, command);
                outcome.seat_error = Some(e);
                outcome
            }
        }
    }

    /// Seconds to the cruise target using the forward group, if defined.
    /// Decoupled holds a vector, so there is no single target to reach.
    pub fn eta(&self, mass: Option<f64>) -> Option<f64> {
        if self.state.flight_mode == FlightMode::Decoupled {
            return None;
        }
        let groups = self.groups.as_ref()?;
        time_to_target(
            self.state.target_speed,
            self.state.current_speed,
            groups.capacity(Direction::Forward),
            mass,
            self.config.time_offset,
        )
    }

    fn report(&self, telemetry: &mut dyn TelemetrySink, mass: Option<f64>) {
        let s = &self.state;
        telemetry.report(&TelemetryRecord {
            tick: s.tick.value(),
            current_speed: s.current_speed,
            target_speed: s.target_speed,
            throttle: s.throttle,
            eta_seconds: self.eta(mass),
            flight_mode: s.flight_mode,
            eco_mode: s.eco_mode,
            cruise_enabled: s.cruise_enabled,
            active: s.active,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::telemetry::RecordingSink;
    use crate::vehicle::{
        Actuator, ActuatorBuilder, ActuatorId, Cockpit, DualSeat, FuelKind, Override, RemoteControl,
    };
    use nalgebra::Vector3;
    use std::collections::BTreeMap;

    struct Bus {
        actuators: Vec<Actuator>,
        state: BTreeMap<ActuatorId, Override>,
    }

    impl ThrusterBus for Bus {
        fn acquire(&self) -> Vec<Actuator> {
            self.actuators.clone()
        }

        fn write(&mut self, id: ActuatorId, value: Override) {
            self.state.insert(id, value);
        }
    }

    fn bus() -> Bus {
        let mut actuators = Vec::new();
        for (i, dir) in Direction::ALL.iter().enumerate() {
            actuators.push(ActuatorBuilder::new(i).push_axis(dir.unit()).max_thrust(1000.0).build());
        }
        actuators.push(
            ActuatorBuilder::new(6)
                .push_axis(Vector3::z())
                .max_thrust(1000.0)
                .fuel(FuelKind::Chemical)
                .build(),
        );
        Bus { actuators, state: BTreeMap::new() }
    }

    fn seated(forward_speed: f64) -> Cockpit {
        let mut seat = Cockpit::new("Cockpit [cruise]");
        seat.telemetry.occupied = true;
        seat.telemetry.velocity = Some(Vector3::new(0.0, 0.0, forward_speed));
        seat.telemetry.mass = Some(2000.0);
        seat
    }

    #[test]
    fn waits_for_a_pilot_before_acquiring() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();

        let out = ctl.tick(None, &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Unconfigured);
        assert_eq!(out.poll_rate, PollRate::Slow);

        let empty = Cockpit::new("Cockpit");
        let out = ctl.tick(Some(&empty), &mut bus, &mut sink, Some(Command::Stop));
        assert_eq!(out.status, TickStatus::AwaitingPilot);
        assert_eq!(out.rejected, Some(CommandError::NotReady));
        assert!(bus.state.is_empty());

        let seat = seated(0.0);
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Acquired);
        assert_eq!(out.transitions[0].to, FlightMode::Cruise);
        assert_eq!(out.transitions[0].cause, TransitionCause::Acquisition);
        assert_eq!(sink.records.len(), 3);
    }

    #[test]
    fn target_command_drives_forward_group() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let seat = seated(10.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, None);

        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(12.0)));
        assert_eq!(out.status, TickStatus::Running);
        assert!(ctl.state().cruise_enabled);
        // eco on: electric gets the full curve, chemical the eco curve
        assert_eq!(bus.state[&ActuatorId(0)], Override::Fraction(1.0));
        match bus.state[&ActuatorId(6)] {
            Override::Fraction(f) => assert!((f - 0.4).abs() < 1e-12),
            other => panic!("chemical thruster not split: {other:?}"),
        }
        assert!(!bus.state.contains_key(&ActuatorId(1)));

        let last = sink.records.last().unwrap();
        assert_eq!(last.target_speed, 12.0);
        let expected = 2.0 / ((2000.0 / 2000.0) * 0.35);
        assert!((last.eta_seconds.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn pilot_leaving_releases_everything() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut seat = seated(10.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(30.0)));

        seat.telemetry.occupied = false;
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Suspended);
        assert_eq!(out.poll_rate, PollRate::Slow);
        assert!(bus.state.values().all(|v| *v == Override::Disabled));
        assert_eq!(ctl.state().flight_mode, FlightMode::Normal);
        assert!(!ctl.state().cruise_enabled);
        assert!(!sink.records.last().unwrap().active);
    }

    #[test]
    fn lost_seat_forces_reacquisition() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let seat = seated(0.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert!(ctl.is_acquired());

        let out = ctl.tick(None, &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Unconfigured);
        assert!(!ctl.is_acquired());
        assert!(bus.state.values().all(|v| *v == Override::Disabled));

        // second acquisition keeps the supervisor's Normal
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Acquired);
        assert_eq!(ctl.state().flight_mode, FlightMode::Normal);
    }

    #[test]
    fn decoupled_command_from_normal_snaps_targets() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut seat = seated(0.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetMode(FlightMode::Normal)));
        assert_eq!(ctl.state().flight_mode, FlightMode::Normal);

        seat.telemetry.velocity = Some(Vector3::new(1.0, 2.0, 15.0));
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetMode(FlightMode::Decoupled)));
        assert_eq!(out.transitions.len(), 1);
        assert_eq!(out.transitions[0].cause, TransitionCause::Command);
        assert_eq!(ctl.state().flight_mode, FlightMode::Decoupled);
        assert_eq!(ctl.state().target_velocity, Vector3::new(1.0, 2.0, 15.0));
    }

    #[test]
    fn rejected_command_leaves_state_alone() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let seat = seated(5.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        let before = ctl.state().clone();

        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(250.0)));
        assert!(matches!(out.rejected, Some(CommandError::TargetOutOfRange { .. })));
        assert_eq!(ctl.state().target_speed, before.target_speed);
        assert_eq!(ctl.state().cruise_enabled, before.cruise_enabled);
    }

    #[test]
    fn velocity_gap_commands_nothing() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut seat = seated(5.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(20.0)));
        bus.state.clear();

        seat.telemetry.velocity = None;
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert!(out.frame.is_empty());
        assert!(bus.state.is_empty());
        assert_eq!(out.status, TickStatus::Running);
    }

    #[test]
    fn stop_resets_to_normal() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let seat = seated(5.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(20.0)));
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::Stop));
        assert!(out.frame.releases_all());
        assert_eq!(ctl.state().flight_mode, FlightMode::Normal);
        assert!(!ctl.state().cruise_enabled);
    }

    #[test]
    fn missing_mass_leaves_eta_undefined() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut seat = seated(5.0);
        seat.telemetry.mass = None;
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(20.0)));
        assert_eq!(sink.records[0].eta_seconds, None);
    }

    #[test]
    fn leaving_decoupled_by_command_frees_side_thrusters() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut seat = seated(10.0);
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetTargetSpeed(10.0)));
        ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetMode(FlightMode::Decoupled)));

        // drifting right: decoupled pushes left at full
        seat.telemetry.velocity = Some(Vector3::new(2.0, 0.0, 10.0));
        ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        assert_eq!(bus.state[&ActuatorId(4)], Override::Fraction(1.0));
        assert_eq!(sink.records.last().unwrap().eta_seconds, None);

        seat.telemetry.velocity = Some(Vector3::new(2.0, 0.0, 12.0));
        let out = ctl.tick(Some(&seat), &mut bus, &mut sink, Some(Command::SetMode(FlightMode::Cruise)));
        assert_eq!(out.transitions[0].from, FlightMode::Decoupled);
        for id in 2..6 {
            assert_eq!(bus.state[&ActuatorId(id)], Override::Disabled, "thruster {id}");
        }
        assert_eq!(ctl.state().target_speed, 12.0);

        for _ in 0..30 {
            ctl.tick(Some(&seat), &mut bus, &mut sink, None);
        }
        for id in 2..6 {
            assert_eq!(bus.state[&ActuatorId(id)], Override::Disabled, "thruster {id}");
        }
    }

    #[test]
    fn remote_keeps_control_after_cockpit_empties() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let mut cockpit = seated(10.0);
        let mut remote = RemoteControl::new("Remote !main");
        remote.telemetry.velocity = Some(Vector3::new(0.0, 0.0, 10.0));
        remote.telemetry.mass = Some(2000.0);

        let dual = DualSeat { cockpit: Some(&cockpit), remote: Some(&remote) };
        let out = ctl.tick(Some(&dual), &mut bus, &mut sink, Some(Command::SetTargetSpeed(12.0)));
        assert_eq!(out.status, TickStatus::Acquired);

        remote.telemetry.occupied = true;
        cockpit.telemetry.occupied = false;
        let dual = DualSeat { cockpit: Some(&cockpit), remote: Some(&remote) };
        let out = ctl.tick(Some(&dual), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Running);
        assert!(ctl.state().cruise_enabled);
        assert_eq!(bus.state[&ActuatorId(0)], Override::Fraction(1.0));

        remote.telemetry.occupied = false;
        let dual = DualSeat { cockpit: Some(&cockpit), remote: Some(&remote) };
        let out = ctl.tick(Some(&dual), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Suspended);
        assert!(bus.state.values().all(|v| *v == Override::Disabled));
    }

    #[test]
    fn discovery_failure_is_reported_and_retried() {
        let mut ctl = ThrottleController::with_defaults();
        let mut bus = bus();
        let mut sink = RecordingSink::default();
        let err = AcquisitionError::AmbiguousControlSeat { cockpits: 2, remotes: 0 };

        let out = ctl.tick_discovered(Err(err.clone()), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Unconfigured);
        assert_eq!(out.poll_rate, PollRate::Slow);
        assert_eq!(out.seat_error, Some(err));
        assert!(bus.state.is_empty());

        let seat = seated(0.0);
        let out = ctl.tick_discovered(Ok(Some(&seat as &dyn ControlSource)), &mut bus, &mut sink, None);
        assert_eq!(out.status, TickStatus::Acquired);
        assert_eq!(out.seat_error, None);
    }
}
