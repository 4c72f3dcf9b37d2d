use std::collections::VecDeque;

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::command::Command;
use crate::config::ControlConfig;
use crate::control::{ModeTransition, ThrottleController, TickStatus};
use crate::error::{AcquisitionError, CommandError, ConfigResult};
use crate::io::telemetry::{NullSink, RecordingSink, Tee, TelemetryRecord, TelemetrySink};
use crate::vehicle::{
    select_control_seat, Cockpit, ControlSource, DualSeat, RemoteControl, SeatCandidate, SeatKind,
};
use super::scenario::Scenario;
use super::script::{PilotScript, ScriptAction};
use super::vessel::{PointMassVessel, TICK_DT};

#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub dt: f64,
    pub max_ticks: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: TICK_DT,
            max_ticks: 60 * 60, // one minute
        }
    }
}

/// Everything observed during one closed-loop run.
#[derive(Debug, Clone, Default)]
pub struct SimRun {
    /// One record per controller call.
    pub trace: Vec<TelemetryRecord>,
    /// Host tick and status of every controller call.
    pub statuses: Vec<(u32, TickStatus)>,
    pub transitions: Vec<(u32, ModeTransition)>,
    pub rejected: Vec<(u32, CommandError)>,
    /// Main-seat discovery failures, one per controller call that hit one.
    pub seat_errors: Vec<(u32, AcquisitionError)>,
    /// True vessel velocity after every host tick.
    pub velocities: Vec<Vector3<f64>>,
}

impl SimRun {
    pub fn final_velocity(&self) -> Vector3<f64> {
        self.velocities.last().copied().unwrap_or_else(Vector3::zeros)
    }

    /// Last status reported at or before `tick`.
    pub fn status_at(&self, tick: u32) -> Option<TickStatus> {
        self.statuses.iter().rev().find(|(t, _)| *t <= tick).map(|(_, s)| *s)
    }
}

fn apply_action(
    vessel: &mut PointMassVessel,
    action: &ScriptAction,
    pending: &mut VecDeque<Command>,
    tick: u32,
    run: &mut SimRun,
) {
    match action {
        ScriptAction::Input(input) => vessel.set_input(*input),
        ScriptAction::Occupied(occupied) => vessel.set_occupied(*occupied),
        ScriptAction::RemoteOccupied(occupied) => vessel.set_remote_occupied(*occupied),
        ScriptAction::SeatPresent(present) => vessel.seat_present = *present,
        ScriptAction::InstallSeat(seat) => vessel.spare_seats.push(seat.clone()),
        ScriptAction::RemoveSeat(name) => vessel.spare_seats.retain(|s| s.name != *name),
        ScriptAction::VelocitySensor(on) => {
            vessel.velocity_sensor = *on;
            vessel.sync_seat();
        }
        ScriptAction::Command(text) => match text.parse::<Command>() {
            Ok(cmd) => pending.push_back(cmd),
            Err(e) => {
                warn!(tick, text = %text, error = %e, "operator command not understood");
                run.rejected.push((tick, e));
            }
        },
    }
}

fn own_seat(name: &str, kind: SeatKind) -> SeatCandidate {
    SeatCandidate {
        name: name.to_string(),
        kind,
        // the flown cockpit is the vessel's main cockpit unless a tag overrides it
        flagged_main: kind == SeatKind::Cockpit,
        working: true,
        on_own_body: true,
    }
}

/// Main-seat discovery over the vessel's seats. Candidates are the flown
/// cockpit (when present), then the remote, then any spare seats; a spare
/// seat that wins discovery resolves to nobody flying.
fn discover<'a>(
    cockpit: Option<&'a Cockpit>,
    remote: Option<&'a RemoteControl>,
    spares: &[SeatCandidate],
    tag: &str,
) -> Result<Option<DualSeat<'a>>, AcquisitionError> {
    let mut candidates = Vec::new();
    let cockpit_slot = cockpit.map(|c| {
        candidates.push(own_seat(&c.name, SeatKind::Cockpit));
        candidates.len() - 1
    });
    let remote_slot = remote.map(|r| {
        candidates.push(own_seat(&r.name, SeatKind::Remote));
        candidates.len() - 1
    });
    candidates.extend(spares.iter().cloned());

    let selection = select_control_seat(&candidates, tag)?;
    let cockpit_won = selection.cockpit.is_some() && selection.cockpit == cockpit_slot;
    let remote_won = selection.remote.is_some() && selection.remote == remote_slot;
    let seat = DualSeat {
        cockpit: cockpit.filter(|_| cockpit_won).map(|c| c as &dyn ControlSource),
        remote: remote.filter(|_| remote_won).map(|r| r as &dyn ControlSource),
    };
    if seat.cockpit.is_none() && seat.remote.is_none() {
        return Ok(None);
    }
    Ok(Some(seat))
}

/// Fly `vessel` under `controller` for `config.max_ticks` host ticks.
///
/// The controller is only called as often as its last `PollRate` asks;
/// commands arriving in between queue up and are delivered one per call.
pub fn simulate_with(
    controller: &mut ThrottleController,
    vessel: &mut PointMassVessel,
    script: &PilotScript,
    config: &SimConfig,
    telemetry: &mut dyn TelemetrySink,
) -> SimRun {
    let mut run = SimRun::default();
    let mut recorder = RecordingSink::default();
    let mut pending = VecDeque::new();
    let mut next_call = 0;
    let tag = controller.config().seat_tag.clone();

    controller.release_all(&mut vessel.bank);

    for tick in 0..config.max_ticks {
        for action in script.events_at(tick) {
            apply_action(vessel, action, &mut pending, tick, &mut run);
        }

        if tick >= next_call {
            let cockpit = vessel.seat_present.then_some(&vessel.seat);
            let seat = discover(cockpit, vessel.remote.as_ref(), &vessel.spare_seats, &tag);
            let source = match &seat {
                Ok(found) => Ok(found.as_ref().map(|d| d as &dyn ControlSource)),
                Err(e) => Err(e.clone()),
            };
            let command = pending.pop_front();
            let mut tee = Tee { first: &mut recorder, second: &mut *telemetry };
            let outcome = controller.tick_discovered(source, &mut vessel.bank, &mut tee, command);

            if outcome.status != TickStatus::Running {
                debug!(tick, status = ?outcome.status, "controller status");
            }
            run.statuses.push((tick, outcome.status));
            run.transitions.extend(outcome.transitions.into_iter().map(|t| (tick, t)));
            run.rejected.extend(outcome.rejected.map(|e| (tick, e)));
            run.seat_errors.extend(outcome.seat_error.map(|e| (tick, e)));
            next_call = tick + outcome.poll_rate.ticks();
        }

        vessel.step(config.dt);
        run.velocities.push(vessel.velocity);
    }

    run.trace = recorder.records;
    run
}

/// Run a preset scenario with the given tuning, discarding streamed telemetry.
pub fn simulate(config: &ControlConfig, scenario: Scenario) -> ConfigResult<SimRun> {
    let mut controller = ThrottleController::new(config.clone())?;
    let mut vessel = scenario.vessel();
    let sim = SimConfig { max_ticks: scenario.ticks(), ..SimConfig::default() };
    Ok(simulate_with(&mut controller, &mut vessel, &scenario.script(), &sim, &mut NullSink))
}
