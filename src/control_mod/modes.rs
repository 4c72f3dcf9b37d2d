use tracing::{debug, info};

use crate::config::ControlConfig;
use crate::dynamics::state::{ControlState, FlightMode, InputVector};
use super::channel::{CHANNELS, LATERAL, LONGITUDINAL, VERTICAL};
use super::debounce::{TapDirection, TapEvent};
use super::sink::{Actuation, CommandFrame};
use super::throttle::ThrottleCurve;

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    DoubleTap,
    Command,
    Supervisor,
    Acquisition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: FlightMode,
    pub to: FlightMode,
    pub cause: TransitionCause,
}

/// Switch modes directly. Entering or leaving Decoupled snaps the 3-axis
/// target to the measured velocity. Leaving it also hands the lateral and
/// vertical groups back and re-captures the cruise target, since no other
/// mode writes those axes. Entering Normal releases every override.
pub fn enter_mode(
    state: &mut ControlState,
    to: FlightMode,
    cause: TransitionCause,
    frame: &mut CommandFrame,
) -> Option<ModeTransition> {
    let from = state.flight_mode;
    if from == to {
        return None;
    }
    if from == FlightMode::Decoupled || to == FlightMode::Decoupled {
        state.hold_current_velocity();
    }
    if from == FlightMode::Decoupled {
        state.target_speed = state.current_velocity[LONGITUDINAL.axis.index()];
        if !frame.releases_all() {
            LATERAL.release(frame);
            VERTICAL.release(frame);
        }
    }
    if to == FlightMode::Normal && !frame.releases_all() {
        frame.push(Actuation::ReleaseAll);
        state.throttle = 0.0;
        state.secondary_throttle = 0.0;
    }
    state.flight_mode = to;
    // current_speed is measured differently in Decoupled
    let velocity = state.current_velocity;
    state.observe(velocity);
    info!(%from, %to, ?cause, "flight mode changed");
    Some(ModeTransition { from, to, cause })
}

/// Zero thrust: drop cruise, release every override and optionally fall
/// back to Normal.
pub fn emergency_stop(
    state: &mut ControlState,
    reset_mode: bool,
    cause: TransitionCause,
    frame: &mut CommandFrame,
) -> Option<ModeTransition> {
    state.cruise_enabled = false;
    state.throttle = 0.0;
    state.secondary_throttle = 0.0;
    if !frame.releases_all() {
        frame.push(Actuation::ReleaseAll);
    }
    if reset_mode {
        enter_mode(state, FlightMode::Normal, cause, frame)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Mode state machine
// ---------------------------------------------------------------------------

/// Per-mode target acquisition and correction. Holds only tuning; all
/// mutable data lives in `ControlState`.
#[derive(Debug, Clone, Copy)]
pub struct ModeMachine {
    pub curve: ThrottleCurve,
    pub dead_zone: f64,
}

impl ModeMachine {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            curve: ThrottleCurve::from_config(config),
            dead_zone: config.dead_zone,
        }
    }

    /// Run the current mode's body for one tick. Velocity telemetry in
    /// `state` must already be fresh.
    pub fn step(
        &self,
        state: &mut ControlState,
        input: InputVector,
        frame: &mut CommandFrame,
    ) -> Vec<ModeTransition> {
        let mut transitions = Vec::new();
        match state.flight_mode {
            FlightMode::Normal => self.normal(state, input, frame, &mut transitions),
            FlightMode::Cruise => self.cruise(state, input, false, frame, &mut transitions),
            FlightMode::CruisePlus => self.cruise(state, input, true, frame, &mut transitions),
            FlightMode::Decoupled => self.decoupled(state, input, frame, &mut transitions),
        }
        transitions
    }

    /// Watch for gestures only; never commands thrust.
    fn normal(
        &self,
        state: &mut ControlState,
        input: InputVector,
        frame: &mut CommandFrame,
        transitions: &mut Vec<ModeTransition>,
    ) {
        match input.forward {
            1 => state.taps.press(TapDirection::Forward),
            -1 => state.taps.press(TapDirection::Backward),
            _ => self.check_release(state, frame, transitions),
        }
    }

    /// Cruise and Cruise+. They differ only in what backward does: Cruise
    /// drops the target to zero and disengages, Cruise+ re-captures it.
    fn cruise(
        &self,
        state: &mut ControlState,
        input: InputVector,
        plus: bool,
        frame: &mut CommandFrame,
        transitions: &mut Vec<ModeTransition>,
    ) {
        match input.forward {
            1 => {
                state.cruise_enabled = true;
                state.target_speed = state.current_speed;
                self.release_for_pilot(state, frame);
                state.taps.press(TapDirection::Forward);
            }
            -1 => {
                if plus {
                    state.target_speed = state.current_speed;
                } else {
                    state.cruise_enabled = false;
                    state.target_speed = 0.0;
                }
                self.release_for_pilot(state, frame);
                state.taps.press(TapDirection::Backward);
            }
            _ => {
                if state.cruise_enabled {
                    let error = state.target_speed - state.current_speed;
                    let correction = LONGITUDINAL.correct(error, self.dead_zone, &self.curve);
                    LONGITUDINAL.command(correction, state.eco_mode, frame);
                    let pair = self.curve.pair(error);
                    state.throttle = pair.primary;
                    state.secondary_throttle = if state.eco_mode { pair.secondary } else { 0.0 };
                    debug!(error, throttle = state.throttle, "cruise correction");
                }
                self.check_release(state, frame, transitions);
            }
        }
    }

    /// Independent hold on all three axes. Eco split is not applied here.
    fn decoupled(
        &self,
        state: &mut ControlState,
        input: InputVector,
        frame: &mut CommandFrame,
        transitions: &mut Vec<ModeTransition>,
    ) {
        for ch in CHANNELS {
            if input.axis(ch.axis) != 0 {
                let i = ch.axis.index();
                state.cruise_enabled = true;
                state.target_velocity[i] = state.current_velocity[i];
                ch.release(frame);
            }
        }
        match input.forward {
            1 => state.taps.press(TapDirection::Forward),
            -1 => state.taps.press(TapDirection::Backward),
            _ => {}
        }
        if !input.is_idle() {
            return;
        }

        if state.cruise_enabled {
            let mut total = 0.0;
            for ch in CHANNELS {
                let i = ch.axis.index();
                let error = state.target_velocity[i] - state.current_velocity[i];
                let correction = ch.correct(error, self.dead_zone, &self.curve);
                ch.command(correction, false, frame);
                total += correction.drive_throttle();
            }
            state.throttle = total;
            state.secondary_throttle = 0.0;
        }
        self.check_release(state, frame, transitions);
    }

    fn release_for_pilot(&self, state: &mut ControlState, frame: &mut CommandFrame) {
        frame.push(Actuation::ReleaseAll);
        state.throttle = 0.0;
        state.secondary_throttle = 0.0;
    }

    fn check_release(
        &self,
        state: &mut ControlState,
        frame: &mut CommandFrame,
        transitions: &mut Vec<ModeTransition>,
    ) {
        let tick = state.tick;
        for event in state.taps.release(&tick) {
            if let Some(t) = apply_tap(state, event, frame) {
                transitions.push(t);
            }
        }
    }
}

/// Move along the hierarchy for one debounced gesture. Leaving any mode
/// above Normal by a retreat is an emergency stop.
pub fn apply_tap(
    state: &mut ControlState,
    event: TapEvent,
    frame: &mut CommandFrame,
) -> Option<ModeTransition> {
    match event {
        TapEvent::Advance => {
            let to = state.flight_mode.advance();
            enter_mode(state, to, TransitionCause::DoubleTap, frame)
        }
        TapEvent::Retreat => {
            if state.flight_mode == FlightMode::Normal {
                return None;
            }
            emergency_stop(state, false, TransitionCause::DoubleTap, frame);
            let to = state.flight_mode.retreat();
            enter_mode(state, to, TransitionCause::DoubleTap, frame)
        }
    }
}
