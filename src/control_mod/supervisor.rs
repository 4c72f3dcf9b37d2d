use tracing::{info, warn};

use crate::dynamics::state::ControlState;
use crate::vehicle::ControlSource;
use super::modes::{emergency_stop, ModeTransition, TransitionCause};
use super::sink::CommandFrame;

// ---------------------------------------------------------------------------
// Safety supervisor: runs before any mode logic each tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Pilot present: run the mode state machine.
    Proceed,
    /// Pilot absent: overrides released, wait for them to return.
    Suspend,
    /// No control seat at all: groups must be rebuilt before resuming.
    Reacquire,
}

#[derive(Debug, Clone, Copy)]
pub struct SafetySupervisor {
    pub reset_mode_on_exit: bool,
}

impl SafetySupervisor {
    pub fn new(reset_mode_on_exit: bool) -> Self {
        Self { reset_mode_on_exit }
    }

    /// Gate one tick. Loss of control releases every override regardless of
    /// mode or target. Returns the verdict and any mode reset it forced.
    pub fn evaluate(
        &self,
        state: &mut ControlState,
        source: Option<&dyn ControlSource>,
        frame: &mut CommandFrame,
    ) -> (Verdict, Option<ModeTransition>) {
        let Some(source) = source else {
            if state.active {
                warn!("control seat lost, releasing thrusters");
            }
            state.active = false;
            state.taps.clear();
            let t = emergency_stop(state, true, TransitionCause::Supervisor, frame);
            return (Verdict::Reacquire, t);
        };

        if !source.is_under_control() {
            if state.active {
                info!(reset = self.reset_mode_on_exit, "pilot left the seat, releasing thrusters");
            }
            state.active = false;
            state.taps.clear();
            let t = emergency_stop(state, self.reset_mode_on_exit, TransitionCause::Supervisor, frame);
            return (Verdict::Suspend, t);
        }

        if !state.active {
            info!(mode = %state.flight_mode, "pilot back in control, resuming");
            state.active = true;
        }
        (Verdict::Proceed, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::control::TapDirection;
    use crate::dynamics::state::FlightMode;
    use crate::vehicle::Cockpit;

    fn cruising() -> ControlState {
        let mut s = ControlState::new(&ControlConfig::default());
        s.flight_mode = FlightMode::Decoupled;
        s.cruise_enabled = true;
        s.target_speed = 80.0;
        s
    }

    #[test]
    fn empty_seat_releases_and_resets() {
        let sup = SafetySupervisor::new(true);
        let mut s = cruising();
        let tick = s.tick;
        s.taps.press(TapDirection::Forward);
        s.taps.release(&tick);
        let mut frame = CommandFrame::default();
        let seat = Cockpit::new("Cockpit");
        let (verdict, t) = sup.evaluate(&mut s, Some(&seat), &mut frame);
        assert_eq!(verdict, Verdict::Suspend);
        assert!(frame.releases_all());
        assert!(!s.cruise_enabled);
        assert!(!s.active);
        assert_eq!(t.map(|t| t.to), Some(FlightMode::Normal));
        assert!(s.taps.channel(TapDirection::Forward).anchor().is_none());
    }

    #[test]
    fn mode_kept_when_policy_says_so() {
        let sup = SafetySupervisor::new(false);
        let mut s = cruising();
        let mut frame = CommandFrame::default();
        let (_, t) = sup.evaluate(&mut s, Some(&Cockpit::new("Cockpit")), &mut frame);
        assert!(t.is_none());
        assert_eq!(s.flight_mode, FlightMode::Decoupled);
        assert!(frame.releases_all());
    }

    #[test]
    fn missing_seat_forces_reacquire() {
        let sup = SafetySupervisor::new(false);
        let mut s = cruising();
        let mut frame = CommandFrame::default();
        let (verdict, _) = sup.evaluate(&mut s, None, &mut frame);
        assert_eq!(verdict, Verdict::Reacquire);
        assert_eq!(s.flight_mode, FlightMode::Normal);
    }

    #[test]
    fn returning_pilot_resumes() {
        let sup = SafetySupervisor::new(true);
        let mut s = cruising();
        s.active = false;
        let mut seat = Cockpit::new("Cockpit");
        seat.telemetry.occupied = true;
        let mut frame = CommandFrame::default();
        let (verdict, _) = sup.evaluate(&mut s, Some(&seat), &mut frame);
        assert_eq!(verdict, Verdict::Proceed);
        assert!(s.active);
        assert!(frame.is_empty());
    }
}
