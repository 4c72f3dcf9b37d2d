use crate::dynamics::state::InputVector;
use crate::vehicle::SeatCandidate;

/// Something the pilot (or the world) does at a given host tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    /// Hold this input until the next `Input` action.
    Input(InputVector),
    Occupied(bool),
    RemoteOccupied(bool),
    /// The control seat disappears (`false`) or comes back.
    SeatPresent(bool),
    /// Another seat shows up during discovery.
    InstallSeat(SeatCandidate),
    /// Remove every spare seat with this name.
    RemoveSeat(String),
    VelocitySensor(bool),
    /// Raw operator text, resolved by the runner.
    Command(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    pub tick: u32,
    pub action: ScriptAction,
}

/// Time-ordered pilot behavior for one run.
#[derive(Debug, Clone, Default)]
pub struct PilotScript {
    events: Vec<ScriptEvent>,
}

/// Ticks a button is held during a scripted tap.
const TAP_HOLD: u32 = 3;

impl PilotScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, tick: u32, action: ScriptAction) -> Self {
        self.events.push(ScriptEvent { tick, action });
        // stable: same-tick events keep insertion order
        self.events.sort_by_key(|e| e.tick);
        self
    }

    pub fn hold(self, from: u32, until: u32, input: InputVector) -> Self {
        self.at(from, ScriptAction::Input(input))
            .at(until, ScriptAction::Input(InputVector::IDLE))
    }

    /// Two short presses of `input` starting at `tick`.
    pub fn double_tap(self, tick: u32, input: InputVector) -> Self {
        let second = tick + 2 * TAP_HOLD;
        self.hold(tick, tick + TAP_HOLD, input)
            .hold(second, second + TAP_HOLD, input)
    }

    pub fn leave(self, tick: u32) -> Self {
        self.at(tick, ScriptAction::Occupied(false))
    }

    pub fn enter(self, tick: u32) -> Self {
        self.at(tick, ScriptAction::Occupied(true))
    }

    pub fn command(self, tick: u32, text: impl Into<String>) -> Self {
        self.at(tick, ScriptAction::Command(text.into()))
    }

    pub fn events(&self) -> &[ScriptEvent] {
        &self.events
    }

    pub fn events_at(&self, tick: u32) -> impl Iterator<Item = &ScriptAction> {
        self.events.iter().filter(move |e| e.tick == tick).map(|e| &e.action)
    }

    /// Last tick any event fires at.
    pub fn last_tick(&self) -> u32 {
        self.events.last().map(|e| e.tick).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_stay_sorted() {
        let s = PilotScript::new().command(50, "cruise").hold(10, 20, InputVector::FORWARD);
        let ticks: Vec<u32> = s.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![10, 20, 50]);
        assert_eq!(s.last_tick(), 50);
    }

    #[test]
    fn double_tap_is_two_presses() {
        let s = PilotScript::new().double_tap(100, InputVector::FORWARD);
        let presses = s
            .events()
            .iter()
            .filter(|e| e.action == ScriptAction::Input(InputVector::FORWARD))
            .count();
        assert_eq!(presses, 2);
        assert_eq!(s.last_tick(), 109);
    }
}
