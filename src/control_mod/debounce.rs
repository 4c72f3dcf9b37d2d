use crate::dynamics::state::TickCounter;

// ---------------------------------------------------------------------------
// Double-tap detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDirection {
    Forward,
    Backward,
}

/// Debounced gesture, consumed once by the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEvent {
    /// Double tap forward: move up the mode hierarchy.
    Advance,
    /// Double tap backward: move down the mode hierarchy.
    Retreat,
}

/// Release tracking for one direction.
///
/// Both directions share one policy: a release that pairs with the anchor
/// fires the event and consumes the anchor, so the next tap starts a fresh
/// gesture. A release that does not pair becomes the new anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapChannel {
    held: bool,
    anchor: Option<u32>,
}

impl TapChannel {
    pub fn press(&mut self) {
        self.held = true;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn anchor(&self) -> Option<u32> {
        self.anchor
    }

    /// Called on a tick with no input in this direction.
    pub fn release(&mut self, tick: &TickCounter, window: u32) -> bool {
        if !self.held {
            return false;
        }
        self.held = false;
        match self.anchor {
            Some(anchor) if tick.since(anchor) <= window => {
                self.anchor = None;
                true
            }
            _ => {
                self.anchor = Some(tick.value());
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleTapDebouncer {
    window: u32,
    forward: TapChannel,
    backward: TapChannel,
}

impl DoubleTapDebouncer {
    pub fn new(window: u32) -> Self {
        Self {
            window,
            forward: TapChannel::default(),
            backward: TapChannel::default(),
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn press(&mut self, dir: TapDirection) {
        self.channel_mut(dir).press();
    }

    pub fn channel(&self, dir: TapDirection) -> &TapChannel {
        match dir {
            TapDirection::Forward => &self.forward,
            TapDirection::Backward => &self.backward,
        }
    }

    fn channel_mut(&mut self, dir: TapDirection) -> &mut TapChannel {
        match dir {
            TapDirection::Forward => &mut self.forward,
            TapDirection::Backward => &mut self.backward,
        }
    }

    /// Check both directions for a completed gesture. Forward is evaluated
    /// first, so a simultaneous pair yields `[Advance, Retreat]`.
    pub fn release(&mut self, tick: &TickCounter) -> Vec<TapEvent> {
        let mut events = Vec::new();
        if self.forward.release(tick, self.window) {
            events.push(TapEvent::Advance);
        }
        if self.backward.release(tick, self.window) {
            events.push(TapEvent::Retreat);
        }
        events
    }

    /// Forget held keys and anchors.
    pub fn clear(&mut self) {
        self.forward = TapChannel::default();
        self.backward = TapChannel::default();
    }
}
