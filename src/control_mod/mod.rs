pub mod channel;
pub mod controller;
pub mod debounce;
pub mod eta;
pub mod modes;
pub mod sink;
pub mod supervisor;
pub mod throttle;

pub use controller::{PollRate, ThrottleController, TickOutcome, TickStatus};
pub use debounce::{DoubleTapDebouncer, TapDirection, TapEvent};
pub use eta::time_to_target;
pub use modes::{ModeMachine, ModeTransition, TransitionCause};
pub use sink::{Actuation, CommandFrame, ThrusterBus};
pub use supervisor::{SafetySupervisor, Verdict};
pub use throttle::{throttle, ThrottleCurve, ThrottlePair};
