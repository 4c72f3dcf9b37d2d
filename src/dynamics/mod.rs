pub mod state;

pub use state::{Axis, ControlState, FlightMode, InputVector, TickCounter};
