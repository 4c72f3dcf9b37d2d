pub mod actuator;
pub mod groups;
pub mod seat;

pub use actuator::{Actuator, ActuatorBuilder, ActuatorId, FuelKind, Override};
pub use groups::{ActuatorGroups, Direction, GroupMember};
pub use seat::{
    select_control_seat, Cockpit, ControlSource, DualSeat, RemoteControl, SeatCandidate, SeatKind,
    SeatSelection, SeatTelemetry,
};
