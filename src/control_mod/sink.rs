use tracing::trace;

use crate::vehicle::{Actuator, ActuatorGroups, ActuatorId, Direction, FuelKind, GroupMember, Override};

// ---------------------------------------------------------------------------
// Thruster bus: the host side of every actuator write
// ---------------------------------------------------------------------------

/// Access to the vessel's thrusters.
pub trait ThrusterBus {
    /// Every thruster currently attached to the vessel. Called on
    /// (re-)acquisition only.
    fn acquire(&self) -> Vec<Actuator>;

    /// Write one thruster's override for this tick.
    fn write(&mut self, id: ActuatorId, value: Override);
}

// ---------------------------------------------------------------------------
// Command frame: per-tick actuator intent, applied after mode evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Actuation {
    /// Release every thruster on the vessel, grouped or not.
    ReleaseAll,
    Release(Direction),
    Set { group: Direction, fraction: f64 },
    /// Chemical-fuel thrusters get `secondary`, the rest `primary`.
    Split { group: Direction, primary: f64, secondary: f64 },
}

/// Ordered list of writes for one tick. Later entries win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandFrame {
    pub actions: Vec<Actuation>,
}

impl CommandFrame {
    pub fn push(&mut self, action: Actuation) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn releases_all(&self) -> bool {
        self.actions.contains(&Actuation::ReleaseAll)
    }

    /// Last fraction written to a group in this frame, if any.
    pub fn fraction_for(&self, dir: Direction) -> Option<f64> {
        self.actions.iter().rev().find_map(|a| match *a {
            Actuation::Set { group, fraction } if group == dir => Some(fraction),
            Actuation::Split { group, primary, .. } if group == dir => Some(primary),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Group writes
// ---------------------------------------------------------------------------

pub fn set_fraction(bus: &mut dyn ThrusterBus, group: &[GroupMember], value: f64) {
    let value = value.clamp(0.0, 1.0);
    for m in group {
        bus.write(m.id, Override::Fraction(value));
    }
}

pub fn set_split_fraction(bus: &mut dyn ThrusterBus, group: &[GroupMember], primary: f64, secondary: f64) {
    let primary = primary.clamp(0.0, 1.0);
    let secondary = secondary.clamp(0.0, 1.0);
    for m in group {
        let value = match m.fuel {
            FuelKind::Chemical => secondary,
            FuelKind::Electric => primary,
        };
        bus.write(m.id, Override::Fraction(value));
    }
}

pub fn disable_override(bus: &mut dyn ThrusterBus, ids: impl IntoIterator<Item = ActuatorId>) {
    for id in ids {
        bus.write(id, Override::Disabled);
    }
}

/// Release everything the bus reports, for use before groups exist.
pub fn release_bus(bus: &mut dyn ThrusterBus) {
    let ids: Vec<ActuatorId> = bus.acquire().iter().map(|a| a.id).collect();
    disable_override(bus, ids);
}

/// Write a frame to the bus. Without groups only `ReleaseAll` can be honored.
pub fn apply(frame: &CommandFrame, groups: Option<&ActuatorGroups>, bus: &mut dyn ThrusterBus) {
    for action in &frame.actions {
        trace!(?action, "actuate");
        match (*action, groups) {
            (Actuation::ReleaseAll, Some(g)) => disable_override(bus, g.all().iter().copied()),
            (Actuation::ReleaseAll, None) => release_bus(bus),
            (Actuation::Release(dir), Some(g)) => {
                disable_override(bus, g.group(dir).iter().map(|m| m.id))
            }
            (Actuation::Set { group, fraction }, Some(g)) => set_fraction(bus, g.group(group), fraction),
            (Actuation::Split { group, primary, secondary }, Some(g)) => {
                set_split_fraction(bus, g.group(group), primary, secondary)
            }
            (_, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::ActuatorBuilder;
    use nalgebra::Vector3;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Bus {
        actuators: Vec<Actuator>,
        state: BTreeMap<ActuatorId, Override>,
        writes: usize,
    }

    impl ThrusterBus for Bus {
        fn acquire(&self) -> Vec<Actuator> {
            self.actuators.clone()
        }

        fn write(&mut self, id: ActuatorId, value: Override) {
            self.writes += 1;
            self.state.insert(id, value);
        }
    }

    fn bus() -> Bus {
        Bus {
            actuators: vec![
                ActuatorBuilder::new(0).push_axis(Vector3::z()).build(),
                ActuatorBuilder::new(1).push_axis(Vector3::z()).fuel(FuelKind::Chemical).build(),
                ActuatorBuilder::new(2).push_axis(-Vector3::z()).build(),
                ActuatorBuilder::new(3).push_axis(Vector3::new(1.0, 1.0, 0.0)).build(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn split_routes_secondary_to_chemical() {
        let mut bus = bus();
        let groups = ActuatorGroups::classify(&bus.acquire());
        set_split_fraction(&mut bus, groups.group(Direction::Forward), 0.8, 0.05);
        assert_eq!(bus.state[&ActuatorId(0)], Override::Fraction(0.8));
        assert_eq!(bus.state[&ActuatorId(1)], Override::Fraction(0.05));
        assert!(!bus.state.contains_key(&ActuatorId(2)));
    }

    #[test]
    fn disable_is_idempotent() {
        let mut bus = bus();
        let groups = ActuatorGroups::classify(&bus.acquire());
        let ids: Vec<_> = groups.group(Direction::Forward).iter().map(|m| m.id).collect();
        disable_override(&mut bus, ids.clone());
        let once = bus.state.clone();
        disable_override(&mut bus, ids);
        assert_eq!(bus.state, once);
    }

    #[test]
    fn release_all_reaches_unaligned_thrusters() {
        let mut bus = bus();
        let groups = ActuatorGroups::classify(&bus.acquire());
        let mut frame = CommandFrame::default();
        frame.push(Actuation::Set { group: Direction::Backward, fraction: 0.5 });
        frame.push(Actuation::ReleaseAll);
        apply(&frame, Some(&groups), &mut bus);
        assert_eq!(bus.state.len(), 4);
        assert!(bus.state.values().all(|v| *v == Override::Disabled));
    }

    #[test]
    fn fractions_are_clamped() {
        let mut bus = bus();
        let groups = ActuatorGroups::classify(&bus.acquire());
        set_fraction(&mut bus, groups.group(Direction::Backward), 1.7);
        assert_eq!(bus.state[&ActuatorId(2)], Override::Fraction(1.0));
    }

    #[test]
    fn without_groups_only_release_all_is_written() {
        let mut bus = bus();
        let mut frame = CommandFrame::default();
        frame.push(Actuation::Set { group: Direction::Forward, fraction: 0.5 });
        apply(&frame, None, &mut bus);
        assert_eq!(bus.writes, 0);
        frame.push(Actuation::ReleaseAll);
        apply(&frame, None, &mut bus);
        assert_eq!(bus.writes, 4);
    }
}
