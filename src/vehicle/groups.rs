use nalgebra::Vector3;
use tracing::debug;

use crate::dynamics::state::Axis;
use super::actuator::{Actuator, ActuatorId, FuelKind};

/// Off-axis components larger than this fraction of the norm disqualify an
/// actuator from every group.
const ALIGNMENT_TOLERANCE: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Canonical push directions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Forward | Direction::Backward => Axis::Longitudinal,
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Left | Direction::Right => Axis::Lateral,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Direction::Forward | Direction::Up | Direction::Right)
    }

    pub fn unit(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.axis().index()] = if self.is_positive() { 1.0 } else { -1.0 };
        v
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Direction a push axis is aligned with, if it lies on a principal axis.
    pub fn from_push_axis(v: &Vector3<f64>) -> Option<Direction> {
        let norm = v.norm();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        let idx = v.iamax();
        let off_axis = (0..3).filter(|&i| i != idx).map(|i| v[i].abs()).fold(0.0_f64, f64::max);
        if off_axis > ALIGNMENT_TOLERANCE * norm {
            return None;
        }
        let dir = match (idx, v[idx] > 0.0) {
            (0, true) => Direction::Right,
            (0, false) => Direction::Left,
            (1, true) => Direction::Up,
            (1, false) => Direction::Down,
            (2, true) => Direction::Forward,
            _ => Direction::Backward,
        };
        Some(dir)
    }
}

// ---------------------------------------------------------------------------
// Actuator groups
// ---------------------------------------------------------------------------

/// What the command sink needs to know about one grouped actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMember {
    pub id: ActuatorId,
    pub fuel: FuelKind,
    pub max_thrust: f64,
}

/// Actuators partitioned by push direction. Built once per acquisition.
#[derive(Debug, Clone, Default)]
pub struct ActuatorGroups {
    groups: [Vec<GroupMember>; 6],
    all: Vec<ActuatorId>,
    unaligned: usize,
}

impl ActuatorGroups {
    /// Assign every actuator to exactly one direction group. Actuators off
    /// the principal axes are left ungrouped but still released by
    /// whole-vessel commands.
    pub fn classify(actuators: &[Actuator]) -> Self {
        let mut out = Self::default();
        for a in actuators {
            out.all.push(a.id);
            match Direction::from_push_axis(&a.push_axis) {
                Some(dir) => out.groups[dir.slot()].push(GroupMember {
                    id: a.id,
                    fuel: a.fuel,
                    max_thrust: a.max_thrust,
                }),
                None => out.unaligned += 1,
            }
        }
        debug!(
            total = out.all.len(),
            unaligned = out.unaligned,
            forward = out.group(Direction::Forward).len(),
            backward = out.group(Direction::Backward).len(),
            "classified actuators"
        );
        out
    }

    pub fn group(&self, dir: Direction) -> &[GroupMember] {
        &self.groups[dir.slot()]
    }

    /// Sum of maximum thrust in one group, N.
    pub fn capacity(&self, dir: Direction) -> f64 {
        self.group(dir).iter().map(|m| m.max_thrust).sum()
    }

    pub fn all(&self) -> &[ActuatorId] {
        &self.all
    }

    pub fn unaligned(&self) -> usize {
        self.unaligned
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
