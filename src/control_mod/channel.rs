use crate::dynamics::state::Axis;
use crate::vehicle::Direction;
use super::sink::{Actuation, CommandFrame};
use super::throttle::ThrottleCurve;

// ---------------------------------------------------------------------------
// Directional channel: one body axis and the two groups that act on it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub axis: Axis,
    pub positive: Direction,
    pub negative: Direction,
}

pub const LONGITUDINAL: Channel = Channel {
    axis: Axis::Longitudinal,
    positive: Direction::Forward,
    negative: Direction::Backward,
};

pub const LATERAL: Channel = Channel {
    axis: Axis::Lateral,
    positive: Direction::Right,
    negative: Direction::Left,
};

pub const VERTICAL: Channel = Channel {
    axis: Axis::Vertical,
    positive: Direction::Up,
    negative: Direction::Down,
};

pub const CHANNELS: [Channel; 3] = [LONGITUDINAL, LATERAL, VERTICAL];

/// What one channel should do about a speed error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Fire `group` at the curve output.
    Drive { group: Direction, primary: f64, secondary: f64 },
    /// Inside the dead zone: both groups float at the idle floor.
    Float { idle: f64 },
}

impl Correction {
    /// Throttle actually driving the vessel, 0 when floating.
    pub fn drive_throttle(&self) -> f64 {
        match *self {
            Correction::Drive { primary, .. } => primary,
            Correction::Float { .. } => 0.0,
        }
    }
}

impl Channel {
    /// Decide the correction for `error = target - current` on this axis.
    pub fn correct(&self, error: f64, dead_zone: f64, curve: &ThrottleCurve) -> Correction {
        let pair = curve.pair(error);
        if error > dead_zone {
            Correction::Drive { group: self.positive, primary: pair.primary, secondary: pair.secondary }
        } else if error < -dead_zone {
            Correction::Drive { group: self.negative, primary: pair.primary, secondary: pair.secondary }
        } else {
            Correction::Float { idle: curve.min_out }
        }
    }

    /// Queue the writes for a correction. `eco` splits the drive between
    /// fuel kinds.
    pub fn command(&self, correction: Correction, eco: bool, frame: &mut CommandFrame) {
        match correction {
            Correction::Drive { group, primary, secondary } if eco => {
                frame.push(Actuation::Split { group, primary, secondary })
            }
            Correction::Drive { group, primary, .. } => {
                frame.push(Actuation::Set { group, fraction: primary })
            }
            Correction::Float { idle } => {
                frame.push(Actuation::Set { group: self.positive, fraction: idle });
                frame.push(Actuation::Set { group: self.negative, fraction: idle });
            }
        }
    }

    pub fn release(&self, frame: &mut CommandFrame) {
        frame.push(Actuation::Release(self.positive));
        frame.push(Actuation::Release(self.negative));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> ThrottleCurve {
        ThrottleCurve { gain: 1.5, eco_gain: 0.1, max_out: 1.0, min_out: 0.0001 }
    }

    #[test]
    fn sign_selects_group() {
        let c = LATERAL.correct(2.0, 0.0, &curve());
        assert!(matches!(c, Correction::Drive { group: Direction::Right, .. }));
        let c = LATERAL.correct(-2.0, 0.0, &curve());
        assert!(matches!(c, Correction::Drive { group: Direction::Left, .. }));
    }

    #[test]
    fn dead_zone_floats_both_groups() {
        let c = VERTICAL.correct(0.3, 0.5, &curve());
        assert_eq!(c, Correction::Float { idle: 0.0001 });
        let mut frame = CommandFrame::default();
        VERTICAL.command(c, false, &mut frame);
        assert_eq!(frame.fraction_for(Direction::Up), Some(0.0001));
        assert_eq!(frame.fraction_for(Direction::Down), Some(0.0001));
    }

    #[test]
    fn zero_dead_zone_exact_match_floats() {
        assert!(matches!(LONGITUDINAL.correct(0.0, 0.0, &curve()), Correction::Float { .. }));
    }

    #[test]
    fn eco_emits_split() {
        let c = LONGITUDINAL.correct(0.5, 0.0, &curve());
        let mut frame = CommandFrame::default();
        LONGITUDINAL.command(c, true, &mut frame);
        match frame.actions[0] {
            Actuation::Split { group, primary, secondary } => {
                assert_eq!(group, Direction::Forward);
                assert!((primary - 0.375).abs() < 1e-12);
                assert!((secondary - 0.025).abs() < 1e-12);
            }
            other => panic!("expected split, got {other:?}"),
        }
    }
}
