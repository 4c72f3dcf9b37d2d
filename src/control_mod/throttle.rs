// ---------------------------------------------------------------------------
// Quadratic throttle curve (single axis)
// ---------------------------------------------------------------------------

/// Map a speed error to a thrust fraction: `gain * error^2`, clamped to
/// `[min_out, max_out]`.
///
/// Magnitude only: the caller picks which group to fire from the sign of
/// `error`. `min_out` is a nonzero keep-alive floor, so an active group is
/// never commanded to a hard zero.
pub fn throttle(gain: f64, error: f64, max_out: f64, min_out: f64) -> f64 {
    let value = gain * error * error;
    if value >= max_out {
        max_out
    } else if value <= min_out {
        min_out
    } else {
        value
    }
}

/// Primary and eco fractions computed from the same error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottlePair {
    pub primary: f64,
    pub secondary: f64,
}

/// Throttle shaping for one controller: primary gain, eco gain and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleCurve {
    pub gain: f64,
    pub eco_gain: f64,
    pub max_out: f64,
    pub min_out: f64,
}

impl ThrottleCurve {
    pub fn from_config(config: &crate::config::ControlConfig) -> Self {
        Self {
            gain: config.gain,
            eco_gain: config.eco_gain,
            max_out: config.max_output,
            min_out: config.idle_floor,
        }
    }

    pub fn primary(&self, error: f64) -> f64 {
        throttle(self.gain, error, self.max_out, self.min_out)
    }

    pub fn pair(&self, error: f64) -> ThrottlePair {
        ThrottlePair {
            primary: self.primary(error),
            secondary: throttle(self.eco_gain, error, self.max_out, self.min_out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_and_bounded() {
        for i in -400..=400 {
            let e = i as f64 * 0.05;
            let a = throttle(1.5, e, 1.0, 0.0001);
            assert_eq!(a, throttle(1.5, -e, 1.0, 0.0001));
            assert!((0.0001..=1.0).contains(&a), "out of bounds at e={e}: {a}");
        }
    }

    #[test]
    fn non_decreasing_in_error_magnitude() {
        let mut prev = 0.0;
        for i in 0..=500 {
            let out = throttle(1.5, i as f64 * 0.01, 1.0, 0.0001);
            assert!(out >= prev);
            prev = out;
        }
    }

    #[test]
    fn quadratic_between_bounds() {
        let out = throttle(1.5, 0.5, 1.0, 0.0001);
        assert!((out - 0.375).abs() < 1e-12);
    }

    #[test]
    fn eco_fraction_is_never_above_primary() {
        let curve = ThrottleCurve { gain: 1.5, eco_gain: 0.1, max_out: 1.0, min_out: 0.0001 };
        for i in 0..100 {
            let p = curve.pair(i as f64 * 0.1);
            assert!(p.secondary <= p.primary);
        }
        assert_eq!(curve.pair(0.0).secondary, 0.0001);
    }
}
