// ---------------------------------------------------------------------------
// Time-to-target estimate (telemetry only, never fed back into control)
// ---------------------------------------------------------------------------

/// Seconds needed to close the gap between `target_speed` and
/// `current_speed` using a group with `capacity_sum` newtons of thrust.
///
/// `acceleration = (capacity_sum / mass) * time_offset`. Returns `None` when
/// mass is missing or zero, or when the group cannot accelerate at all.
pub fn time_to_target(
    target_speed: f64,
    current_speed: f64,
    capacity_sum: f64,
    mass: Option<f64>,
    time_offset: f64,
) -> Option<f64> {
    let mass = mass.filter(|m| m.is_finite() && *m > 0.0)?;
    let acceleration = (capacity_sum / mass) * time_offset;
    if !acceleration.is_finite() || acceleration <= 0.0 {
        return None;
    }
    Some((target_speed - current_speed).abs() / acceleration)
}
