use nalgebra::Vector3;

use crate::dynamics::state::InputVector;
use crate::error::AcquisitionError;

// ---------------------------------------------------------------------------
// Control-seat capability
// ---------------------------------------------------------------------------

/// Everything the controller reads from the seat that is flying the vessel.
///
/// Implemented by cockpits and remote-control stations; the controller never
/// needs to know which one it is talking to.
pub trait ControlSource {
    /// A pilot is present and actively flying from this seat.
    fn is_under_control(&self) -> bool;

    /// Pilot intent for this tick. Zero when nobody is flying.
    fn input(&self) -> InputVector;

    /// Body-frame velocity `[right, up, forward]`, m/s. `None` on a telemetry gap.
    fn velocity(&self) -> Option<Vector3<f64>>;

    /// Total vessel mass, kg. `None` when unavailable.
    fn mass(&self) -> Option<f64>;
}

/// Raw readings the host refreshes on a seat once per tick.
#[derive(Debug, Clone, Default)]
pub struct SeatTelemetry {
    pub occupied: bool,
    pub indicator: Vector3<f64>, // analog move indicator, [right, up, forward]
    pub velocity: Option<Vector3<f64>>,
    pub mass: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Cockpit {
    pub name: String,
    pub telemetry: SeatTelemetry,
}

impl Cockpit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), telemetry: SeatTelemetry::default() }
    }
}

impl ControlSource for Cockpit {
    fn is_under_control(&self) -> bool {
        self.telemetry.occupied
    }

    fn input(&self) -> InputVector {
        if self.is_under_control() {
            InputVector::from_indicator(&self.telemetry.indicator)
        } else {
            InputVector::IDLE
        }
    }

    fn velocity(&self) -> Option<Vector3<f64>> {
        self.telemetry.velocity
    }

    fn mass(&self) -> Option<f64> {
        self.telemetry.mass
    }
}

/// Remote station. Only counts as piloted while its own autopilot is off.
#[derive(Debug, Clone, Default)]
pub struct RemoteControl {
    pub name: String,
    pub telemetry: SeatTelemetry,
    pub autopilot_engaged: bool,
}

impl RemoteControl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

impl ControlSource for RemoteControl {
    fn is_under_control(&self) -> bool {
        self.telemetry.occupied && !self.autopilot_engaged
    }

    fn input(&self) -> InputVector {
        if self.is_under_control() {
            InputVector::from_indicator(&self.telemetry.indicator)
        } else {
            InputVector::IDLE
        }
    }

    fn velocity(&self) -> Option<Vector3<f64>> {
        self.telemetry.velocity
    }

    fn mass(&self) -> Option<f64> {
        self.telemetry.mass
    }
}

/// The main cockpit and main remote of one vessel, either of which may be
/// missing. Control is lost only when neither is being flown.
///
/// When both are flown the remote's stick and mass reading win, while
/// velocity is read from the cockpit.
#[derive(Clone, Copy)]
pub struct DualSeat<'a> {
    pub cockpit: Option<&'a dyn ControlSource>,
    pub remote: Option<&'a dyn ControlSource>,
}

impl<'a> DualSeat<'a> {
    fn flown(seat: Option<&'a dyn ControlSource>) -> Option<&'a dyn ControlSource> {
        seat.filter(|s| s.is_under_control())
    }

    fn cockpit_first(&self) -> Option<&'a dyn ControlSource> {
        Self::flown(self.cockpit).or(Self::flown(self.remote))
    }

    fn remote_first(&self) -> Option<&'a dyn ControlSource> {
        Self::flown(self.remote).or(Self::flown(self.cockpit))
    }

    /// Seat to read sensors from when nobody is flying.
    fn fallback(&self) -> Option<&'a dyn ControlSource> {
        self.cockpit.or(self.remote)
    }
}

impl ControlSource for DualSeat<'_> {
    fn is_under_control(&self) -> bool {
        self.cockpit_first().is_some()
    }

    fn input(&self) -> InputVector {
        self.remote_first().map(|s| s.input()).unwrap_or(InputVector::IDLE)
    }

    fn velocity(&self) -> Option<Vector3<f64>> {
        self.cockpit_first().or(self.fallback()).and_then(|s| s.velocity())
    }

    fn mass(&self) -> Option<f64> {
        self.remote_first().or(self.fallback()).and_then(|s| s.mass())
    }
}

// ---------------------------------------------------------------------------
// Main-seat discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatKind {
    Cockpit,
    Remote,
}

/// A seat found on the vessel, as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatCandidate {
    pub name: String,
    pub kind: SeatKind,
    pub flagged_main: bool, // cockpit marked as the vessel's main cockpit
    pub working: bool,
    pub on_own_body: bool, // not on a docked or attached structure
}

/// Indices into the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeatSelection {
    pub cockpit: Option<usize>,
    pub remote: Option<usize>,
}

/// Pick the seats the controller should listen to. A seat whose name
/// contains `tag` (case-insensitive) wins; failing that, a cockpit flagged
/// as main. Broken seats and seats on attached structures are ignored.
pub fn select_control_seat(
    candidates: &[SeatCandidate],
    tag: &str,
) -> Result<SeatSelection, AcquisitionError> {
    let tag_lower = tag.to_lowercase();
    let usable = |c: &SeatCandidate| c.working && c.on_own_body;
    let tagged = |kind: SeatKind| -> Vec<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == kind && usable(c))
            .filter(|(_, c)| c.name.to_lowercase().contains(&tag_lower))
            .map(|(i, _)| i)
            .collect()
    };

    let cockpits = tagged(SeatKind::Cockpit);
    let remotes = tagged(SeatKind::Remote);
    if cockpits.len() > 1 || remotes.len() > 1 {
        return Err(AcquisitionError::AmbiguousControlSeat {
            cockpits: cockpits.len(),
            remotes: remotes.len(),
        });
    }

    let flagged = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == SeatKind::Cockpit && c.flagged_main && usable(c))
        .map(|(i, _)| i)
        .last();

    let selection = SeatSelection {
        cockpit: cockpits.first().copied().or(flagged),
        remote: remotes.first().copied(),
    };
    if selection.cockpit.is_none() && selection.remote.is_none() {
        return Err(AcquisitionError::NoControlSeat { tag: tag.to_string() });
    }
    Ok(selection)
}
