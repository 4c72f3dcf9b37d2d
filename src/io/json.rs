use std::io::{self, Write};

use crate::dynamics::state::FlightMode;
use super::telemetry::TelemetryRecord;

/// Summary statistics computed from a telemetry trace.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: usize,
    pub final_speed: f64,
    pub final_target: f64,
    pub final_mode: FlightMode,
    pub max_speed: f64,
    pub max_throttle: f64,
    pub mode_changes: usize,
    pub inactive_ticks: usize,
    /// Worst |target - speed| over ticks where cruise was holding.
    pub max_hold_error: f64,
}

impl RunSummary {
    /// `None` for an empty trace.
    pub fn from_trace(trace: &[TelemetryRecord]) -> Option<Self> {
        let last = trace.last()?;

        let max_speed = trace.iter().map(|r| r.current_speed.abs()).fold(0.0_f64, f64::max);
        let max_throttle = trace.iter().map(|r| r.throttle).fold(0.0_f64, f64::max);
        let mode_changes = trace.windows(2).filter(|w| w[0].flight_mode != w[1].flight_mode).count();
        let inactive_ticks = trace.iter().filter(|r| !r.active).count();
        let max_hold_error = trace
            .iter()
            .filter(|r| r.cruise_enabled && r.flight_mode != FlightMode::Decoupled)
            .map(|r| (r.target_speed - r.current_speed).abs())
            .fold(0.0_f64, f64::max);

        Some(RunSummary {
            ticks: trace.len(),
            final_speed: last.current_speed,
            final_target: last.target_speed,
            final_mode: last.flight_mode,
            max_speed,
            max_throttle,
            mode_changes,
            inactive_ticks,
            max_hold_error,
        })
    }
}

/// Write a run summary as JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, scenario: &str, summary: &RunSummary) -> io::Result<()> {
    writeln!(writer, "{{")?;
    writeln!(writer, "  \"scenario\": \"{}\",", scenario.replace('"', "\\\""))?;
    writeln!(writer, "  \"ticks\": {},", summary.ticks)?;
    writeln!(writer, "  \"final\": {{")?;
    writeln!(writer, "    \"speed_ms\": {:.3},", summary.final_speed)?;
    writeln!(writer, "    \"target_ms\": {:.3},", summary.final_target)?;
    writeln!(writer, "    \"mode\": \"{}\"", summary.final_mode.label())?;
    writeln!(writer, "  }},")?;
    writeln!(writer, "  \"stats\": {{")?;
    writeln!(writer, "    \"max_speed_ms\": {:.3},", summary.max_speed)?;
    writeln!(writer, "    \"max_throttle\": {:.4},", summary.max_throttle)?;
    writeln!(writer, "    \"max_hold_error_ms\": {:.3},", summary.max_hold_error)?;
    writeln!(writer, "    \"mode_changes\": {},", summary.mode_changes)?;
    writeln!(writer, "    \"inactive_ticks\": {}", summary.inactive_ticks)?;
    writeln!(writer, "  }}")?;
    writeln!(writer, "}}")?;
    Ok(())
}

/// Write a run summary JSON to a file.
pub fn write_summary_file(path: &str, scenario: &str, summary: &RunSummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, scenario, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(tick: u32, speed: f64, mode: FlightMode, active: bool) -> TelemetryRecord {
        TelemetryRecord {
            tick,
            current_speed: speed,
            target_speed: 20.0,
            throttle: speed / 100.0,
            eta_seconds: None,
            flight_mode: mode,
            eco_mode: false,
            cruise_enabled: true,
            active,
        }
    }

    #[test]
    fn summary_counts_mode_changes_and_gaps() {
        let trace = vec![
            rec(1, 5.0, FlightMode::Cruise, true),
            rec(2, 18.0, FlightMode::Cruise, true),
            rec(3, 21.0, FlightMode::CruisePlus, false),
            rec(4, 20.0, FlightMode::Normal, true),
        ];
        let s = RunSummary::from_trace(&trace).unwrap();
        assert_eq!(s.ticks, 4);
        assert_eq!(s.mode_changes, 2);
        assert_eq!(s.inactive_ticks, 1);
        assert_eq!(s.max_speed, 21.0);
        assert_eq!(s.max_hold_error, 15.0);
        assert_eq!(s.final_mode, FlightMode::Normal);
    }

    #[test]
    fn empty_trace_has_no_summary() {
        assert!(RunSummary::from_trace(&[]).is_none());
    }

    #[test]
    fn json_output_is_valid() {
        let trace = vec![rec(1, 5.0, FlightMode::Cruise, true)];
        let summary = RunSummary::from_trace(&trace).unwrap();
        let mut buf = Vec::new();
        write_summary(&mut buf, "cruise", &summary).unwrap();
        let json = String::from_utf8(buf).unwrap();
        assert!(json.contains("\"scenario\": \"cruise\""));
        assert!(json.contains("\"mode\": \"CRUISE\""));
        assert!(json.trim_end().ends_with('}'));
    }
}
