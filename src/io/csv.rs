use std::io::{self, Write};

use super::telemetry::{TelemetryRecord, TelemetrySink};

const HEADER: &str = "tick,current_speed,target_speed,throttle,eta_s,mode,eco,cruise,active";

fn write_row<W: Write>(writer: &mut W, r: &TelemetryRecord) -> io::Result<()> {
    let eta = r.eta_seconds.map(|e| format!("{e:.2}")).unwrap_or_default();
    writeln!(
        writer,
        "{},{:.4},{:.4},{:.6},{},{},{},{},{}",
        r.tick,
        r.current_speed,
        r.target_speed,
        r.throttle,
        eta,
        r.flight_mode.label(),
        r.eco_mode as u8,
        r.cruise_enabled as u8,
        r.active as u8,
    )
}

/// Write a telemetry trace in CSV format.
///
/// Columns: tick, current_speed, target_speed, throttle, eta_s, mode, eco,
///          cruise, active. `eta_s` is empty when undefined.
pub fn write_trace<W: Write>(writer: &mut W, trace: &[TelemetryRecord]) -> io::Result<()> {
    writeln!(writer, "{HEADER}")?;
    for r in trace {
        write_row(writer, r)?;
    }
    Ok(())
}

/// Write a trace to a CSV file at the given path.
pub fn write_trace_file(path: &str, trace: &[TelemetryRecord]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trace(&mut file, trace)
}

/// Streaming CSV sink. The first write error is kept and every later
/// record dropped; `finish` surfaces it.
pub struct CsvTelemetry<W: Write> {
    writer: W,
    header_written: bool,
    error: Option<io::Error>,
}

impl<W: Write> CsvTelemetry<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, header_written: false, error: None }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn try_report(&mut self, record: &TelemetryRecord) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{HEADER}")?;
            self.header_written = true;
        }
        write_row(&mut self.writer, record)
    }
}

impl<W: Write> TelemetrySink for CsvTelemetry<W> {
    fn report(&mut self, record: &TelemetryRecord) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.try_report(record) {
            tracing::warn!(error = %e, "telemetry CSV write failed, dropping further rows");
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::FlightMode;

    fn record(tick: u32, eta: Option<f64>) -> TelemetryRecord {
        TelemetryRecord {
            tick,
            current_speed: 12.5,
            target_speed: 20.0,
            throttle: 0.5,
            eta_seconds: eta,
            flight_mode: FlightMode::CruisePlus,
            eco_mode: true,
            cruise_enabled: true,
            active: true,
        }
    }

    #[test]
    fn trace_has_header_and_rows() {
        let mut buf = Vec::new();
        write_trace(&mut buf, &[record(1, Some(3.0)), record(2, None)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,12.5000,20.0000,0.500000,3.00,CRUISE+,1,1,1");
        assert!(lines[2].contains(",,CRUISE+"));
    }

    #[test]
    fn streaming_sink_writes_header_once() {
        let mut sink = CsvTelemetry::new(Vec::new());
        sink.report(&record(1, None));
        sink.report(&record(2, None));
        let text = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(text.matches("tick,").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }
}
