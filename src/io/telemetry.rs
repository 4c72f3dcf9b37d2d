use crate::dynamics::state::FlightMode;

/// Per-tick structured telemetry. Formatting is the consumer's business.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub tick: u32,
    pub current_speed: f64,       // m/s
    pub target_speed: f64,        // m/s
    pub throttle: f64,            // fraction, summed over axes in Decoupled
    pub eta_seconds: Option<f64>, // None without mass or thrust, or in Decoupled
    pub flight_mode: FlightMode,
    pub eco_mode: bool,
    pub cruise_enabled: bool,
    pub active: bool,
}

/// Receives one record per tick.
pub trait TelemetrySink {
    fn report(&mut self, record: &TelemetryRecord);
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub records: Vec<TelemetryRecord>,
}

impl TelemetrySink for RecordingSink {
    fn report(&mut self, record: &TelemetryRecord) {
        self.records.push(record.clone());
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn report(&mut self, _record: &TelemetryRecord) {}
}

/// Fan out to two sinks.
pub struct Tee<'a> {
    pub first: &'a mut dyn TelemetrySink,
    pub second: &'a mut dyn TelemetrySink,
}

impl TelemetrySink for Tee<'_> {
    fn report(&mut self, record: &TelemetryRecord) {
        self.first.report(record);
        self.second.report(record);
    }
}
