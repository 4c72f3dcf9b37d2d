pub mod csv;
pub mod json;
pub mod telemetry;

pub use telemetry::{NullSink, RecordingSink, Tee, TelemetryRecord, TelemetrySink};
