use throttle_control::config::ControlConfig;
use throttle_control::control::ThrottleController;
use throttle_control::dynamics::state::InputVector;
use throttle_control::io::csv::CsvTelemetry;
use throttle_control::sim::{self, PilotScript, PointMassVessel, SimConfig};

/// Accelerate by hand for five seconds, let go, and watch cruise hold the
/// speed while the telemetry streams to stdout as CSV.
fn main() {
    let config = ControlConfig { eco_mode: false, ..ControlConfig::default() };
    let mut controller = match ThrottleController::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("bad config: {e}");
            return;
        }
    };

    let mut vessel = PointMassVessel::standard(15_000.0, 40_000.0);
    let script = PilotScript::new()
        .hold(10, 310, InputVector::FORWARD)
        .command(900, "cruise+")
        .hold(960, 990, InputVector::BACKWARD);
    let sim_config = SimConfig { max_ticks: 1500, ..SimConfig::default() };

    let mut csv = CsvTelemetry::new(std::io::stdout());
    let run = sim::simulate_with(&mut controller, &mut vessel, &script, &sim_config, &mut csv);
    if let Err(e) = csv.finish() {
        eprintln!("telemetry write failed: {e}");
    }

    let state = controller.state();
    eprintln!(
        "{} calls, mode {}, target {:.2} m/s, actual {:.2} m/s",
        run.trace.len(),
        state.flight_mode,
        state.target_speed,
        run.final_velocity().z
    );
}
