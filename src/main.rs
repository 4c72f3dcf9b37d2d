use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use throttle_control::config::ControlConfig;
use throttle_control::io::csv::write_trace_file;
use throttle_control::io::json::{write_summary_file, RunSummary};
use throttle_control::sim::{self, Scenario, SimRun, TICK_DT};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ScenarioArg {
    Cruise,
    CruisePlus,
    Decoupled,
    ExitSafety,
    Commands,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Cruise => Scenario::Cruise,
            ScenarioArg::CruisePlus => Scenario::CruisePlus,
            ScenarioArg::Decoupled => Scenario::Decoupled,
            ScenarioArg::ExitSafety => Scenario::ExitSafety,
            ScenarioArg::Commands => Scenario::Commands,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "throttle-control")]
#[command(about = "Fly a scripted scenario against the throttle controller", long_about = None)]
struct Args {
    /// Scenario to fly
    #[arg(long, value_enum, default_value = "cruise")]
    scenario: ScenarioArg,
    /// Controller tuning (TOML); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the per-tick telemetry trace as CSV
    #[arg(long)]
    csv: Option<String>,
    /// Write a JSON run summary
    #[arg(long)]
    summary: Option<String>,
    /// Rows in the printed trace table
    #[arg(long, default_value_t = 30)]
    rows: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ControlConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ControlConfig::default(),
    };
    info!(?config, "controller config loaded");

    let scenario = Scenario::from(args.scenario);
    let run = sim::simulate(&config, scenario)?;

    print_report(scenario, &config, &run, args.rows);

    if let Some(path) = &args.csv {
        write_trace_file(path, &run.trace).with_context(|| format!("writing {path}"))?;
        println!("  Trace written to {path}");
    }
    if let Some(path) = &args.summary {
        let summary = RunSummary::from_trace(&run.trace).context("empty telemetry trace")?;
        write_summary_file(path, scenario.name(), &summary)
            .with_context(|| format!("writing {path}"))?;
        println!("  Summary written to {path}");
    }
    Ok(())
}

fn print_report(scenario: Scenario, config: &ControlConfig, run: &SimRun, rows: usize) {
    println!();
    println!("====================================================================");
    println!("  THROTTLE CONTROL: scenario {scenario}");
    println!("====================================================================");
    println!();
    println!("  Tuning");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Gain:          {:>8.3}       Eco gain:     {:>8.3}",
        config.gain, config.eco_gain
    );
    println!(
        "  Idle floor:    {:>8.4}       Dead zone:    {:>8.3} m/s",
        config.idle_floor, config.dead_zone
    );
    println!(
        "  Tap window:    {:>8} ticks Reset on exit:{:>8}",
        config.double_tap_window, config.reset_mode_on_exit
    );
    println!();

    println!("  Mode Changes");
    println!("  ──────────────────────────────────────────────────────────────────");
    if run.transitions.is_empty() {
        println!("  (none)");
    }
    for (tick, t) in &run.transitions {
        println!(
            "  t={:>6.2}s   {:>9} -> {:<9}  ({:?})",
            *tick as f64 * TICK_DT,
            t.from.label(),
            t.to.label(),
            t.cause
        );
    }
    for (tick, e) in &run.rejected {
        println!("  t={:>6.2}s   rejected: {e}", *tick as f64 * TICK_DT);
    }
    for (tick, e) in &run.seat_errors {
        println!("  t={:>6.2}s   seat: {e}", *tick as f64 * TICK_DT);
    }
    println!();

    if let Some(s) = RunSummary::from_trace(&run.trace) {
        let v = run.final_velocity();
        println!("  Performance Summary");
        println!("  ──────────────────────────────────────────────────────────────────");
        println!("  Final speed:   {:>8.2} m/s   Target:       {:>8.2} m/s", s.final_speed, s.final_target);
        println!("  Max speed:     {:>8.2} m/s   Max throttle: {:>8.4}", s.max_speed, s.max_throttle);
        println!("  Hold error:    {:>8.3} m/s   Inactive:     {:>8} calls", s.max_hold_error, s.inactive_ticks);
        println!("  Velocity:      [{:.2}, {:.2}, {:.2}] m/s (right, up, forward)", v.x, v.y, v.z);
        println!();
    }

    println!("  Telemetry");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>6}  {:>9}  {:>9}  {:>9}  {:>7}  {:>9}",
        "tick", "speed", "target", "throttle", "eta(s)", "mode"
    );
    println!("  {}", "─".repeat(60));

    let interval = (run.trace.len() / rows.max(1)).max(1);
    for (i, r) in run.trace.iter().enumerate() {
        if i % interval != 0 && i != run.trace.len() - 1 {
            continue;
        }
        let eta = r.eta_seconds.map(|e| format!("{e:.1}")).unwrap_or_else(|| "-".into());
        println!(
            "  {:>6}  {:>9.2}  {:>9.2}  {:>9.4}  {:>7}  {:>9}",
            r.tick,
            r.current_speed,
            r.target_speed,
            r.throttle,
            eta,
            r.flight_mode.label()
        );
    }

    println!();
    println!("  Simulation: {} controller calls, {} host ticks", run.trace.len(), run.velocities.len());
    println!("====================================================================");
    println!();
}
