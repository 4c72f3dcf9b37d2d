use nalgebra::Vector3;

use throttle_control::command::Command;
use throttle_control::control::{ThrottleController, ThrusterBus, TickStatus};
use throttle_control::dynamics::state::InputVector;
use throttle_control::io::telemetry::RecordingSink;
use throttle_control::vehicle::{Actuator, ActuatorBuilder, ActuatorId, ControlSource, Direction, Override};

/// A seat that flies a fixed velocity profile. Stands in for whatever host
/// the controller is embedded in.
struct ProfileSeat {
    tick: u32,
}

impl ControlSource for ProfileSeat {
    fn is_under_control(&self) -> bool {
        true
    }

    fn input(&self) -> InputVector {
        InputVector::IDLE
    }

    fn velocity(&self) -> Option<Vector3<f64>> {
        // ramps up to 30 m/s then sits there
        let v = (self.tick as f64 * 0.1).min(30.0);
        Some(Vector3::new(0.0, 0.0, v))
    }

    fn mass(&self) -> Option<f64> {
        Some(12_000.0)
    }
}

/// Prints every write instead of moving anything.
struct PrintingBus {
    actuators: Vec<Actuator>,
}

impl ThrusterBus for PrintingBus {
    fn acquire(&self) -> Vec<Actuator> {
        self.actuators.clone()
    }

    fn write(&mut self, id: ActuatorId, value: Override) {
        println!("    thruster {:>2} <- {:?}", id.0, value);
    }
}

fn main() {
    let mut controller = ThrottleController::with_defaults();
    let mut bus = PrintingBus {
        actuators: vec![
            ActuatorBuilder::new(0).push_axis(Direction::Forward.unit()).max_thrust(60_000.0).build(),
            ActuatorBuilder::new(1).push_axis(Direction::Backward.unit()).max_thrust(60_000.0).build(),
        ],
    };
    let mut sink = RecordingSink::default();

    for tick in 0..400 {
        let seat = ProfileSeat { tick };
        let command = (tick == 5).then_some(Command::SetTargetSpeed(20.0));
        if tick % 50 == 0 {
            println!("tick {tick}");
        }
        let outcome = controller.tick(Some(&seat), &mut bus, &mut sink, command);
        if outcome.status != TickStatus::Running {
            println!("  status {:?}", outcome.status);
        }
        for t in &outcome.transitions {
            println!("  {} -> {} ({:?})", t.from, t.to, t.cause);
        }
    }

    if let Some(last) = sink.records.last() {
        println!(
            "final: speed {:.1} m/s, target {:.1} m/s, throttle {:.4}, eta {:?}",
            last.current_speed, last.target_speed, last.throttle, last.eta_seconds
        );
    }
}
