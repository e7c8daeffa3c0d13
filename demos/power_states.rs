//! Power State Hierarchy
//!
//! This example walks a device through nested power states.
//!
//! Key concepts:
//! - Nested states addressed by dotted paths
//! - Exit hooks fire deepest-first, enter hooks shallowest-first
//! - Events bubble from the current state to its ancestors
//! - Transition shortcuts declared with `transition_on`
//!
//! Run with: cargo run --example power_states

use statetree::builder::{CoordinatorBuilder, StateBuilder};
use statetree::StateCoordinator;

type Power = StateBuilder<String, Vec<String>>;

/// Print and clear the hooks logged since the last report.
fn report(label: &str, device: &mut StateCoordinator<String, Vec<String>>) {
    println!("{label}");
    for line in device.env_mut().drain(..) {
        println!("  {line}");
    }
    println!("  now in: {}\n", device.current_path().unwrap_or_default());
}

fn logged(name: &'static str) -> Power {
    Power::new()
        .on_enter(move |c| {
            c.env_mut().push(format!("enter {name}"));
            Ok(())
        })
        .on_exit(move |c| {
            c.env_mut().push(format!("exit {name}"));
            Ok(())
        })
        .on_setup(move |c, context| {
            if let Some(context) = context {
                c.env_mut().push(format!("setup {name} with {context}"));
            }
            Ok(())
        })
}

fn main() {
    println!("=== Power State Hierarchy ===\n");

    let mut device = CoordinatorBuilder::<String, Vec<String>>::new()
        .initial_state("poweredDown")
        .state(
            "poweredDown",
            logged("poweredDown")
                .transition_on("unplug", "poweredUp.mobile")
                .state("charging", logged("charging"))
                .state("charged", logged("charged")),
        )
        .state(
            "poweredUp",
            logged("poweredUp")
                .transition_on("plugIn", "poweredDown.charging")
                .on_unhandled(|c, event, _args| {
                    c.env_mut().push(format!("poweredUp ignored {event}"));
                    Ok(None)
                })
                .state("mobile", logged("mobile"))
                .state("stationary", logged("stationary")),
        )
        .build(Vec::new())
        .unwrap();

    report("Built:", &mut device);

    device.transition_to("poweredUp.mobile").unwrap();
    report("transition_to(\"poweredUp.mobile\"):", &mut device);

    device
        .transition_to_with("stationary", vec!["desk".to_string()])
        .unwrap();
    report("transition_to_with(\"stationary\", [desk]):", &mut device);

    device.send("reboot", &[]).unwrap();
    report("send(\"reboot\") bubbles to poweredUp:", &mut device);

    device.send("plugIn", &[]).unwrap();
    report("send(\"plugIn\") follows the shortcut:", &mut device);

    match device.send("fly", &[]) {
        Ok(_) => println!("fly was handled"),
        Err(error) => println!("send(\"fly\") failed: {error}"),
    }

    println!("\nSettled states: {:?}", device.history().get_path());

    println!("\n=== Example Complete ===");
}
