use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Change a desired temperature. `target` is a card number or thermostat id.
    Set { target: String, temperature: f32 },
    Redraw,
    Help,
}

pub const CONTROLS_HELP: &str =
    "controls: `set <card|id> <temp>` changes a desired temperature, `r` redraws, `h` shows help";

pub fn parse_control_command(input: &str) -> Option<ControlCommand> {
    let mut words = input.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    match command.as_str() {
        "r" | "redraw" | "refresh" => Some(ControlCommand::Redraw),
        "h" | "help" | "?" => Some(ControlCommand::Help),
        "s" | "set" => {
            let target = words.next()?.to_string();
            let temperature = words.next()?.trim_end_matches('°').parse().ok()?;
            if words.next().is_some() {
                return None;
            }
            Some(ControlCommand::Set {
                target,
                temperature,
            })
        }
        _ => None,
    }
}

/// Reads commands from stdin on a dedicated OS thread.
///
/// The blocking read lives outside the async runtime so that dropping the
/// runtime never waits for the next line of input.
pub fn spawn_control_listener() -> mpsc::UnboundedReceiver<ControlCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    let spawned = std::thread::Builder::new()
        .name("stdin-controls".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = parse_control_command(&line) {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "failed to start control listener; runtime controls disabled");
    }

    rx
}
