use colored::Colorize;

use super::formatters::{format_bytes, format_percentage, format_uptime};
use crate::domain::entities::{LatestSnapshot, StateTransition};
use crate::domain::value_objects::ConnectionState;

/// Renders client status and snapshots as console text
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn render_status(transition: &StateTransition) -> String {
        let state = transition.to.to_string();
        let state = match transition.to {
            ConnectionState::Connected => state.green(),
            ConnectionState::Connecting | ConnectionState::Reconnecting => state.yellow(),
            ConnectionState::Disconnected => state.normal(),
            ConnectionState::Error => state.red(),
        };

        match &transition.reason {
            Some(reason) => format!("[stream] {} ({})", state, reason),
            None => format!("[stream] {}", state),
        }
    }

    pub fn render_snapshot(snapshot: &LatestSnapshot) -> String {
        let mut lines = Vec::new();

        if let Some(updated) = snapshot.last_update {
            lines.push(format!("{}", format!("Snapshot @ {}", updated.format("%H:%M:%S")).bold()));
        }

        match &snapshot.system {
            Some(system) => {
                lines.push(format!(
                    "  Host:   {} (up {}), load {:.2} {:.2} {:.2}",
                    system.hostname,
                    format_uptime(system.uptime),
                    system.load_average[0],
                    system.load_average[1],
                    system.load_average[2]
                ));
                lines.push(format!(
                    "  Disk:   {} / {} ({})",
                    format_bytes(system.disk.used),
                    format_bytes(system.disk.total),
                    format_percentage(system.disk.usage as f64)
                ));
            }
            None => lines.push(format!("  Host:   {}", "n/a".dimmed())),
        }

        match &snapshot.cpu {
            Some(cpu) => lines.push(format!(
                "  CPU:    {} across {} cores, {:.1}°C, {} MHz",
                format_percentage(cpu.usage as f64),
                cpu.cores.len(),
                cpu.temperature,
                cpu.frequency
            )),
            None => lines.push(format!("  CPU:    {}", "n/a".dimmed())),
        }

        match &snapshot.memory {
            Some(memory) => lines.push(format!(
                "  Memory: {} / {} ({})",
                format_bytes(memory.used),
                format_bytes(memory.total),
                format_percentage(memory.usage as f64)
            )),
            None => lines.push(format!("  Memory: {}", "n/a".dimmed())),
        }

        match &snapshot.docker {
            Some(containers) => {
                let running = containers.iter().filter(|c| c.is_running()).count();
                lines.push(format!(
                    "  Docker: {} containers, {} running",
                    containers.len(),
                    running
                ));
                for container in containers {
                    lines.push(format!(
                        "    {} {} [{}] {}",
                        container.id, container.name, container.state, container.status
                    ));
                }
            }
            None => lines.push(format!("  Docker: {}", "n/a".dimmed())),
        }

        if let Some(error) = &snapshot.last_error {
            lines.push(format!("  {} {}", "Server error:".red(), error));
        }

        lines.join("\n")
    }
}
