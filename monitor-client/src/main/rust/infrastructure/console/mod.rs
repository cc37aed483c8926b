mod formatters;
mod renderer;

pub use formatters::{format_bytes, format_percentage, format_uptime};
pub use renderer::ConsoleRenderer;
