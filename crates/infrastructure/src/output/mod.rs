//! Output sinks

mod allure;
mod console;
mod json_lines;

pub use allure::AllureSink;
pub use console::ConsoleSink;
pub use json_lines::JsonLinesSink;
