//! Presentation layer for dual-relay
//!
//! This crate contains CLI definitions, output formatters, the console
//! notification subscriber, and live rendering of a streaming answer.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::subscriber::ConsoleSubscriber;
pub use progress::live::{LiveText, follow};
