//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(item: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}

/// Print a progress line; in JSON mode it goes to stderr so stdout stays parseable.
pub fn print_progress(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", message),
        OutputFormat::Json => eprintln!("{}", message.dimmed()),
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print an info message
pub fn print_info(message: &str, format: OutputFormat) {
    print_progress(&format!("{} {}", "ℹ".blue(), message), format);
}
