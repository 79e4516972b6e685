//! Output formatting for CLI results
//!
//! List-like results implement [`Formattable`]; one-off command results are
//! printed as plain JSON objects with [`print_object`].

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod formatters;
pub mod json;
pub mod table;
pub mod twitter;

/// Renders itself as pretty text, a table, or a JSON envelope
pub trait Formattable {
    fn format(&self, format: OutputFormat) -> Result<String>;
}

pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    println!("{}", data.format(format)?);
    Ok(())
}

/// Pretty-print a bare JSON object (no envelope)
pub fn print_object(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
