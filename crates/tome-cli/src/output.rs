//! Output formats shared by every command.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tome_core::Strip;

/// How results are written to stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty text output (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Whether the output is meant for another program.
    pub const fn is_machine(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary: order, title, page count.
pub fn strip_line(strip: &Strip) -> String {
    let pages = match strip.urls.len() {
        1 => "1 page".to_string(),
        n => format!("{n} pages"),
    };
    format!(
        "{:>5}  {}  {}",
        strip.publish_order.to_string().bright_black(),
        strip.title.green(),
        pages.bright_black()
    )
}

/// Full multi-line description of a strip.
pub fn print_strip_details(strip: &Strip) {
    println!("{} {}", strip.title.green().bold(), format!("#{}", strip.publish_order).bright_black());
    for url in &strip.urls {
        println!("  {url}");
    }
    if !strip.tags.is_empty() {
        println!("  {} {}", "tags:".bright_black(), strip.tags.join(", "));
    }
    if !strip.arcs.is_empty() {
        println!("  {} {}", "arcs:".bright_black(), strip.arcs.join(", "));
    }
}
