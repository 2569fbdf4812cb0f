//! Tag and arc command implementation

use anyhow::{Result, anyhow};
use colored::Colorize;
use serde_json::json;

use crate::output::print_json;
use crate::utils::Context;

/// Which label relation to extend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Arc,
}

/// Attach `labels` to the strip matching `title`, then save.
pub fn execute(ctx: &Context, kind: LabelKind, title: &str, labels: &[String]) -> Result<()> {
    let mut index = ctx.load_index()?;
    let title = index
        .resolve_title(title)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No strip titled '{title}'"))?;

    let mut added = Vec::new();
    for label in labels {
        let fresh = match kind {
            LabelKind::Tag => index.tag_strip(&title, label)?,
            LabelKind::Arc => index.add_arc(&title, label)?,
        };
        if fresh {
            added.push(label.as_str());
        }
    }

    if !added.is_empty() {
        ctx.save_index(&index)?;
    }

    if ctx.format.is_machine() {
        print_json(&json!({ "title": title, "added": added }))?;
    } else if added.is_empty() {
        println!("{title}: nothing new");
    } else {
        let noun = match kind {
            LabelKind::Tag => "tagged",
            LabelKind::Arc => "added to arc",
        };
        println!("{} {noun} {}", title.green(), added.join(", "));
    }
    Ok(())
}
