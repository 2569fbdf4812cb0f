//! Show command implementation

use anyhow::{Result, bail};

use crate::output::{print_json, print_strip_details};
use crate::utils::Context;

/// Execute the show command
pub fn execute(ctx: &Context, title: &str) -> Result<()> {
    let index = ctx.load_index()?;

    let Some(strip) = index.resolve_title(title).and_then(|t| index.strip(t)) else {
        let suggestions = index.suggest_titles(title, 5);
        if suggestions.is_empty() {
            bail!("No strip titled '{title}'");
        }
        bail!(
            "No strip titled '{title}'. Did you mean: {}?",
            suggestions.join(", ")
        );
    };

    if ctx.format.is_machine() {
        print_json(strip)?;
    } else {
        print_strip_details(strip);
    }
    Ok(())
}
