//! List command implementation

use anyhow::Result;
use tome_core::Strip;

use crate::output::{print_json, strip_line};
use crate::utils::Context;

/// Execute the list command
pub fn execute(ctx: &Context) -> Result<()> {
    let index = ctx.load_index()?;
    let strips: Vec<&Strip> = index.strips_by_publish_order().collect();

    if ctx.format.is_machine() {
        print_json(&strips)?;
        return Ok(());
    }
    if strips.is_empty() {
        println!("No strips indexed. Use 'tome crawl' to fetch some.");
        return Ok(());
    }
    for strip in strips {
        println!("{}", strip_line(strip));
    }
    Ok(())
}
