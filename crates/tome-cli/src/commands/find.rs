//! Find command implementation

use anyhow::Result;
use tome_core::{ArchiveIndex, Strip};

use crate::cli::FindArgs;
use crate::output::{print_json, strip_line};
use crate::utils::Context;

/// Execute the find command
pub fn execute(ctx: &Context, args: &FindArgs) -> Result<()> {
    let index = ctx.load_index()?;
    let strips = lookup(&index, args);

    if ctx.format.is_machine() {
        print_json(&strips)?;
    } else if strips.is_empty() {
        eprintln!("No matching strips");
    } else {
        for strip in strips {
            println!("{}", strip_line(strip));
        }
    }
    Ok(())
}

fn lookup<'a>(index: &'a ArchiveIndex, args: &FindArgs) -> Vec<&'a Strip> {
    let titles: Vec<&str> = if let Some(url) = &args.url {
        index.title_for_url(url).into_iter().collect()
    } else if let Some(order) = &args.order {
        index
            .title_at_publish_order(order)
            .into_iter()
            .collect()
    } else if let Some(tag) = &args.tag {
        let tag = if args.exact {
            tag.as_str()
        } else {
            index.resolve_tag(tag).unwrap_or(tag)
        };
        index.titles_for_tag(tag).iter().map(String::as_str).collect()
    } else if let Some(arc) = &args.arc {
        let arc = if args.exact {
            arc.as_str()
        } else {
            index.resolve_arc(arc).unwrap_or(arc)
        };
        index.titles_for_arc(arc).iter().map(String::as_str).collect()
    } else {
        Vec::new()
    };

    titles.into_iter().filter_map(|title| index.strip(title)).collect()
}
