//! Command implementations, one module per subcommand.

mod add;
mod backfill;
mod crawl;
mod find;
mod label;
mod list;
mod show;

pub use add::execute as add;
pub use backfill::execute as backfill;
pub use crawl::execute as crawl;
pub use find::execute as find;
pub use label::{LabelKind, execute as label};
pub use list::execute as list;
pub use show::execute as show;
