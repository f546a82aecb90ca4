pub mod changes;
pub mod markdown;
pub mod package;

pub use changes::{format_change_set, format_report, format_section};
pub use markdown::render_markdown;
pub use package::{format_package_info, format_search_hits};
