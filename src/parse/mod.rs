mod list_page;
mod status;

pub use list_page::{ListPage, Resident};
pub use status::{DinnerStatus, StatusCell, StatusRow, TZ_EETLIJST};

/// Compile a CSS selector once, on first use. All selectors in this crate
/// are literals known to be valid.
macro_rules! selector {
    ($css:literal) => {{
        static CELL: std::sync::OnceLock<scraper::Selector> = std::sync::OnceLock::new();
        CELL.get_or_init(|| {
            scraper::Selector::parse($css).expect("static selector should be valid")
        })
    }};
}

pub(crate) use selector;
