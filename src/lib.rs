//! Unofficial client for [Eetlijst.nl](https://www.eetlijst.nl/), the Dutch
//! household dinner list.
//!
//! The site has no API; this crate logs in, scrapes the list page into typed
//! records and posts form submissions back. The markup is an unversioned,
//! unstable contract dictated by the site, so every structural expectation
//! fails with a distinct [`Error::Scrape`] when it breaks.
//!
//! ```no_run
//! use eetlijst::Eetlijst;
//!
//! # fn main() -> eetlijst::Result<()> {
//! let client = Eetlijst::login("username", "password")?;
//! let rows = client.get_dinner_status(Some(1))?;
//! println!("{} attending today", rows[0].attendee_count());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]

mod client;
mod encode;
mod error;
pub mod parse;
mod session;

pub use client::Eetlijst;
pub use encode::{encode_noticeboard_update, encode_status_update, status_from_wire, wire_value};
pub use error::{Error, Result};
pub use parse::{DinnerStatus, ListPage, Resident, StatusCell, StatusRow, TZ_EETLIJST};
pub use session::Session;
