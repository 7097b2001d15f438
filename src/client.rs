use chrono::NaiveDate;
use scraper::Html;

use crate::encode::{encode_noticeboard_update, encode_status_update};
use crate::error::{Error, Result};
use crate::parse::{DinnerStatus, ListPage, Resident, StatusRow};
use crate::session::Session;

/// Facade over session, parser and encoder. Every read re-fetches and
/// re-parses the list page; remote state can change between calls and
/// staleness is left to the caller's own polling cadence.
///
/// One instance owns one session. Use from multiple threads must be
/// serialized by the caller.
#[derive(Debug)]
pub struct Eetlijst {
    session: Session,
}

impl Eetlijst {
    /// Log in with credentials and keep the resulting session.
    pub fn login(username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            session: Session::login(username, password)?,
        })
    }

    /// Reuse a previously obtained session identifier, trusting the caller.
    pub fn from_session_id(id: impl Into<String>) -> Self {
        Self {
            session: Session::from_id(id),
        }
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn is_valid(&self) -> bool {
        self.session.is_valid()
    }

    pub fn get_list_name(&self) -> Result<String> {
        Ok(self.list_page()?.list_name().to_string())
    }

    pub fn get_residents(&self) -> Result<Vec<Resident>> {
        Ok(self.list_page()?.residents().to_vec())
    }

    pub fn get_noticeboard(&self) -> Result<String> {
        Ok(self.list_page()?.noticeboard().to_string())
    }

    /// Replace the noticeboard wholesale; there are no merge semantics.
    pub fn set_noticeboard(&self, message: &str) -> Result<()> {
        let response = self
            .session
            .post_list_page(encode_noticeboard_update(message))?;

        // The site answers a submission with the refreshed list page.
        ListPage::from_html(&Html::parse_document(&response))
            .map_err(|_| Error::submit("noticeboard update was not confirmed"))?;
        Ok(())
    }

    /// Status rows starting today, optionally limited.
    pub fn get_dinner_status(&self, limit: Option<usize>) -> Result<Vec<StatusRow>> {
        let page = self.list_page()?;
        let mut rows = page.status_rows().to_vec();
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    /// Change one resident's status for one day. The submit form is whole
    /// row, so the current grid is fetched first and every other resident's
    /// status is echoed back unchanged.
    pub fn set_dinner_status(
        &self,
        date: NaiveDate,
        resident_ordinal: usize,
        status: DinnerStatus,
    ) -> Result<()> {
        let page = self.list_page()?;
        let row = page
            .status_rows()
            .iter()
            .find(|row| row.date() == date)
            .ok_or_else(|| Error::submit("no status row for the requested date"))?;

        let fields = encode_status_update(row, resident_ordinal, status)?;
        let response = self.session.post_list_page(fields)?;

        let updated = ListPage::from_html(&Html::parse_document(&response))
            .map_err(|_| Error::submit("status update was not confirmed"))?;

        // Verify the change actually landed in the refreshed grid.
        let reflected = updated
            .status_rows()
            .iter()
            .find(|row| row.date() == date)
            .and_then(|row| row.statuses().get(resident_ordinal))
            .map(|cell| cell.status());

        if reflected != Some(status) {
            return Err(Error::submit("status update not reflected in response"));
        }

        Ok(())
    }

    fn list_page(&self) -> Result<ListPage> {
        let html = self.session.fetch_list_page()?;
        ListPage::from_html(&Html::parse_document(&html))
    }
}
