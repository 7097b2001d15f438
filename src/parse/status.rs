use std::sync::OnceLock;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use scraper::ElementRef;

use crate::error::{Error, Result};

/// Eetlijst.nl renders every date and time in this zone.
pub const TZ_EETLIJST: Tz = chrono_tz::Europe::Amsterdam;

/// One resident's declaration for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DinnerStatus {
    /// Explicitly not attending.
    No,
    /// Attending dinner, possibly bringing guests.
    Dinner { guests: u32 },
    /// Cooking, possibly bringing guests.
    Cook { guests: u32 },
    /// No response yet.
    Unknown,
}

impl DinnerStatus {
    /// Number of people this status puts at the table.
    pub fn attendees(self) -> u32 {
        match self {
            Self::No | Self::Unknown => 0,
            Self::Dinner { guests } | Self::Cook { guests } => 1 + guests,
        }
    }

    pub fn is_cook(self) -> bool {
        matches!(self, Self::Cook { .. })
    }

    /// Attending but not cooking.
    pub fn is_diner(self) -> bool {
        matches!(self, Self::Dinner { .. })
    }
}

impl std::fmt::Display for DinnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::No => write!(f, "no"),
            Self::Dinner { guests: 0 } => write!(f, "dinner"),
            Self::Dinner { guests } => write!(f, "dinner +{guests}"),
            Self::Cook { guests: 0 } => write!(f, "cook"),
            Self::Cook { guests } => write!(f, "cook +{guests}"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// One cell of the status grid. `last_changed` is only known for the first
/// grid row, where the site renders an "onveranderd sinds HH:MM" tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCell {
    status: DinnerStatus,
    last_changed: Option<DateTime<Tz>>,
}

impl StatusCell {
    pub(crate) fn new(status: DinnerStatus, last_changed: Option<DateTime<Tz>>) -> Self {
        Self {
            status,
            last_changed,
        }
    }

    pub fn status(&self) -> DinnerStatus {
        self.status
    }

    pub fn last_changed(&self) -> Option<DateTime<Tz>> {
        self.last_changed
    }

    /// Decode one `<td>` of the grid. The mapping from rendered image to
    /// status is exhaustive; a cell matching none of the known images is a
    /// scrape error, never a silent default.
    ///
    /// `date` is the row's calendar date and is only given for the first
    /// grid row, to anchor the naive "onveranderd sinds" time.
    pub(crate) fn from_html_element(cell: ElementRef, date: Option<NaiveDate>) -> Result<Self> {
        let markup = cell.inner_html();
        let text = cell.text().collect::<String>();
        let guests = guest_count(&text)?;

        let status = if markup.contains("nop.gif") {
            DinnerStatus::No
        } else if markup.contains("kook.gif") {
            DinnerStatus::Cook { guests }
        } else if markup.contains("eet.gif") {
            DinnerStatus::Dinner { guests }
        } else if markup.contains("leeg.gif") {
            DinnerStatus::Unknown
        } else {
            return Err(Error::scrape("unrecognized dinner status cell"));
        };

        let last_changed = match date {
            Some(date) => Some(last_changed(&markup, date)?),
            None => None,
        };

        Ok(Self::new(status, last_changed))
    }
}

/// Guest count from an embedded "+N" notation, 0 when absent. A count too
/// large to represent is a scrape error, not a silent 0; misreporting a
/// headcount is worse than failing.
fn guest_count(text: &str) -> Result<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\+\s*(\d+)").expect("regex should be valid"));
    match re.captures(text) {
        Some(caps) => caps[1]
            .parse()
            .map_err(|_| Error::scrape("guest count out of range")),
        None => Ok(0),
    }
}

/// The "onveranderd sinds HH:MM" marker is a naive time of day; midnight is
/// assumed when it is absent. The result is anchored to the row's date in
/// the site's zone.
fn last_changed(markup: &str, date: NaiveDate) -> Result<DateTime<Tz>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"onveranderd sinds (\d{1,2}):(\d{2})").expect("regex should be valid")
    });

    let time = match re.captures(&markup.to_lowercase()) {
        Some(caps) => {
            let hour = caps[1]
                .parse()
                .map_err(|_| Error::scrape("invalid hour in last-changed marker"))?;
            let minute = caps[2]
                .parse()
                .map_err(|_| Error::scrape("invalid minute in last-changed marker"))?;
            NaiveTime::from_hms_opt(hour, minute, 0)
                .ok_or_else(|| Error::scrape("invalid time in last-changed marker"))?
        }
        None => NaiveTime::MIN,
    };

    localize(date, time)
}

/// Anchor a naive time of day to a calendar date in Europe/Amsterdam. On the
/// fall-back day, where the clock passes 02:00-03:00 twice, the earlier
/// instant wins. Times skipped by spring-forward do not exist and fail.
pub(crate) fn localize(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>> {
    match TZ_EETLIJST.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(Error::scrape(
            "time of day does not exist in Europe/Amsterdam on this date",
        )),
    }
}

/// One row of the dinner status grid: a date, an optional deadline and one
/// status per resident, in resident column order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    timestamp: DateTime<Utc>,
    deadline: Option<DateTime<Tz>>,
    statuses: Vec<StatusCell>,
}

impl StatusRow {
    pub(crate) fn new(
        timestamp: DateTime<Utc>,
        deadline: Option<DateTime<Tz>>,
        statuses: Vec<StatusCell>,
    ) -> Self {
        Self {
            timestamp,
            deadline,
            statuses,
        }
    }

    /// The row's instant as embedded in the page, also used as the `day[]`
    /// key when submitting changes for this row.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Calendar date of the row, in the site's zone.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&TZ_EETLIJST).date_naive()
    }

    /// Response deadline, if the list uses deadlines.
    pub fn deadline(&self) -> Option<DateTime<Tz>> {
        self.deadline
    }

    /// Statuses in resident column order.
    pub fn statuses(&self) -> &[StatusCell] {
        &self.statuses
    }

    pub fn has_deadline_passed(&self) -> bool {
        self.has_deadline_passed_at(Utc::now())
    }

    /// False when the list has no deadline.
    pub fn has_deadline_passed_at(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => deadline.with_timezone(&Utc) < now,
            None => false,
        }
    }

    pub fn time_left(&self) -> Result<Duration> {
        self.time_left_at(Utc::now())
    }

    /// Time until the deadline, negative once it has passed. Lists without a
    /// deadline run until the end of the row's day in the site's zone.
    pub fn time_left_at(&self, now: DateTime<Utc>) -> Result<Duration> {
        let until = match self.deadline {
            Some(deadline) => deadline,
            None => localize(
                self.date(),
                NaiveTime::from_hms_opt(23, 59, 59).expect("valid time"),
            )?,
        };

        Ok(until.with_timezone(&Utc) - now)
    }

    pub fn has_cook(&self) -> bool {
        self.statuses.iter().any(|cell| cell.status().is_cook())
    }

    pub fn has_diners(&self) -> bool {
        self.statuses.iter().any(|cell| cell.status().is_diner())
    }

    /// Ordinals of all cooks.
    pub fn cooks(&self) -> Vec<usize> {
        self.extract(DinnerStatus::is_cook)
    }

    /// Ordinals of all diners that are not cooks.
    pub fn diners(&self) -> Vec<usize> {
        self.extract(DinnerStatus::is_diner)
    }

    /// Ordinals of residents that declared not to attend.
    pub fn absentees(&self) -> Vec<usize> {
        self.extract(|status| status == DinnerStatus::No)
    }

    /// Ordinals of residents that have not responded yet.
    pub fn unknowns(&self) -> Vec<usize> {
        self.extract(|status| status == DinnerStatus::Unknown)
    }

    /// Number of people at the table, guests included.
    pub fn attendee_count(&self) -> u32 {
        self.statuses
            .iter()
            .map(|cell| cell.status().attendees())
            .sum()
    }

    fn extract(&self, test: impl Fn(DinnerStatus) -> bool) -> Vec<usize> {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, cell)| test(cell.status()))
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(epoch: i64, with_deadline: bool, statuses: &[DinnerStatus]) -> StatusRow {
        let timestamp = Utc
            .timestamp_opt(epoch, 0)
            .single()
            .expect("valid timestamp");
        let deadline = with_deadline.then(|| timestamp.with_timezone(&TZ_EETLIJST));
        StatusRow::new(
            timestamp,
            deadline,
            statuses
                .iter()
                .map(|&status| StatusCell::new(status, None))
                .collect(),
        )
    }

    fn decode_cell(cell_html: &str) -> Result<StatusCell> {
        let document =
            scraper::Html::parse_document(&format!("<table><tr>{cell_html}</tr></table>"));
        let cell = document
            .select(crate::parse::selector!("td"))
            .next()
            .expect("cell should parse");
        StatusCell::from_html_element(cell, None)
    }

    #[test]
    fn guest_count_parses_plus_notation() {
        assert_eq!(guest_count("D + 2").unwrap(), 2);
        assert_eq!(guest_count("D").unwrap(), 0);
    }

    #[test]
    fn cell_without_guest_notation_defaults_to_zero() {
        let cell = decode_cell(r#"<td><img src="eet.gif"></td>"#).unwrap();
        assert_eq!(cell.status(), DinnerStatus::Dinner { guests: 0 });
    }

    #[test]
    fn oversized_guest_count_is_a_scrape_error() {
        let result = decode_cell(r#"<td><img src="eet.gif"> + 99999999999</td>"#);
        assert!(matches!(result, Err(Error::Scrape(_))));
    }

    #[test]
    fn attendees_include_guests() {
        assert_eq!(DinnerStatus::Dinner { guests: 2 }.attendees(), 3);
        assert_eq!(DinnerStatus::Cook { guests: 0 }.attendees(), 1);
        assert_eq!(DinnerStatus::No.attendees(), 0);
        assert_eq!(DinnerStatus::Unknown.attendees(), 0);
    }

    #[test]
    fn row_queries() {
        // 2014-03-30 16:00 Europe/Amsterdam (CEST, after spring-forward).
        let row = row(
            1_396_188_000,
            true,
            &[
                DinnerStatus::Cook { guests: 0 },
                DinnerStatus::Dinner { guests: 2 },
                DinnerStatus::No,
                DinnerStatus::No,
                DinnerStatus::Unknown,
            ],
        );

        assert_eq!(row.date(), NaiveDate::from_ymd_opt(2014, 3, 30).unwrap());
        assert_eq!(row.cooks(), vec![0]);
        assert_eq!(row.diners(), vec![1]);
        assert_eq!(row.absentees(), vec![2, 3]);
        assert_eq!(row.unknowns(), vec![4]);
        assert!(row.has_cook());
        assert!(row.has_diners());
        assert_eq!(row.attendee_count(), 4);
    }

    #[test]
    fn deadline_passed_across_spring_forward() {
        // Deadline 16:00 local on the day the Netherlands springs forward;
        // local 16:00 is 14:00 UTC because the offset is already +02:00.
        let row = row(1_396_188_000, true, &[DinnerStatus::Unknown]);

        let before = Utc.with_ymd_and_hms(2014, 3, 30, 13, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2014, 3, 30, 14, 0, 1).unwrap();

        assert!(!row.has_deadline_passed_at(before));
        assert!(row.has_deadline_passed_at(after));
    }

    #[test]
    fn deadline_passed_across_fall_back() {
        // Deadline 16:00 local on the fall-back day; the offset is back to
        // +01:00 by the afternoon, so local 16:00 is 15:00 UTC.
        let row = row(1_414_335_600, true, &[DinnerStatus::Unknown]);

        assert_eq!(row.date(), NaiveDate::from_ymd_opt(2014, 10, 26).unwrap());

        let before = Utc.with_ymd_and_hms(2014, 10, 26, 14, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2014, 10, 26, 15, 0, 1).unwrap();

        assert!(!row.has_deadline_passed_at(before));
        assert!(row.has_deadline_passed_at(after));
    }

    #[test]
    fn no_deadline_never_passes() {
        let row = row(1_396_188_000, false, &[DinnerStatus::Unknown]);
        let late = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(!row.has_deadline_passed_at(late));
    }

    #[test]
    fn time_left_falls_back_to_end_of_day() {
        let row = row(1_396_188_000, false, &[DinnerStatus::Unknown]);
        // End of 2014-03-30 in Amsterdam is 21:59:59 UTC (day is 23h long).
        let now = Utc.with_ymd_and_hms(2014, 3, 30, 21, 59, 0).unwrap();
        assert_eq!(row.time_left_at(now).unwrap(), Duration::seconds(59));
    }

    #[test]
    fn localize_spring_forward_gap_fails() {
        let date = NaiveDate::from_ymd_opt(2014, 3, 30).unwrap();
        let skipped = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert!(matches!(localize(date, skipped), Err(crate::Error::Scrape(_))));
    }

    #[test]
    fn localize_fall_back_picks_earliest() {
        let date = NaiveDate::from_ymd_opt(2014, 10, 26).unwrap();
        let ambiguous = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let localized = localize(date, ambiguous).unwrap();
        // The first 02:30 is still summer time, +02:00.
        assert_eq!(
            localized.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2014, 10, 26, 0, 30, 0).unwrap()
        );
    }
}
