use std::{borrow::Cow, sync::OnceLock};

use chrono::{TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::{Error, Result};

use super::selector;
use super::status::{StatusCell, StatusRow, TZ_EETLIJST};

/// One household member, in grid column order. The ordinal doubles as the
/// column index of the status grid; parse order and encode order must agree
/// or a submitted status lands on the wrong person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resident {
    name: String,
    ordinal: usize,
}

impl Resident {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Everything scraped from one `main.php` page.
#[derive(Debug, Clone)]
pub struct ListPage {
    list_name: String,
    residents: Vec<Resident>,
    noticeboard: String,
    status_rows: Vec<StatusRow>,
}

impl ListPage {
    pub fn list_name(&self) -> &str {
        &self.list_name
    }

    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    pub fn noticeboard(&self) -> &str {
        &self.noticeboard
    }

    pub fn status_rows(&self) -> &[StatusRow] {
        &self.status_rows
    }

    pub fn from_html(document: &Html) -> Result<Self> {
        let list_name = parse_list_name(document)?;
        let residents = parse_residents(document)?;
        let noticeboard = parse_noticeboard(document)?;
        let status_rows = parse_status_rows(document)?;

        // Column count mismatches would misattribute statuses downstream.
        for row in &status_rows {
            if row.statuses().len() != residents.len() {
                return Err(Error::scrape(
                    "status row column count does not match resident count",
                ));
            }
        }

        Ok(Self {
            list_name,
            residents,
            noticeboard,
            status_rows,
        })
    }
}

fn parse_list_name(document: &Html) -> Result<String> {
    let title = document
        .select(selector!("head title"))
        .next()
        .ok_or_else(|| Error::scrape("page has no title"))?
        .text()
        .collect::<String>();

    let title = title.trim();
    Ok(title
        .strip_prefix("Eetlijst.nl - ")
        .unwrap_or(title)
        .to_string())
}

fn parse_residents(document: &Html) -> Result<Vec<Resident>> {
    let residents: Vec<Resident> = document
        .select(selector!(r#"th a[title^="Meer informatie over"] b"#))
        .enumerate()
        .map(|(ordinal, element)| Resident {
            name: collapse_whitespace(&element.text().collect::<String>())
                .trim()
                .to_string(),
            ordinal,
        })
        .collect();

    if residents.is_empty() {
        return Err(Error::scrape("no resident columns found"));
    }

    Ok(residents)
}

fn parse_noticeboard(document: &Html) -> Result<String> {
    let board = document
        .select(selector!(
            r#"a[title="Klik hier als je het prikbord wilt aanpassen"]"#
        ))
        .next()
        .ok_or_else(|| Error::scrape("noticeboard anchor not found"))?;

    Ok(collapse_whitespace(&board.text().collect::<String>())
        .trim()
        .to_string())
}

fn parse_status_rows(document: &Html) -> Result<Vec<StatusRow>> {
    // The grid carries no id or class; its stable marker is the 80px header
    // cell. Navigate from there up to the enclosing table.
    let marker = document
        .select(selector!(r#"th[width="80"]"#))
        .next()
        .ok_or_else(|| Error::scrape("status table marker not found"))?;

    let table = marker
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "table")
        .ok_or_else(|| Error::scrape("status table marker outside any table"))?;

    let mut rows = Vec::new();
    let mut has_deadline = false;

    for row in table.select(selector!("tr")) {
        // Header rows carry the resident columns, not statuses.
        if row.select(selector!("th")).next().is_some() {
            continue;
        }

        let markup = row.inner_html();

        // Lists with deadlines render "javascript:vs(...)" links and two
        // leading cells; lists without render "javascript:k(...)" and one.
        if rows.is_empty() {
            has_deadline = markup.contains("javascript:vs");
        }
        let (pattern, skip) = if has_deadline {
            (deadline_pattern(), 2)
        } else {
            (plain_pattern(), 1)
        };

        let epoch: i64 = pattern
            .captures(&markup)
            .ok_or_else(|| Error::scrape("status row has no timestamp link"))?[1]
            .parse()
            .map_err(|_| Error::scrape("status row timestamp is not a number"))?;

        let timestamp = Utc
            .timestamp_opt(epoch, 0)
            .single()
            .ok_or_else(|| Error::scrape("status row timestamp out of range"))?;
        let deadline = has_deadline.then(|| timestamp.with_timezone(&TZ_EETLIJST));

        // The "last changed" tooltip only appears on the first grid row.
        let first_row = rows.is_empty();
        let date = timestamp.with_timezone(&TZ_EETLIJST).date_naive();

        let statuses = row
            .select(selector!("td"))
            .skip(skip)
            .map(|cell| StatusCell::from_html_element(cell, first_row.then_some(date)))
            .collect::<Result<Vec<_>>>()?;

        rows.push(StatusRow::new(timestamp, deadline, statuses));
    }

    if rows.is_empty() {
        return Err(Error::scrape("status table has no status rows"));
    }

    Ok(rows)
}

fn deadline_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"javascript:vs\((\d+)\);").expect("regex should be valid"))
}

fn plain_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"javascript:k\((\d+),(-?\d+),(-?\d+)\);").expect("regex should be valid")
    })
}

fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\s\s+").expect("regex should be valid"));
    re.replace_all(s, " ")
}
