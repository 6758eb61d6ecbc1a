//! Adventar calendar parser.
//!
//! Adventar renders the calendar as a grid of `td.cell` day cells. A cell
//! that has an author carries an `.inner` block with the day number and the
//! author's `.userName`. The article links are not in the grid; they live in
//! a separate `li.item` list where each item has a formatted date such as
//! `12/1`, a `.link a[href]` and an optional `.comment`. Cells and items are
//! joined on the trailing day number of that date.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::{CalendarParser, element_text};
use crate::error::ParseError;
use crate::models::{ArticleEntry, CalendarPeriod};

pub const SITE: &str = "adventar";

static DAY_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td.cell").unwrap());
static POSTED_MARKER: Lazy<Selector> = Lazy::new(|| Selector::parse(".inner").unwrap());
static DAY_NUMBER: Lazy<Selector> = Lazy::new(|| Selector::parse(".day").unwrap());
static USER_NAME: Lazy<Selector> = Lazy::new(|| Selector::parse(".userName").unwrap());
static ENTRY_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li.item").unwrap());
static ENTRY_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse(".date").unwrap());
static ENTRY_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(".link a[href]").unwrap());
static ENTRY_COMMENT: Lazy<Selector> = Lazy::new(|| Selector::parse(".comment").unwrap());
static TRAILING_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());

#[derive(Debug, Clone)]
pub struct AdventarParser {
    period: CalendarPeriod,
}

/// URL and optional comment of a posted entry.
type PostedEntry = (String, Option<String>);

impl AdventarParser {
    pub fn new(period: CalendarPeriod) -> Self {
        Self { period }
    }

    /// Posted entries keyed by day. The first item for a day wins.
    fn posted_entries(document: &Html) -> HashMap<u32, PostedEntry> {
        let mut posted = HashMap::new();

        for item in document.select(&ENTRY_ITEM) {
            let Some(day) = item
                .select(&ENTRY_DATE)
                .next()
                .and_then(|date| trailing_day(&element_text(date)))
            else {
                continue;
            };
            let Some(url) = item
                .select(&ENTRY_LINK)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
            else {
                continue;
            };
            let comment = item
                .select(&ENTRY_COMMENT)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty());

            posted.entry(day).or_insert((url.to_string(), comment));
        }
        posted
    }
}

/// Day number at the end of a formatted date like `12/1`.
fn trailing_day(date_text: &str) -> Option<u32> {
    TRAILING_DAY
        .captures(date_text)
        .and_then(|caps| caps[1].parse().ok())
}

impl CalendarParser for AdventarParser {
    fn parse(&self, markup: &str) -> Result<Vec<ArticleEntry>, ParseError> {
        let document = Html::parse_document(markup);

        let cells: Vec<_> = document.select(&DAY_CELL).collect();
        if cells.is_empty() {
            return Err(ParseError::new(SITE, "no calendar day cells (td.cell) found"));
        }

        let posted = Self::posted_entries(&document);
        let mut entries = Vec::new();

        for cell in cells {
            if cell.select(&POSTED_MARKER).next().is_none() {
                continue;
            }
            let Some(day) = cell
                .select(&DAY_NUMBER)
                .next()
                .and_then(|el| element_text(el).parse::<u32>().ok())
            else {
                continue;
            };
            let Some(handle_name) = cell.select(&USER_NAME).next().map(element_text) else {
                continue;
            };
            let Some((url, comment)) = posted.get(&day) else {
                debug!(day, %handle_name, "No article posted for day yet");
                continue;
            };
            let Some(entry_date) = self.period.date(day) else {
                warn!(day, ?self.period, "Day is outside the calendar month; skipping");
                continue;
            };

            entries.push(ArticleEntry {
                entry_date,
                handle_name,
                url: url.clone(),
                comment: comment.clone(),
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cell(day: u32, user: &str) -> String {
        format!(
            r#"<td class="cell"><div class="inner"><div class="day">{day}</div><div class="userName">{user}</div></div></td>"#
        )
    }

    fn item(date: &str, href: &str, comment: Option<&str>) -> String {
        let comment = comment
            .map(|c| format!(r#"<div class="comment">{c}</div>"#))
            .unwrap_or_default();
        format!(
            r#"<li class="item"><div class="date">{date}</div><div class="link"><a href="{href}">{href}</a></div>{comment}</li>"#
        )
    }

    fn page(cells: &[String], items: &[String]) -> String {
        format!(
            r#"<html><body><table class="mod-calendar"><tr>{}</tr></table><ul class="mod-entryList">{}</ul></body></html>"#,
            cells.concat(),
            items.concat()
        )
    }

    fn parse(markup: &str) -> Result<Vec<ArticleEntry>, ParseError> {
        AdventarParser::new(CalendarPeriod::default()).parse(markup)
    }

    #[test]
    fn test_posted_days_become_entries() {
        let markup = page(
            &[cell(1, "alice"), cell(2, "carol"), cell(3, "bob")],
            &[
                item("12/1", "https://alice.example/post", Some("hello")),
                item("12/3", "https://bob.example/post", None),
            ],
        );

        let entries = parse(&markup).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].entry_date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(entries[0].handle_name, "alice");
        assert_eq!(entries[0].url, "https://alice.example/post");
        assert_eq!(entries[0].comment.as_deref(), Some("hello"));

        assert_eq!(entries[1].entry_date, NaiveDate::from_ymd_opt(2024, 12, 3).unwrap());
        assert_eq!(entries[1].handle_name, "bob");
        assert_eq!(entries[1].comment, None);
    }

    #[test]
    fn test_author_without_article_is_skipped() {
        let markup = page(&[cell(5, "dave")], &[]);
        assert!(parse(&markup).unwrap().is_empty());
    }

    #[test]
    fn test_empty_cells_and_bad_day_numbers_are_skipped() {
        let markup = page(
            &[
                r#"<td class="cell"></td>"#.to_string(),
                r#"<td class="cell"><div class="inner"><div class="day">x</div><div class="userName">eve</div></div></td>"#.to_string(),
                cell(7, "frank"),
            ],
            &[item("12/7", "https://frank.example", None)],
        );

        let entries = parse(&markup).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].handle_name, "frank");
    }

    #[test]
    fn test_missing_user_name_is_skipped() {
        let markup = page(
            &[r#"<td class="cell"><div class="inner"><div class="day">2</div></div></td>"#.to_string()],
            &[item("12/2", "https://x.example", None)],
        );
        assert!(parse(&markup).unwrap().is_empty());
    }

    #[test]
    fn test_n_posted_of_n_plus_m_days() {
        let cells: Vec<String> = (1..=25).map(|d| cell(d, &format!("user{d}"))).collect();
        let items: Vec<String> = (1..=25)
            .filter(|d| d % 3 == 0)
            .map(|d| item(&format!("12/{d}"), &format!("https://e.example/{d}"), None))
            .collect();

        let entries = parse(&page(&cells, &items)).unwrap();
        assert_eq!(entries.len(), 8);
        assert!(entries.windows(2).all(|w| w[0].entry_date < w[1].entry_date));
    }

    #[test]
    fn test_first_item_for_a_day_wins() {
        let markup = page(
            &[cell(4, "gina")],
            &[
                item("12/4", "https://first.example", None),
                item("12/4", "https://second.example", None),
            ],
        );
        assert_eq!(parse(&markup).unwrap()[0].url, "https://first.example");
    }

    #[test]
    fn test_missing_grid_is_parse_error() {
        let err = parse("<html><body><p>maintenance</p></body></html>").unwrap_err();
        assert_eq!(err.site, SITE);
    }

    #[test]
    fn test_trailing_day() {
        assert_eq!(trailing_day("12/1"), Some(1));
        assert_eq!(trailing_day("2024/12/25 "), Some(25));
        assert_eq!(trailing_day("12/"), None);
    }
}
