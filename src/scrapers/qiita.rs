//! Qiita Advent Calendar parser.
//!
//! Qiita renders the calendar as a table with one row per week. The class
//! names below are the ones Qiita's CSS-in-JS build emits; they are the only
//! stable hooks the page offers. A posted cell holds a container with the
//! article link and the author link. The article title doubles as the
//! comment since this layout has no separate comment text.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::{CalendarParser, element_text};
use crate::error::ParseError;
use crate::models::{ArticleEntry, CalendarPeriod};

pub const SITE: &str = "qiita";

static CALENDAR_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("section.style-t7g594").unwrap());
static CALENDAR_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.style-1lopqp4").unwrap());
static TABLE_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").unwrap());
static WEEK_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.style-8kv4rj").unwrap());
static DAY_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td.style-1dw8kp9").unwrap());
static ARTICLE_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.style-176zglo").unwrap());
static ARTICLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.style-14mbwqe").unwrap());
static AUTHOR_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.style-zfknvc").unwrap());

/// Day of the month for a cell in week row `row_index` (0-based) and
/// column `column` (1-based).
pub fn table_day(row_index: usize, column: usize) -> u32 {
    (row_index * 7 + column) as u32
}

#[derive(Debug, Clone)]
pub struct QiitaParser {
    period: CalendarPeriod,
}

impl QiitaParser {
    pub fn new(period: CalendarPeriod) -> Self {
        Self { period }
    }
}

impl CalendarParser for QiitaParser {
    fn parse(&self, markup: &str) -> Result<Vec<ArticleEntry>, ParseError> {
        let document = Html::parse_document(markup);

        let section = document
            .select(&CALENDAR_SECTION)
            .next()
            .ok_or_else(|| ParseError::new(SITE, "calendar section not found"))?;
        let table = section
            .select(&CALENDAR_TABLE)
            .next()
            .ok_or_else(|| ParseError::new(SITE, "calendar table not found"))?;
        let body = table
            .select(&TABLE_BODY)
            .next()
            .ok_or_else(|| ParseError::new(SITE, "calendar table has no body"))?;

        let mut entries = Vec::new();

        for (row_index, row) in body.select(&WEEK_ROW).enumerate() {
            for (cell_index, cell) in row.select(&DAY_CELL).enumerate() {
                let column = cell_index + 1;
                let Some(container) = cell.select(&ARTICLE_CONTAINER).next() else {
                    continue;
                };

                // Only a posted day has an article link.
                let Some(link) = container.select(&ARTICLE_LINK).next() else {
                    continue;
                };
                let Some(url) = link
                    .value()
                    .attr("href")
                    .map(str::trim)
                    .filter(|href| !href.is_empty())
                else {
                    continue;
                };
                let Some(author) = container.select(&AUTHOR_LINK).next() else {
                    continue;
                };

                let day = table_day(row_index, column);
                let Some(entry_date) = self.period.date(day) else {
                    warn!(day, row_index, column, "Cell maps outside the calendar month; skipping");
                    continue;
                };
                let title = element_text(link);
                debug!(day, %url, "Found posted article");

                entries.push(ArticleEntry {
                    entry_date,
                    handle_name: element_text(author).replace('@', ""),
                    url: url.to_string(),
                    comment: Some(title).filter(|t| !t.is_empty()),
                });
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn posted(user: &str, href: &str, title: &str) -> String {
        format!(
            r#"<td class="style-1dw8kp9"><div class="style-176zglo"><a class="style-zfknvc" href="/{user}">@{user}</a><a class="style-14mbwqe" href="{href}">{title}</a></div></td>"#
        )
    }

    fn reserved(user: &str) -> String {
        format!(
            r#"<td class="style-1dw8kp9"><div class="style-176zglo"><a class="style-zfknvc" href="/{user}">@{user}</a></div></td>"#
        )
    }

    fn empty() -> String {
        r#"<td class="style-1dw8kp9"></td>"#.to_string()
    }

    fn page(rows: &[Vec<String>]) -> String {
        let rows: String = rows
            .iter()
            .map(|cells| format!(r#"<tr class="style-8kv4rj">{}</tr>"#, cells.concat()))
            .collect();
        format!(
            r#"<html><body><section class="style-t7g594"><table class="style-1lopqp4"><thead><tr><th>Sun</th></tr></thead><tbody>{rows}</tbody></table></section></body></html>"#
        )
    }

    fn parse(markup: &str) -> Result<Vec<ArticleEntry>, ParseError> {
        QiitaParser::new(CalendarPeriod::default()).parse(markup)
    }

    #[test]
    fn test_table_day_arithmetic() {
        assert_eq!(table_day(0, 1), 1);
        assert_eq!(table_day(0, 7), 7);
        assert_eq!(table_day(1, 1), 8);
        assert_eq!(table_day(3, 4), 25);
    }

    #[test]
    fn test_posted_cells_become_entries() {
        let mut week1 = vec![posted("alice", "https://qiita.com/alice/items/1", "Rust tips")];
        week1.extend((2..=7).map(|_| empty()));
        let mut week2 = vec![empty(), empty()];
        week2.push(posted("bob", "https://bob.example/post", "Go notes"));

        let entries = parse(&page(&[week1, week2])).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].entry_date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(entries[0].handle_name, "alice");
        assert_eq!(entries[0].url, "https://qiita.com/alice/items/1");
        assert_eq!(entries[0].comment.as_deref(), Some("Rust tips"));

        assert_eq!(entries[1].entry_date.day(), 10);
        assert_eq!(entries[1].handle_name, "bob");
    }

    #[test]
    fn test_author_without_article_is_skipped() {
        let entries = parse(&page(&[vec![reserved("carol"), posted("dave", "/x", "t")]])).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].handle_name, "dave");
        assert_eq!(entries[0].entry_date.day(), 2);
    }

    #[test]
    fn test_article_without_author_is_skipped() {
        let cell = r#"<td class="style-1dw8kp9"><div class="style-176zglo"><a class="style-14mbwqe" href="/x">t</a></div></td>"#;
        assert!(parse(&page(&[vec![cell.to_string()]])).unwrap().is_empty());
    }

    #[test]
    fn test_structure_present_without_posts_is_empty() {
        let entries = parse(&page(&[vec![empty(), reserved("erin")]])).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = parse("<html><body><table></table></body></html>").unwrap_err();
        assert!(err.reason.contains("section"));
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let err = parse(r#"<section class="style-t7g594"><p>nothing</p></section>"#).unwrap_err();
        assert!(err.reason.contains("table"));
    }

    #[test]
    fn test_days_past_month_end_are_skipped() {
        let rows: Vec<Vec<String>> = (0..5)
            .map(|r| {
                (1..=7)
                    .map(|c| posted(&format!("u{r}{c}"), "https://e.example", "t"))
                    .collect()
            })
            .collect();
        // Five full weeks reach day 35; December stops at 31.
        assert_eq!(parse(&page(&rows)).unwrap().len(), 31);
    }
}
