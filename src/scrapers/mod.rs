//! Calendar page parsers.
//!
//! Each supported calendar site lays its page out differently, so each has
//! its own [`CalendarParser`]:
//!
//! | Site | Module | Layout |
//! |------|--------|--------|
//! | Adventar | [`adventar`] | day grid plus a separate list of posted entries |
//! | Qiita | [`qiita`] | week-per-row table, article and author links inside each cell |
//!
//! [`CalendarSite::from_url`] picks the parser from the calendar URL's host.
//! Unknown hosts are rejected before anything is fetched.

pub mod adventar;
pub mod qiita;

use scraper::ElementRef;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::{ConfigError, ParseError};
use crate::models::{ArticleEntry, CalendarPeriod};

/// Turns calendar page markup into posted-day entries.
///
/// Implementations return `Err` only when the calendar structure itself is
/// missing. A calendar with no posted days yields `Ok(vec![])`.
pub trait CalendarParser {
    fn parse(&self, markup: &str) -> Result<Vec<ArticleEntry>, ParseError>;
}

/// The calendar sites this tool knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarSite {
    Adventar,
    Qiita,
}

impl CalendarSite {
    /// Known hosts, matched exactly or as a parent domain.
    const HOSTS: [(&'static str, CalendarSite); 2] = [
        ("adventar.org", CalendarSite::Adventar),
        ("qiita.com", CalendarSite::Qiita),
    ];

    pub fn from_url(url: &Url) -> Result<Self, ConfigError> {
        let host = url.host_str().unwrap_or_default();
        Self::HOSTS
            .iter()
            .find(|(known, _)| host == *known || host.ends_with(&format!(".{known}")))
            .map(|(_, site)| *site)
            .ok_or_else(|| ConfigError::UnsupportedHost(host.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Adventar => adventar::SITE,
            Self::Qiita => qiita::SITE,
        }
    }

    pub fn parser(&self, period: CalendarPeriod) -> Box<dyn CalendarParser + Send + Sync> {
        match self {
            Self::Adventar => Box::new(adventar::AdventarParser::new(period)),
            Self::Qiita => Box::new(qiita::QiitaParser::new(period)),
        }
    }
}

/// Parse a calendar page with the parser for `site`.
///
/// # Arguments
///
/// * `site` - Which calendar layout the markup uses
/// * `period` - Year and month that day numbers are resolved against
/// * `markup` - Raw HTML of the calendar page
///
/// # Returns
///
/// The posted entries sorted by date (possibly none, which is logged as a
/// warning), or a [`ParseError`] when the page lacks the structure the
/// parser needs.
#[instrument(level = "info", skip(markup), fields(site = site.name()))]
pub fn parse_calendar_page(
    site: CalendarSite,
    period: CalendarPeriod,
    markup: &str,
) -> Result<Vec<ArticleEntry>, ParseError> {
    let mut entries = site.parser(period).parse(markup)?;
    entries.sort_by_key(|entry| entry.entry_date);

    if entries.is_empty() {
        warn!("Calendar parsed but no posted articles were found");
    } else {
        info!(count = entries.len(), "Parsed calendar entries");
    }
    Ok(entries)
}

/// Trimmed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
