//! Data models for calendar entries and the articles flowing through the pipeline.
//!
//! - [`ArticleEntry`]: one posted day as read off the calendar page
//! - [`Article`]: the working record each pipeline stage fills in
//! - [`Analysis`]: genre and summary produced by the classifier
//! - [`CalendarPeriod`]: the year and month the calendar covers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Genre written when classification fails for any reason.
pub const UNCLASSIFIED_GENRE: &str = "未分類";

/// Summary written when classification fails for any reason.
pub const SUMMARY_FAILED: &str = "要約の生成に失敗しました";

/// Year and month a calendar page covers.
///
/// Calendar pages only show day numbers, so the parsers need this to build
/// full dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarPeriod {
    pub year: i32,
    pub month: u32,
}

impl CalendarPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ConfigError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Date for `day` in this period, or `None` if the month has no such day.
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl Default for CalendarPeriod {
    fn default() -> Self {
        Self {
            year: 2024,
            month: 12,
        }
    }
}

/// A posted day on the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    pub entry_date: NaiveDate,
    /// Author identifier as displayed on the calendar; not unique.
    pub handle_name: String,
    /// Article link as found in the markup, absolute or relative.
    pub url: String,
    /// Inline text from the calendar cell, if any.
    pub comment: Option<String>,
}

/// The record each pipeline stage mutates in place.
///
/// `genre` stays `None` until classification; `content` stays `None` until
/// the article page has been fetched and extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub date: NaiveDate,
    pub handle_name: String,
    pub title: String,
    pub genre: Option<String>,
    /// Starts as the calendar comment; replaced by the classifier.
    pub summary: Option<String>,
    pub url: String,
    pub content: Option<String>,
}

impl From<ArticleEntry> for Article {
    fn from(entry: ArticleEntry) -> Self {
        Self {
            date: entry.entry_date,
            handle_name: entry.handle_name,
            title: String::new(),
            genre: None,
            summary: entry.comment,
            url: entry.url,
            content: None,
        }
    }
}

impl Article {
    pub fn apply(&mut self, analysis: Analysis) {
        self.genre = Some(analysis.genre);
        self.summary = Some(analysis.summary);
    }
}

/// Genre and summary for one article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Analysis {
    pub genre: String,
    pub summary: String,
}

impl Analysis {
    /// The sentinel pair used whenever classification fails.
    pub fn fallback() -> Self {
        Self {
            genre: UNCLASSIFIED_GENRE.to_string(),
            summary: SUMMARY_FAILED.to_string(),
        }
    }
}
