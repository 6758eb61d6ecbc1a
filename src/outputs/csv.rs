//! CSV report output.
//!
//! Columns, in order: date, handle name, title, genre, summary, URL. The
//! header uses the Japanese labels the report has always carried.

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

use crate::models::Article;
use crate::utils::ensure_parent_dir;

pub const HEADERS: [&str; 6] = ["日付", "ハンドルネーム", "タイトル", "ジャンル", "要約", "URL"];

/// Serialize `articles` into CSV bytes.
pub fn to_csv(articles: &[Article]) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for article in articles {
        let date = article.date.format("%Y-%m-%d").to_string();
        writer.write_record([
            date.as_str(),
            article.handle_name.as_str(),
            article.title.as_str(),
            article.genre.as_deref().unwrap_or_default(),
            article.summary.as_deref().unwrap_or_default(),
            article.url.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Write `articles` to `path`, creating parent directories as needed.
///
/// # Arguments
///
/// * `articles` - Rows in the order they should appear
/// * `path` - Destination file; an existing file is overwritten
///
/// # Returns
///
/// An error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub async fn write_articles(
    articles: &[Article],
    path: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let bytes = to_csv(articles)?;
    ensure_parent_dir(path).await?;
    fs::write(path, bytes).await?;
    info!("Wrote CSV report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn article(day: u32, handle: &str, summary: Option<&str>) -> Article {
        Article {
            date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
            handle_name: handle.to_string(),
            title: format!("{handle}'s post"),
            genre: Some("プログラミング".to_string()),
            summary: summary.map(str::to_string),
            url: format!("https://{handle}.example/post"),
            content: Some("body".to_string()),
        }
    }

    fn rows(bytes: &[u8]) -> Vec<Vec<String>> {
        ::csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_header_and_column_order() {
        let bytes = to_csv(&[article(1, "alice", Some("hello"))]).unwrap();
        let rows = rows(&bytes);

        assert_eq!(rows[0], HEADERS);
        assert_eq!(
            rows[1],
            vec![
                "2024-12-01",
                "alice",
                "alice's post",
                "プログラミング",
                "hello",
                "https://alice.example/post"
            ]
        );
    }

    #[test]
    fn test_quotes_fields_with_commas_and_newlines() {
        let bytes = to_csv(&[article(2, "bob", Some("line one,\n\"two\""))]).unwrap();
        assert_eq!(rows(&bytes)[1][4], "line one,\n\"two\"");
    }

    #[test]
    fn test_missing_genre_and_summary_are_empty() {
        let mut a = article(3, "carol", None);
        a.genre = None;
        let rows = rows(&to_csv(&[a]).unwrap());
        assert_eq!(rows[1][3], "");
        assert_eq!(rows[1][4], "");
    }

    #[tokio::test]
    async fn test_write_articles_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/2024/summary.csv");

        write_articles(&[article(1, "alice", None), article(3, "bob", None)], &path)
            .await
            .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(rows(&written).len(), 3);
        assert!(String::from_utf8(written).unwrap().starts_with("日付,"));
    }
}
