//! The collect → fetch-content → classify → export pipeline.
//!
//! Articles move through the stages one at a time, in calendar order, and
//! each stage fills in its part of the shared [`Article`] record. Only a
//! failure to fetch or parse the calendar page itself aborts the run; an
//! article whose page cannot be fetched or classified still reaches the CSV
//! with whatever fields were filled in.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::api::{ChatCompletionsClient, CompletionClient};
use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::content::ContentExtractor;
use crate::error::{ConfigError, FetchError, PipelineError};
use crate::fetch::{FetchPage, HttpFetcher, RetryFetch};
use crate::models::{Article, CalendarPeriod, UNCLASSIFIED_GENRE};
use crate::outputs;
use crate::rate_limiter::RateLimiter;
use crate::scrapers::{CalendarSite, parse_calendar_page};

/// How a run ended when nothing fatal happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The CSV was written with `rows` articles.
    Written { path: PathBuf, rows: usize },
    /// The calendar had no posted articles; no CSV was written.
    NothingToDo,
}

/// Resolve a calendar link against the calendar page URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

pub struct Pipeline<F, C> {
    fetcher: F,
    classifier: Classifier<C>,
    extractor: ContentExtractor,
    period: CalendarPeriod,
    request_delay: Duration,
}

impl<F: FetchPage, C: CompletionClient> Pipeline<F, C> {
    pub fn new(
        fetcher: F,
        classifier: Classifier<C>,
        extractor: ContentExtractor,
        period: CalendarPeriod,
        request_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            extractor,
            period,
            request_delay,
        }
    }

    /// Fetch and parse the calendar page into fresh articles.
    #[instrument(level = "info", skip_all, fields(%calendar_url, site = site.name()))]
    pub async fn collect(
        &self,
        calendar_url: &Url,
        site: CalendarSite,
    ) -> Result<Vec<Article>, PipelineError> {
        let markup = self.fetcher.fetch(calendar_url.as_str()).await?;
        let entries = parse_calendar_page(site, self.period, &markup)?;

        Ok(entries
            .into_iter()
            .map(|mut entry| {
                entry.url = resolve_url(calendar_url, &entry.url);
                Article::from(entry)
            })
            .collect())
    }

    /// Fetch each article page and fill in title and content.
    ///
    /// Articles whose page cannot be fetched are passed on unchanged.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn fetch_contents(&self, articles: Vec<Article>) -> Vec<Article> {
        let articles: Vec<Article> = stream::iter(articles)
            .then(|mut article| async move {
                sleep(self.request_delay).await;
                match self.fetcher.fetch(&article.url).await {
                    Ok(markup) => {
                        let (title, content) = self.extractor.extract(&markup);
                        info!(url = %article.url, %title, chars = content.chars().count(), "Extracted article content");
                        article.title = title;
                        article.content = Some(content);
                    }
                    Err(e) => {
                        error!(url = %article.url, error = %e, "Article fetch failed; keeping calendar data only");
                    }
                }
                article
            })
            .collect()
            .await;

        let fetched = articles.iter().filter(|a| a.content.is_some()).count();
        info!(fetched, failed = articles.len() - fetched, "Fetched article contents");
        articles
    }

    /// Classify every article in place.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn classify_all(&self, articles: &mut [Article]) {
        for article in articles.iter_mut() {
            let analysis = self.classifier.classify(article).await;
            article.apply(analysis);
        }

        let unclassified = articles
            .iter()
            .filter(|a| a.genre.as_deref() == Some(UNCLASSIFIED_GENRE))
            .count();
        info!(
            classified = articles.len() - unclassified,
            unclassified, "Classified articles"
        );
    }

    /// Run every stage and write the CSV report to `output_path`.
    #[instrument(level = "info", skip_all, fields(%calendar_url, site = site.name()))]
    pub async fn run(
        &self,
        calendar_url: &Url,
        site: CalendarSite,
        output_path: &Path,
    ) -> Result<RunOutcome, PipelineError> {
        let start_time = Instant::now();

        let articles = self.collect(calendar_url, site).await?;
        if articles.is_empty() {
            warn!("No posted articles found; nothing to write");
            return Ok(RunOutcome::NothingToDo);
        }
        info!(count = articles.len(), "Collected articles");

        let mut articles = self.fetch_contents(articles).await;
        self.classify_all(&mut articles).await;

        outputs::csv::write_articles(&articles, output_path)
            .await
            .map_err(|source| PipelineError::Output {
                path: output_path.display().to_string(),
                source,
            })?;

        let elapsed = start_time.elapsed();
        info!(
            ?elapsed,
            secs = elapsed.as_secs(),
            rows = articles.len(),
            path = %output_path.display(),
            "Execution complete"
        );
        Ok(RunOutcome::Written {
            path: output_path.to_path_buf(),
            rows: articles.len(),
        })
    }
}

/// Build the HTTP-backed pipeline from `config` and run it.
///
/// The calendar host is checked before any client is created. The HTTP
/// clients live inside the pipeline and are released when this returns,
/// whichever way it returns.
pub async fn run(
    config: &AppConfig,
    calendar_url: &str,
    output_path: &Path,
) -> Result<RunOutcome, PipelineError> {
    let url = Url::parse(calendar_url).map_err(|source| ConfigError::InvalidUrl {
        url: calendar_url.to_string(),
        source,
    })?;
    let site = CalendarSite::from_url(&url)?;

    if config.llm.api_key.is_none() {
        warn!("No API key configured; completion requests will be sent unauthenticated");
    }

    let fetcher = RetryFetch::from_config(HttpFetcher::new(&config.fetch)?, &config.fetch);
    let llm_http = reqwest::Client::builder()
        .timeout(config.llm.timeout())
        .build()
        .map_err(FetchError::Client)?;
    let classifier = Classifier::new(
        ChatCompletionsClient::new(llm_http, &config.llm),
        RateLimiter::from_config(&config.rate_limit),
        config.content.max_chars,
    );

    let pipeline = Pipeline::new(
        fetcher,
        classifier,
        ContentExtractor::new(config.content.max_chars),
        config.calendar,
        config.fetch.request_delay(),
    );
    pipeline.run(&url, site, output_path).await
}
