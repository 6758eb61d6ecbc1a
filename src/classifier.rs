//! Genre classification and summarization of articles through an LLM.
//!
//! [`Classifier::classify`] never fails: whatever goes wrong (no content,
//! request error, empty or non-JSON completion, missing fields) is logged
//! with the article title and a `reason` field, and the sentinel pair
//! [`Analysis::fallback`] is returned instead.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::CompletionClient;
use crate::error::ClassificationError;
use crate::models::{Analysis, Article};
use crate::rate_limiter::RateLimiter;
use crate::utils::{looks_truncated, truncate_chars, truncate_for_log};

/// Placeholder written into the prompt when the calendar had no comment.
const NO_COMMENT: &str = "なし";

/// Completion payload as the model is asked to return it.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    genre: Option<String>,
    summary: Option<String>,
}

pub struct Classifier<C> {
    client: C,
    limiter: RateLimiter,
    max_content_chars: usize,
}

impl<C: CompletionClient> Classifier<C> {
    pub fn new(client: C, limiter: RateLimiter, max_content_chars: usize) -> Self {
        Self {
            client,
            limiter,
            max_content_chars,
        }
    }

    /// Genre and summary for `article`, or the sentinel pair on any failure.
    #[instrument(level = "info", skip_all, fields(title = %article.title, url = %article.url))]
    pub async fn classify(&self, article: &Article) -> Analysis {
        match self.analyze(article).await {
            Ok(analysis) => {
                info!(genre = %analysis.genre, "Article classified");
                analysis
            }
            Err(e) => {
                warn!(
                    title = %article.title,
                    reason = e.reason(),
                    error = %e,
                    "Article classification failed; using fallback"
                );
                Analysis::fallback()
            }
        }
    }

    async fn analyze(&self, article: &Article) -> Result<Analysis, ClassificationError> {
        let content = article
            .content
            .as_deref()
            .ok_or(ClassificationError::MissingContent)?;

        self.limiter.acquire().await;

        let prompt = render_prompt(article, truncate_chars(content, self.max_content_chars));
        let response = self.client.complete(&prompt).await?;

        let text = response
            .as_ref()
            .and_then(|r| r.first_content())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(ClassificationError::EmptyResponse)?;

        parse_analysis(text)
    }
}

/// Validate a completion's JSON content.
fn parse_analysis(text: &str) -> Result<Analysis, ClassificationError> {
    let raw: RawAnalysis = serde_json::from_str(text).map_err(|e| {
        warn!(
            truncated = looks_truncated(&e),
            response_preview = %truncate_for_log(text, 300),
            "Completion is not valid JSON"
        );
        ClassificationError::InvalidJson(e)
    })?;

    let non_empty = |value: Option<String>, field: &'static str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ClassificationError::MissingField(field))
    };

    Ok(Analysis {
        genre: non_empty(raw.genre, "genre")?,
        summary: non_empty(raw.summary, "summary")?,
    })
}

/// Render the analysis prompt for one article.
///
/// # Arguments
///
/// * `article` - Supplies title, author, date and the calendar comment
///   (`なし` when there is none)
/// * `content` - Body text, already cut to the configured length
///
/// # Returns
///
/// The prompt asking for a JSON object with `genre` and `summary`.
pub fn render_prompt(article: &Article, content: &str) -> String {
    let comment = article
        .summary
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_COMMENT);

    format!(
        r#"以下の技術ブログ記事を分析し、ジャンルと要約を生成してください。

記事タイトル: {title}
投稿者: {handle}
投稿日: {date}
コメント: {comment}

記事本文:
{content}

以下の形式のJSONで出力してください:
{{
    "genre": "記事の主なジャンル（技術カテゴリ）を1つ選択",
    "summary": "記事の主要なポイントを300字程度で要約"
}}

ジャンルの例:
- プログラミング（Python, Go, JavaScriptなど）
- インフラ・運用（AWS, Docker, Kubernetes など）
- 機械学習・AI
- セキュリティ
- 開発手法・プロジェクト管理
- キャリア・組織
- ライフハック
- レビュー・トラブルシューティング
"#,
        title = article.title,
        handle = article.handle_name,
        date = article.date,
    )
}
