//! Turns a webpage into a short community post.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{TextCompletion, VisionCompletion};
use crate::posting::images::{extract_image_urls, select_best_image, ImageFetcher};
use crate::posting::prompts::{
    DRAFT_PROMPT_TEMPLATE, LENGTH_RETRY_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE,
};
use crate::posting::scraper::PageScraper;

pub const FALLBACK_TITLE: &str = "Community Insights";
pub const BODY_LENGTH: RangeInclusive<usize> = 200..=400;
const MAX_LENGTH_RETRIES: usize = 2;

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)TITLE:\s*(.+?)\s*\nPOST:").unwrap());
static RE_POST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)POST:\s*(.+)$").unwrap());

/// Capabilities the drafting workflow needs, passed explicitly.
pub struct PostingContext<'a> {
    pub llm: &'a dyn TextCompletion,
    pub vision: &'a dyn VisionCompletion,
    pub scraper: &'a dyn PageScraper,
    pub images: &'a dyn ImageFetcher,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub image_candidates: Vec<String>,
    pub selected_image: Option<String>,
    pub source_url: String,
}

/// Scrape, summarize, draft, then pick an image for the drafted body.
/// Image candidates come from the raw page, not the summary.
pub async fn draft_from_url(ctx: &PostingContext<'_>, url: &str) -> Result<PostDraft, AppError> {
    let markdown = ctx.scraper.scrape(url).await?;
    let summary = summarize(ctx.llm, &markdown).await?;
    let (title, body) = draft_post(ctx.llm, &summary).await?;

    let image_candidates = extract_image_urls(&markdown);
    let selected_image = select_best_image(ctx.vision, ctx.images, &image_candidates, &body).await;

    Ok(PostDraft {
        title,
        body,
        image_candidates,
        selected_image,
        source_url: url.to_string(),
    })
}

pub async fn summarize(llm: &dyn TextCompletion, markdown: &str) -> Result<String, AppError> {
    let prompt = fill_template(SUMMARY_PROMPT_TEMPLATE, &[("content", markdown)]);
    let summary = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Summarizing page failed: {e}")))?;
    info!(
        "Summarized {} characters of page content",
        markdown.chars().count()
    );
    Ok(summary)
}

/// Returns `(title, body)`. An out-of-range body is rewritten at most twice;
/// the last attempt is kept.
pub async fn draft_post(
    llm: &dyn TextCompletion,
    summary: &str,
) -> Result<(String, String), AppError> {
    let prompt = fill_template(DRAFT_PROMPT_TEMPLATE, &[("summary", summary)]);
    let response = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Drafting post failed: {e}")))?;

    let (title, mut body) = parse_draft(&response);

    let mut retries = 0;
    while !BODY_LENGTH.contains(&body.chars().count()) && retries < MAX_LENGTH_RETRIES {
        warn!(
            "Post length {} is outside {:?}, rewriting",
            body.chars().count(),
            BODY_LENGTH
        );
        let prompt = fill_template(LENGTH_RETRY_PROMPT_TEMPLATE, &[("post", &body)]);
        body = llm
            .complete(&prompt)
            .await
            .map_err(|e| AppError::Llm(format!("Rewriting post failed: {e}")))?
            .trim()
            .to_string();
        retries += 1;
    }

    info!("Drafted post '{title}' ({} characters)", body.chars().count());
    Ok((title, body))
}

fn parse_draft(response: &str) -> (String, String) {
    let response = response.trim();

    let title = RE_TITLE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let body = RE_POST
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| response.to_string());

    (title, body)
}
