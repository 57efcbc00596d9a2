//! Candidate images for a drafted post: extraction from page markdown,
//! download, and choice by a vision completion.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use regex::Regex;
use tracing::{info, warn};

use crate::llm_client::prompts::fill_template;
use crate::llm_client::{ImageAttachment, VisionCompletion};
use crate::posting::prompts::IMAGE_CHOICE_PROMPT_TEMPLATE;
use crate::posting::scraper::ScrapeError;

/// At most this many candidates are downloaded and shown to the model.
pub const MAX_IMAGE_CANDIDATES: usize = 4;
const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

static RE_MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]+)[^)]*\)").unwrap());
static RE_IMAGE_INDEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([1-9])\b").unwrap());

/// Image targets of every `![alt](url)` in `markdown`, first-seen order, no duplicates.
pub fn extract_image_urls(markdown: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    RE_MARKDOWN_IMAGE
        .captures_iter(markdown)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Downloads an image for a vision completion.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ImageAttachment, ScrapeError>;
}

pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageAttachment, ScrapeError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message: format!("image download failed for {url}"),
            });
        }

        let media_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(normalize_media_type)
            .unwrap_or_else(|| "image/jpeg".to_string());
        if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(ScrapeError::UnsupportedMedia(media_type));
        }

        let data = resp.bytes().await?;
        if data.is_empty() {
            return Err(ScrapeError::EmptyContent);
        }

        Ok(ImageAttachment {
            media_type,
            data: data.to_vec(),
        })
    }
}

fn normalize_media_type(header: &str) -> String {
    let essence = header.split(';').next().unwrap_or_default().trim().to_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

/// Picks the candidate that best fits `post_text`.
///
/// Up to four candidates are sampled at random and downloaded; failed
/// downloads are skipped. Returns `None` when nothing could be downloaded.
/// When the vision call fails or names no valid image, the first
/// downloaded candidate is used.
pub async fn select_best_image(
    vision: &dyn VisionCompletion,
    fetcher: &dyn ImageFetcher,
    candidates: &[String],
    post_text: &str,
) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let mut urls = Vec::new();
    let mut images = Vec::new();
    for url in sample_candidates(candidates) {
        match fetcher.fetch(&url).await {
            Ok(image) => {
                urls.push(url);
                images.push(image);
            }
            Err(e) => warn!("Skipping image {url}: {e}"),
        }
    }

    if images.is_empty() {
        warn!("None of {} candidate images could be downloaded", candidates.len());
        return None;
    }
    if images.len() == 1 {
        return urls.into_iter().next();
    }

    let count = images.len().to_string();
    let prompt = fill_template(
        IMAGE_CHOICE_PROMPT_TEMPLATE,
        &[("count", &count), ("post", post_text)],
    );
    let chosen = match vision.complete_with_images(&prompt, &images).await {
        Ok(reply) => parse_image_index(&reply, urls.len()).or_else(|| {
            warn!("Vision reply named no valid image: {reply:?}");
            None
        }),
        Err(e) => {
            warn!("Image selection failed: {e}");
            None
        }
    };

    let index = chosen.unwrap_or(0);
    info!("Selected image {} of {}", index + 1, urls.len());
    urls.into_iter().nth(index)
}

fn sample_candidates(candidates: &[String]) -> Vec<String> {
    if candidates.len() <= MAX_IMAGE_CANDIDATES {
        return candidates.to_vec();
    }
    let mut rng = rand::rng();
    candidates
        .choose_multiple(&mut rng, MAX_IMAGE_CANDIDATES)
        .cloned()
        .collect()
}

/// Zero-based index of the first standalone number in `1..=count`.
fn parse_image_index(reply: &str, count: usize) -> Option<usize> {
    RE_IMAGE_INDEX
        .captures_iter(reply)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .find(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}
