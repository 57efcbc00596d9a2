//! Twitter (X) backend for the `Publisher` capability, over the v2 API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::platform::PlatformError;
use crate::posting::publisher::{OutgoingPost, PublishTarget, Publisher};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
pub const MAX_TWEET_CHARS: usize = 280;

/// Posts with an OAuth 2.0 user-context access token.
pub struct TwitterClient {
    client: reqwest::Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterClient {
    pub fn new(access_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            access_token,
        }
    }
}

/// Shortens `text` to the tweet limit, ending with an ellipsis when cut.
pub fn fit_tweet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_TWEET_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_TWEET_CHARS - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

#[async_trait]
impl Publisher for TwitterClient {
    fn target(&self) -> PublishTarget {
        PublishTarget::Twitter
    }

    /// Tweets the body only; the title and image stay on the community post.
    async fn publish(&self, post: &OutgoingPost) -> Result<String, PlatformError> {
        let resp = self
            .client
            .post(TWEETS_URL)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "text": fit_tweet(&post.body) }))
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Auth(format!("status {}: {message}", status.as_u16())));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let tweet: TweetResponse = resp
            .json()
            .await
            .map_err(|e| PlatformError::Malformed(format!("tweet response: {e}")))?;
        Ok(format!("https://x.com/i/web/status/{}", tweet.data.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_kept() {
        assert_eq!(fit_tweet("  hello  "), "hello");
    }

    #[test]
    fn test_long_text_is_cut_to_the_limit() {
        let text = "word ".repeat(100);
        let tweet = fit_tweet(&text);
        assert_eq!(tweet.chars().count(), MAX_TWEET_CHARS);
        assert!(tweet.ends_with("word…"));
    }

    #[test]
    fn test_cut_counts_chars_not_bytes() {
        let text = "é".repeat(400);
        let tweet = fit_tweet(&text);
        assert_eq!(tweet.chars().count(), MAX_TWEET_CHARS);
    }
}
