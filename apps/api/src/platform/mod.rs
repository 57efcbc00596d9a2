//! Discussion-platform capability: searching communities and reading comment trees.
//!
//! The research pipeline only sees the `Platform` trait. `RedditClient` is the
//! production backend; tests use `test_support::FakePlatform`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod reddit;

pub use reddit::RedditClient;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        PlatformError::Network(err.to_string())
    }
}

/// Fields shared by everything the scorer can rank.
pub trait ContentUnit {
    fn id(&self) -> &str;
    fn body_text(&self) -> &str;
    fn native_score(&self) -> i64;
}

/// A top-level post found by community search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub community: String,
    pub title: String,
    pub url: String,
    /// Self-text; empty for link posts.
    pub body: String,
    pub score: i64,
}

/// A reply inside a submission's thread. `submission_id` is a back-reference only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub submission_id: String,
    pub body: String,
    pub score: i64,
}

impl ContentUnit for Submission {
    fn id(&self) -> &str {
        &self.id
    }

    fn body_text(&self) -> &str {
        &self.body
    }

    fn native_score(&self) -> i64 {
        self.score
    }
}

impl ContentUnit for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn body_text(&self) -> &str {
        &self.body
    }

    fn native_score(&self) -> i64 {
        self.score
    }
}

/// What to do with "load more" placeholders in a comment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreComments {
    /// Resolve every placeholder, however many extra requests that takes.
    Expand,
    /// Discard placeholders and keep what the first page returned.
    Drop,
}

/// Search and comment-fetch capability over a discussion platform.
///
/// Searches are relevance-sorted and limited to the past year.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn search(
        &self,
        community: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Submission>, PlatformError>;

    /// Returns the submission's comments flattened breadth-first.
    async fn fetch_comments(
        &self,
        submission: &Submission,
        more: MoreComments,
    ) -> Result<Vec<Comment>, PlatformError>;
}
