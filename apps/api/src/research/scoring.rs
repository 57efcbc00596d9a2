//! Relevance Scorer: three parallel score pools per run.
//!
//! - submissions: every collected submission, scored on its own keyword
//!   density plus that of its whole comment tree, plus its native score
//! - posts: submissions whose title/body density is positive
//! - comments: comments whose own density is positive

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::platform::{Comment, ContentUnit, MoreComments, Platform, Submission};
use crate::research::keywords::KeywordSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringWeights {
    /// Per keyword hit in a submission title.
    pub title: i64,
    /// Per keyword hit in a submission body.
    pub body: i64,
    /// Per keyword hit in a comment, for the comment's own score.
    pub comment: i64,
    /// Multiplier applied to a thread's accumulated relevance.
    pub thread_relevance: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title: 5,
            body: 2,
            comment: 3,
            thread_relevance: 2,
        }
    }
}

/// A content unit paired with its score for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredUnit<T> {
    pub score: i64,
    pub unit: T,
}

impl<T> ScoredUnit<T> {
    pub fn new(score: i64, unit: T) -> Self {
        Self { score, unit }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoredPools {
    pub submissions: Vec<ScoredUnit<Submission>>,
    pub posts: Vec<ScoredUnit<Submission>>,
    pub comments: Vec<ScoredUnit<Comment>>,
}

/// Title/body keyword density of a submission, ignoring its comments.
pub fn post_only_score(
    submission: &Submission,
    keywords: &KeywordSet,
    weights: &ScoringWeights,
) -> i64 {
    weights.title * keywords.occurrences(&submission.title)
        + weights.body * keywords.occurrences(submission.body_text())
}

/// Scores every submission, fetching each full comment tree on the way.
///
/// A failed comment fetch only removes the comment contribution; the
/// submission still lands in the submissions pool.
pub async fn score(
    platform: &dyn Platform,
    submissions: &[Submission],
    keywords: &KeywordSet,
) -> ScoredPools {
    let weights = ScoringWeights::default();
    let mut pools = ScoredPools::default();

    for (i, submission) in submissions.iter().enumerate() {
        let post_score = post_only_score(submission, keywords, &weights);
        debug!(
            "[{}/{}] {}: title+body score {}, native score {}",
            i + 1,
            submissions.len(),
            submission.id,
            post_score,
            submission.native_score()
        );

        if post_score > 0 {
            pools
                .posts
                .push(ScoredUnit::new(post_score + submission.native_score(), submission.clone()));
        }

        let mut thread_relevance = post_score;
        match platform.fetch_comments(submission, MoreComments::Expand).await {
            Ok(comments) => {
                for comment in comments {
                    let hits = keywords.occurrences(comment.body_text());
                    thread_relevance += hits;

                    let comment_score = weights.comment * hits;
                    if comment_score > 0 {
                        pools
                            .comments
                            .push(ScoredUnit::new(comment_score + comment.native_score(), comment));
                    }
                }
            }
            Err(e) => warn!("Failed to process comments for {}: {e}", submission.id),
        }

        let final_score = weights.thread_relevance * thread_relevance + submission.native_score();
        pools
            .submissions
            .push(ScoredUnit::new(final_score, submission.clone()));
    }

    info!(
        "Scored {} submissions, {} posts, {} comments",
        pools.submissions.len(),
        pools.posts.len(),
        pools.comments.len()
    );
    pools
}
