//! Consolidator: merges the three selections into one ordered payload.
//!
//! Order: full threads, then standalone posts not already covered by a
//! thread, then a single trailing batch of comments.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::platform::{Comment, ContentUnit, MoreComments, Platform};
use crate::research::selector::SelectionResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNugget {
    pub body: String,
    pub score: i64,
}

impl From<&Comment> for CommentNugget {
    fn from(comment: &Comment) -> Self {
        Self {
            body: comment.body.clone(),
            score: comment.score,
        }
    }
}

/// One record of the synthesis payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsolidatedItem {
    FullSubmission {
        id: String,
        title: String,
        url: String,
        score: i64,
        body: String,
        top_comments: Vec<CommentNugget>,
    },
    IndividualPost {
        id: String,
        title: String,
        body: String,
        score: i64,
    },
    /// Not keyed by a unit id; never deduplicated.
    CommentNuggets { comments: Vec<CommentNugget> },
}

/// Builds the payload. No submission id appears in both a `FullSubmission`
/// and an `IndividualPost`.
///
/// Each thread gets the first `thread_comments` comments of its listing,
/// with "load more" placeholders dropped. A failed fetch leaves the thread
/// without comments.
pub async fn consolidate(
    platform: &dyn Platform,
    selection: &SelectionResult,
    thread_comments: usize,
) -> Vec<ConsolidatedItem> {
    let mut items = Vec::new();
    let mut processed: HashSet<&str> = HashSet::new();

    for scored in &selection.submissions {
        let submission = &scored.unit;
        if !processed.insert(submission.id()) {
            continue;
        }

        let top_comments = match platform.fetch_comments(submission, MoreComments::Drop).await {
            Ok(comments) => comments
                .iter()
                .take(thread_comments)
                .map(CommentNugget::from)
                .collect(),
            Err(e) => {
                warn!("Error fetching comments for submission {}: {e}", submission.id);
                Vec::new()
            }
        };

        items.push(ConsolidatedItem::FullSubmission {
            id: submission.id.clone(),
            title: submission.title.clone(),
            url: submission.url.clone(),
            score: submission.score,
            body: submission.body.clone(),
            top_comments,
        });
    }

    for scored in &selection.posts {
        let post = &scored.unit;
        if !processed.insert(post.id()) {
            continue;
        }
        items.push(ConsolidatedItem::IndividualPost {
            id: post.id.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
            score: post.score,
        });
    }

    if !selection.comments.is_empty() {
        items.push(ConsolidatedItem::CommentNuggets {
            comments: selection
                .comments
                .iter()
                .map(|scored| CommentNugget::from(&scored.unit))
                .collect(),
        });
    }

    info!("Consolidation complete: {} items for reporting", items.len());
    items
}
