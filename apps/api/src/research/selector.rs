//! Tiered Selector: sorts each score pool and applies its cap.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::platform::{Comment, Submission};
use crate::research::scoring::{ScoredPools, ScoredUnit};

/// Per-pool selection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCaps {
    pub submissions: usize,
    pub posts: usize,
    pub comments: usize,
}

impl SelectionCaps {
    /// The earlier, smaller limits.
    pub const COMPACT: SelectionCaps = SelectionCaps {
        submissions: 4,
        posts: 20,
        comments: 40,
    };
}

impl Default for SelectionCaps {
    fn default() -> Self {
        Self {
            submissions: 10,
            posts: 40,
            comments: 50,
        }
    }
}

/// Top-ranked units per pool, each sorted by descending score.
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    pub submissions: Vec<ScoredUnit<Submission>>,
    pub posts: Vec<ScoredUnit<Submission>>,
    pub comments: Vec<ScoredUnit<Comment>>,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty() && self.posts.is_empty() && self.comments.is_empty()
    }
}

/// Sorts each pool independently and truncates it to its cap.
/// Equal scores keep their pool order.
pub fn select(pools: ScoredPools, caps: &SelectionCaps) -> SelectionResult {
    let result = SelectionResult {
        submissions: top_k(pools.submissions, caps.submissions),
        posts: top_k(pools.posts, caps.posts),
        comments: top_k(pools.comments, caps.comments),
    };

    info!(
        "Selected {} submissions, {} posts, {} comments",
        result.submissions.len(),
        result.posts.len(),
        result.comments.len()
    );
    result
}

fn top_k<T>(mut pool: Vec<ScoredUnit<T>>, cap: usize) -> Vec<ScoredUnit<T>> {
    // `sort_by` is stable, which gives the tie-break.
    pool.sort_by(|a, b| b.score.cmp(&a.score));
    pool.truncate(cap);
    pool
}
