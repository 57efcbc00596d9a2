//! Candidate Collector: searches each community and merges unique submissions.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::platform::{ContentUnit, Platform, Submission};

/// Searches every community for `topic` and returns submissions deduplicated
/// by id, in first-seen order.
///
/// A failing community (private, banned, renamed) is logged and skipped.
pub async fn collect(
    platform: &dyn Platform,
    communities: &[String],
    topic: &str,
    per_community_limit: usize,
) -> Vec<Submission> {
    if communities.is_empty() {
        return Vec::new();
    }

    let mut collected = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for community in communities {
        let results = match platform.search(community, topic, per_community_limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Error searching r/{community}: {e}");
                continue;
            }
        };

        let mut added = 0usize;
        for submission in results {
            if seen.insert(submission.id().to_string()) {
                collected.push(submission);
                added += 1;
            }
        }
        info!("Found {added} new submissions in r/{community}");
    }

    info!("Total unique submissions collected: {}", collected.len());
    collected
}
