//! Community Discovery: asks the completion capability for niche communities.

use tracing::{info, warn};

use crate::llm_client::prompts::fill_template;
use crate::llm_client::{parse_comma_list, TextCompletion};
use crate::research::prompts::COMMUNITY_DISCOVERY_PROMPT_TEMPLATE;

/// Returns candidate community names in the order the model listed them.
///
/// Names are not deduplicated, lowercased, or checked for existence; the
/// collector finds out lazily. Completion failure yields an empty list.
pub async fn discover(llm: &dyn TextCompletion, topic: &str, limit: usize) -> Vec<String> {
    let limit = limit.to_string();
    let prompt = fill_template(
        COMMUNITY_DISCOVERY_PROMPT_TEMPLATE,
        &[("limit", &limit), ("topic", topic)],
    );

    match llm.complete(&prompt).await {
        Ok(response) => {
            let communities = parse_comma_list(&response);
            info!(
                "Discovered {} candidate communities: {:?}",
                communities.len(),
                communities
            );
            communities
        }
        Err(e) => {
            warn!("Community discovery failed for '{topic}': {e}");
            Vec::new()
        }
    }
}
