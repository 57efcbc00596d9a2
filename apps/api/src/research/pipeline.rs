//! Research workflow: orchestrates the full pipeline for one topic.
//!
//! Flow: discover → expand → collect → score → select → consolidate → synthesize.
//! Each empty stage ends the run with a terminal outcome instead of feeding
//! empty input downstream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::ResearchConfig;
use crate::llm_client::TextCompletion;
use crate::platform::Platform;
use crate::research::collector::collect;
use crate::research::consolidator::{consolidate, ConsolidatedItem};
use crate::research::discovery::discover;
use crate::research::keywords::{expand, KeywordSet};
use crate::research::scoring::score;
use crate::research::selector::{select, SelectionResult};
use crate::research::synthesizer::synthesize;

/// Everything one run needs, passed explicitly.
pub struct ResearchContext<'a> {
    pub llm: &'a dyn TextCompletion,
    pub platform: &'a dyn Platform,
    pub config: &'a ResearchConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionCounts {
    pub submissions: usize,
    pub posts: usize,
    pub comments: usize,
}

impl From<&SelectionResult> for SelectionCounts {
    fn from(selection: &SelectionResult) -> Self {
        Self {
            submissions: selection.submissions.len(),
            posts: selection.posts.len(),
            comments: selection.comments.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub run_id: Uuid,
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    pub communities: Vec<String>,
    pub keywords: KeywordSet,
    pub counts: SelectionCounts,
    pub items: Vec<ConsolidatedItem>,
    pub report: String,
}

#[derive(Debug, Clone)]
pub enum ResearchOutcome {
    /// Discovery produced no venues; nothing was searched.
    NoCommunities,
    /// Venues were searched but nothing survived collection or selection.
    NoContent {
        communities: Vec<String>,
        keywords: KeywordSet,
    },
    Completed(Box<ResearchReport>),
}

pub async fn run_research(ctx: &ResearchContext<'_>, topic: &str) -> ResearchOutcome {
    info!("Starting research on '{topic}'");

    let communities = discover(ctx.llm, topic, ctx.config.community_limit).await;
    if communities.is_empty() {
        info!("No communities found for '{topic}'");
        return ResearchOutcome::NoCommunities;
    }

    let keywords = expand(ctx.llm, topic).await;

    let submissions = collect(
        ctx.platform,
        &communities,
        topic,
        ctx.config.per_community_limit,
    )
    .await;
    if submissions.is_empty() {
        info!("No submissions found in any community for '{topic}'");
        return ResearchOutcome::NoContent {
            communities,
            keywords,
        };
    }

    let pools = score(ctx.platform, &submissions, &keywords).await;
    let selection = select(pools, &ctx.config.caps);
    if selection.is_empty() {
        info!("Nothing survived selection for '{topic}'");
        return ResearchOutcome::NoContent {
            communities,
            keywords,
        };
    }

    let counts = SelectionCounts::from(&selection);
    let items = consolidate(ctx.platform, &selection, ctx.config.thread_comments).await;
    let report = synthesize(ctx.llm, topic, &items).await;

    let run_id = Uuid::new_v4();
    info!("Research run {run_id} on '{topic}' completed");

    ResearchOutcome::Completed(Box::new(ResearchReport {
        run_id,
        topic: topic.to_string(),
        generated_at: Utc::now(),
        communities,
        keywords,
        counts,
        items,
        report,
    }))
}
