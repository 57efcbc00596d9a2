//! Axum route handlers for the Research API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::research::answer::answer_question;
use crate::research::consolidator::ConsolidatedItem;
use crate::research::keywords::KeywordSet;
use crate::research::pipeline::{run_research, ResearchContext, ResearchOutcome, SelectionCounts};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub question: Option<String>,
    /// Include the consolidated payload in the response.
    #[serde(default)]
    pub include_items: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Completed,
    NoCommunities,
    NoContent,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub run_id: Option<Uuid>,
    pub status: ResearchStatus,
    pub topic: String,
    pub communities: Vec<String>,
    pub keywords: KeywordSet,
    pub counts: SelectionCounts,
    pub report: Option<String>,
    pub answer: Option<String>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ConsolidatedItem>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/research
///
/// Runs the research pipeline for a topic and optionally answers a question
/// from the resulting report. Empty outcomes are reported with a status, not
/// as errors.
pub async fn handle_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, AppError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }

    let ctx = ResearchContext {
        llm: state.llm.as_ref(),
        platform: state.platform.as_ref(),
        config: &state.config.research,
    };

    let response = match run_research(&ctx, topic).await {
        ResearchOutcome::NoCommunities => ResearchResponse {
            run_id: None,
            status: ResearchStatus::NoCommunities,
            topic: topic.to_string(),
            communities: Vec::new(),
            keywords: KeywordSet::default(),
            counts: SelectionCounts::default(),
            report: None,
            answer: None,
            message: Some("Could not find any relevant communities for this topic.".to_string()),
            items: None,
        },
        ResearchOutcome::NoContent {
            communities,
            keywords,
        } => ResearchResponse {
            run_id: None,
            status: ResearchStatus::NoContent,
            topic: topic.to_string(),
            communities,
            keywords,
            counts: SelectionCounts::default(),
            report: None,
            answer: None,
            message: Some("No relevant posts or comments found matching the topic.".to_string()),
            items: None,
        },
        ResearchOutcome::Completed(report) => {
            let answer = match request.question.as_deref() {
                Some(question) => {
                    answer_question(state.llm.as_ref(), &report.report, question).await?
                }
                None => None,
            };
            let report = *report;
            ResearchResponse {
                run_id: Some(report.run_id),
                status: ResearchStatus::Completed,
                topic: report.topic,
                communities: report.communities,
                keywords: report.keywords,
                counts: report.counts,
                report: Some(report.report),
                answer,
                message: None,
                items: request.include_items.then_some(report.items),
            }
        }
    };

    Ok(Json(response))
}
