//! Axum route handlers for the post drafting API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::posting::drafter::{draft_from_url, PostDraft, PostingContext};
use crate::posting::publisher::{publish_post, OutgoingPost, PublishOutcome, PublishTarget};
use crate::posting::revise::revise_post;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviseRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub post_text: String,
    pub revision_request: String,
    #[serde(default)]
    pub image_candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviseResponse {
    pub title: Option<String>,
    pub body: String,
    pub image_candidates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Defaults to every configured destination.
    #[serde(default)]
    pub targets: Option<Vec<PublishTarget>>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub results: Vec<PublishOutcome>,
}

/// POST /api/v1/posts/draft
pub async fn handle_draft(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<PostDraft>, AppError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }

    let ctx = PostingContext {
        llm: state.llm.as_ref(),
        vision: state.vision.as_ref(),
        scraper: state.scraper.as_ref(),
        images: state.images.as_ref(),
    };
    let draft = draft_from_url(&ctx, url).await?;
    Ok(Json(draft))
}

/// POST /api/v1/posts/revise
///
/// Only the body is rewritten; title and image candidates are echoed back.
pub async fn handle_revise(
    State(state): State<AppState>,
    Json(request): Json<ReviseRequest>,
) -> Result<Json<ReviseResponse>, AppError> {
    if request.post_text.trim().is_empty() {
        return Err(AppError::Validation("post_text cannot be empty".to_string()));
    }
    if request.revision_request.trim().is_empty() {
        return Err(AppError::Validation(
            "revision_request cannot be empty".to_string(),
        ));
    }

    let body = revise_post(
        state.llm.as_ref(),
        &request.post_text,
        request.revision_request.trim(),
    )
    .await?;

    Ok(Json(ReviseResponse {
        title: request.title,
        body,
        image_candidates: request.image_candidates,
    }))
}

/// POST /api/v1/posts/publish
///
/// Publishes a finished post. Per-destination failures are reported in the
/// results; the request fails only when every destination failed.
pub async fn handle_publish(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.body.trim().is_empty() {
        return Err(AppError::Validation("body cannot be empty".to_string()));
    }

    let targets = match request.targets {
        Some(targets) if targets.is_empty() => {
            return Err(AppError::Validation("targets cannot be empty".to_string()));
        }
        Some(targets) => targets,
        None => state.publishers.iter().map(|p| p.target()).collect(),
    };
    if targets.is_empty() {
        return Err(AppError::Validation(
            "no publishing destinations are configured".to_string(),
        ));
    }

    let post = OutgoingPost {
        title: request.title.trim().to_string(),
        body: request.body.trim().to_string(),
        image_url: request.image_url.filter(|url| !url.trim().is_empty()),
    };
    let results = publish_post(&state.publishers, &targets, &post).await?;
    Ok(Json(PublishResponse { results }))
}
