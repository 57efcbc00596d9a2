//! Publishing a finished post to one or more destinations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::platform::PlatformError;

/// Appended to the text post when the image post could not be made.
pub const IMAGE_FALLBACK_NOTE: &str = "[Image submission failed]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishTarget {
    Reddit,
    Twitter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPost {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn target(&self) -> PublishTarget;

    /// Publishes `post` and returns the public URL of the result.
    async fn publish(&self, post: &OutgoingPost) -> Result<String, PlatformError>;
}

/// A post created through a community's submission API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedSubmission {
    /// Fullname used to reply to the post (`t3_…` on Reddit).
    pub fullname: String,
    pub url: String,
}

/// Write access to a discussion community.
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    async fn submit_text(
        &self,
        community: &str,
        title: &str,
        body: &str,
    ) -> Result<PostedSubmission, PlatformError>;

    async fn submit_link(
        &self,
        community: &str,
        title: &str,
        url: &str,
    ) -> Result<PostedSubmission, PlatformError>;

    async fn reply(&self, parent_fullname: &str, body: &str) -> Result<(), PlatformError>;
}

/// Posts to one community. With an image, the image goes up as a link post
/// and the body as its first reply; if that fails, a text post is made instead.
pub struct CommunityPublisher {
    api: Arc<dyn SubmissionApi>,
    community: String,
}

impl CommunityPublisher {
    pub fn new(api: Arc<dyn SubmissionApi>, community: String) -> Self {
        Self { api, community }
    }
}

#[async_trait]
impl Publisher for CommunityPublisher {
    fn target(&self) -> PublishTarget {
        PublishTarget::Reddit
    }

    async fn publish(&self, post: &OutgoingPost) -> Result<String, PlatformError> {
        let Some(image_url) = post.image_url.as_deref() else {
            let posted = self.api.submit_text(&self.community, &post.title, &post.body).await?;
            return Ok(posted.url);
        };

        match self.api.submit_link(&self.community, &post.title, image_url).await {
            Ok(posted) => {
                if let Err(e) = self.api.reply(&posted.fullname, &post.body).await {
                    warn!("Image post {} created but body reply failed: {e}", posted.url);
                }
                Ok(posted.url)
            }
            Err(e) => {
                warn!("Image post to r/{} failed, falling back to text: {e}", self.community);
                let body = format!("{}\n\n{IMAGE_FALLBACK_NOTE}", post.body);
                let posted = self.api.submit_text(&self.community, &post.title, &body).await?;
                Ok(posted.url)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub target: PublishTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Publishes to every requested target, in order.
///
/// Targets are independent: one failure does not stop the rest. The call
/// fails only when every target failed, with the first failure as the cause.
/// Requesting a target with no configured publisher is a validation error
/// and nothing is published.
pub async fn publish_post(
    publishers: &[Arc<dyn Publisher>],
    targets: &[PublishTarget],
    post: &OutgoingPost,
) -> Result<Vec<PublishOutcome>, AppError> {
    let mut selected = Vec::with_capacity(targets.len());
    for target in targets {
        let publisher = publishers
            .iter()
            .find(|p| p.target() == *target)
            .ok_or_else(|| {
                AppError::Validation(format!("{target:?} publishing is not configured"))
            })?;
        selected.push(publisher);
    }

    let mut outcomes = Vec::with_capacity(selected.len());
    let mut first_error: Option<PlatformError> = None;
    for publisher in selected {
        let target = publisher.target();
        match publisher.publish(post).await {
            Ok(url) => {
                info!("Published to {target:?}: {url}");
                outcomes.push(PublishOutcome {
                    target,
                    url: Some(url),
                    error: None,
                });
            }
            Err(e) => {
                warn!("Publishing to {target:?} failed: {e}");
                outcomes.push(PublishOutcome {
                    target,
                    url: None,
                    error: Some(e.to_string()),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if outcomes.iter().all(|o| o.url.is_none()) => Err(AppError::Platform(e)),
        _ => Ok(outcomes),
    }
}
