use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::TextCompletion;
use crate::posting::prompts::REVISION_PROMPT_TEMPLATE;

/// Applies a free-text revision request to a post body and returns the new body.
pub async fn revise_post(
    llm: &dyn TextCompletion,
    post_text: &str,
    revision_request: &str,
) -> Result<String, AppError> {
    let prompt = fill_template(
        REVISION_PROMPT_TEMPLATE,
        &[("post", post_text), ("request", revision_request)],
    );
    let revised = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Revising post failed: {e}")))?;

    info!("Revised post ({} characters)", revised.chars().count());
    Ok(revised.trim().to_string())
}
