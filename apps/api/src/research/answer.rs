//! Question answering over a finished research report.

use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::TextCompletion;
use crate::research::prompts::ANSWER_PROMPT_TEMPLATE;

/// Answers `question` from `report` alone. Blank questions are not sent.
pub async fn answer_question(
    llm: &dyn TextCompletion,
    report: &str,
    question: &str,
) -> Result<Option<String>, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(None);
    }

    let prompt = fill_template(
        ANSWER_PROMPT_TEMPLATE,
        &[("report", report), ("question", question)],
    );
    let answer = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Answering failed: {e}")))?;

    info!("Answered question with {} characters", answer.chars().count());
    Ok(Some(answer))
}
