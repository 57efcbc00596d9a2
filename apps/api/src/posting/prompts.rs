// Prompt templates for the post drafting and revision workflows.

/// Page summary. Replace `{content}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"You are an expert content curator. Below is content scraped from a webpage.
Write a well-structured, fact-focused summary that keeps the most important facts and numbers, drops redundant material, and preserves enough context to write an informative community post from it.

Content:
"""
{content}
""""#;

/// Post draft. Replace `{summary}`.
pub const DRAFT_PROMPT_TEMPLATE: &str = r#"You are writing a post for an online discussion community. Based on the text below, create:
1. A title (maximum 100 characters)
2. A post body (between 200 and 400 characters)

Focus on facts, numbers and ideas of conceptual importance rather than specific names or brands. Avoid a promotional tone.

Content:
"""
{summary}
"""

Format your response exactly like this:
TITLE: [your title here]
POST: [your post here]"#;

/// Length correction. Replace `{post}`.
pub const LENGTH_RETRY_PROMPT_TEMPLATE: &str = r#"Rewrite the following post so that it is between 200 and 400 characters long.
Avoid fluff and names, and focus on facts only. Respond with the rewritten post only.

Original post:
"""
{post}
""""#;

/// Revision. Replace `{post}`, `{request}`.
pub const REVISION_PROMPT_TEMPLATE: &str = r#"You are a copy editor. Revise the following community post according to the user's instructions.

<original_post>
{post}
</original_post>

<revision_request>
{request}
</revision_request>

Respond with ONLY the full revised post text."#;

/// Image choice. Images are attached ahead of the text. Replace `{count}`, `{post}`.
pub const IMAGE_CHOICE_PROMPT_TEMPLATE: &str = r#"You are an expert in matching images with content. You are shown {count} images, in order, and a community post.
Decide which image is the most relevant to the post.
Reply ONLY with the number (1-{count}) of the most relevant image.

Post:
"""
{post}
""""#;
