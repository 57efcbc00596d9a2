// All LLM prompt templates for the research workflow.
// Placeholders are filled with `fill_template` before sending.

/// Keyword expansion. Replace `{topic}`.
pub const KEYWORD_EXPANSION_PROMPT_TEMPLATE: &str = r#"You are a search query expert. For the given topic, generate a list of highly relevant keywords and phrases that people would use when discussing it.
You can give phrases but prefer single keywords (~2/3) over phrases (~1/3).
Respond with a comma-separated list and nothing else.

Topic: "{topic}""#;

/// Community discovery. Replace `{limit}`, `{topic}`.
pub const COMMUNITY_DISCOVERY_PROMPT_TEMPLATE: &str = r#"You are a Reddit search expert. For the given topic, list the best {limit} communities to find high-quality, specific discussions.
Prioritize niche communities over massive general ones. For example, for "Canadian immigration for tech workers", prefer ImmigrationCanada over canada.
Stay on the topic itself: for "ai agents" prefer communities about agent frameworks over general robotics.
Do not include the "r/" prefix. Respond with a comma-separated list and nothing else.

Topic: "{topic}""#;

/// First synthesis turn. Replace `{topic}`, `{part}`.
pub const REPORT_INGEST_PROMPT_TEMPLATE: &str = r#"You are a world-class research analyst building a deep and comprehensive knowledge base about the topic: '{topic}'.
Here is the first half of raw data collected from online discussion communities. It contains full discussion threads, individual relevant posts, and highly relevant individual comments.

Read and internally process all of it. Note preliminary themes, stories, anecdotes, and user sentiment.
Do NOT write the report yet. Acknowledge receipt and end your reply with the phrase "Ready for Part 2."

<raw_community_data_part_1>
{part}
</raw_community_data_part_1>"#;

/// Second synthesis turn. Replace `{part}`, `{source_only}`.
pub const REPORT_SYNTHESIS_PROMPT_TEMPLATE: &str = r#"Here is the second and final part of the raw data.

<raw_community_data_part_2>
{part}
</raw_community_data_part_2>

Using the information from BOTH Part 1 and Part 2, write a single, comprehensive markdown report that can serve as a knowledge base for answering questions.
{source_only}

Structure it with these sections:
1. **Executive Summary:** a high-level overview of the whole discussion.
2. **Key Themes & Sub-Topics:** the 3-5 main themes, each explained in detail.
3. **Prevailing Sentiments:** the overall mood, with anonymous examples.
4. **Common Questions & Unanswered Problems:** what people keep asking and trying to solve.
5. **Notable Stories & Anecdotes:** 2-3 specific user experiences, retold; quote short parts if useful.
6. **Actionable Insights & Data Points:** concrete advice, statistics, and hard facts that were mentioned.

Output ONLY the markdown report."#;

/// Question answering over a finished report. Replace `{report}`, `{question}`.
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"You are a research analyst. Answer the user's question using ONLY the research report below as your source of truth.

First work out what the user wants: a specific fact, a general summary, a story or anecdote, or the community's sentiment. Then find the 2-4 most relevant parts of the report and synthesize them; do not copy-paste.

Formatting:
- Facts or data: a direct answer, then bullet points with the supporting data.
- Summary: a short paragraph, then a bulleted list of key takeaways.
- Story or anecdote: retell the most relevant story as a narrative.
- Sentiment: summarize the different viewpoints.
If the report does not contain the information, say exactly: "I'm sorry, but the research report does not contain specific information about that topic."

<research_report>
{report}
</research_report>

User's question: "{question}""#;
