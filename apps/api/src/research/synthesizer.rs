//! Report Synthesizer driver.
//!
//! Renders the consolidated payload to text, then runs a two-turn exchange:
//! turn one delivers the first half and asks the model to wait, turn two
//! delivers the second half and requests the report.

use std::fmt::Write;

use tracing::{error, info};

use crate::llm_client::prompts::{fill_template, SOURCE_ONLY_INSTRUCTION};
use crate::llm_client::{ChatSession, TextCompletion};
use crate::research::consolidator::ConsolidatedItem;
use crate::research::prompts::{
    REPORT_INGEST_PROMPT_TEMPLATE, REPORT_SYNTHESIS_PROMPT_TEMPLATE,
};

/// Report returned when the payload renders to nothing.
pub fn no_content_report(topic: &str) -> String {
    format!("# Report on {topic}\n\nNo relevant content could be processed.")
}

fn failed_report(reason: &str) -> String {
    format!(
        "# Report Generation Failed\n\n\
         An error occurred while communicating with the completion service: {reason}"
    )
}

/// Renders every item with its type's template, in payload order.
pub fn render_items(items: &[ConsolidatedItem]) -> String {
    let mut out = String::new();
    for item in items {
        // Writing into a String cannot fail.
        let _ = render_item(&mut out, item);
    }
    out
}

fn render_item(out: &mut String, item: &ConsolidatedItem) -> std::fmt::Result {
    match item {
        ConsolidatedItem::FullSubmission {
            title,
            body,
            top_comments,
            ..
        } => {
            let body = if body.is_empty() { "No body text." } else { body.as_str() };
            write!(
                out,
                "\n\n--- Discussion Thread Start ---\nTitle: {title}\nPost Body: {body}\n"
            )?;
            if !top_comments.is_empty() {
                out.push_str("Key Comments:\n");
                for c in top_comments {
                    writeln!(out, "- (Score: {}) {}", c.score, c.body)?;
                }
            }
            writeln!(out, "--- Discussion Thread End ---")
        }
        ConsolidatedItem::IndividualPost { title, body, .. } => write!(
            out,
            "\n\n--- Relevant Post ---\nTitle: {title}\nPost Body: {body}\n\
             --- End Relevant Post ---\n"
        ),
        ConsolidatedItem::CommentNuggets { comments } => {
            out.push_str("\n\n--- Highly Relevant Individual Comments ---\n");
            for c in comments {
                writeln!(out, "- (Score: {}) \"{}\"", c.score, c.body)?;
            }
            writeln!(out, "--- End Individual Comments ---")
        }
    }
}

/// Splits `text` at its midpoint counted in characters.
pub fn split_at_midpoint(text: &str) -> (&str, &str) {
    let midpoint = text.chars().count() / 2;
    let byte_index = text
        .char_indices()
        .nth(midpoint)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.split_at(byte_index)
}

/// Produces the markdown report for `items`.
///
/// Blank payloads short-circuit to `no_content_report` without any
/// completion call. Completion failures produce a failure report rather
/// than an error.
pub async fn synthesize(
    llm: &dyn TextCompletion,
    topic: &str,
    items: &[ConsolidatedItem],
) -> String {
    let context = render_items(items);
    if context.trim().is_empty() {
        info!("No content to synthesize for '{topic}'");
        return no_content_report(topic);
    }

    let (part_one, part_two) = split_at_midpoint(&context);
    info!(
        "Synthesizing report from {} characters in two turns",
        context.chars().count()
    );

    let mut session = ChatSession::new(llm);

    let ingest = fill_template(
        REPORT_INGEST_PROMPT_TEMPLATE,
        &[("topic", topic), ("part", part_one)],
    );
    if let Err(e) = session.send(ingest).await {
        error!("Report synthesis failed on the first turn: {e}");
        return failed_report(&e.to_string());
    }

    let synthesis = fill_template(
        REPORT_SYNTHESIS_PROMPT_TEMPLATE,
        &[("part", part_two), ("source_only", SOURCE_ONLY_INSTRUCTION)],
    );
    match session.send(synthesis).await {
        Ok(report) => {
            info!(
                "Report generated: {} characters after {} turns",
                report.chars().count(),
                session.turns().len()
            );
            report
        }
        Err(e) => {
            error!("Report synthesis failed on the second turn: {e}");
            failed_report(&e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::research::consolidator::CommentNugget;
    use crate::test_support::ScriptedCompletion;

    fn thread() -> ConsolidatedItem {
        ConsolidatedItem::FullSubmission {
            id: "a".to_string(),
            title: "Borrow checker pain".to_string(),
            url: "https://example.com/a".to_string(),
            score: 10,
            body: String::new(),
            top_comments: vec![CommentNugget {
                body: "use Rc".to_string(),
                score: 4,
            }],
        }
    }

    #[tokio::test]
    async fn test_empty_payload_returns_placeholder_without_calls() {
        let llm = ScriptedCompletion::new(["should not be used"]);
        let report = synthesize(&llm, "rust", &[]).await;
        assert_eq!(report, no_content_report("rust"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_two_turns_deliver_the_whole_payload() {
        let items = vec![
            thread(),
            ConsolidatedItem::CommentNuggets {
                comments: vec![CommentNugget {
                    body: "lifetimes click eventually".to_string(),
                    score: 2,
                }],
            },
        ];
        let llm = ScriptedCompletion::new(["Ready for Part 2.", "# Final report"]);

        let report = synthesize(&llm, "rust", &items).await;

        assert_eq!(report, "# Final report");
        let conversations = llm.conversations();
        assert_eq!(conversations.len(), 2);
        let second = &conversations[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);

        let rendered = render_items(&items);
        let (one, two) = split_at_midpoint(&rendered);
        assert!(second[0].content.contains(one));
        assert!(second[2].content.contains(two));
    }

    #[tokio::test]
    async fn test_split_inside_a_thread_loses_nothing() {
        let mut long_thread = thread();
        if let ConsolidatedItem::FullSubmission { body, .. } = &mut long_thread {
            *body = "ownership ".repeat(40);
        }
        let items = vec![
            long_thread,
            ConsolidatedItem::IndividualPost {
                id: "p".to_string(),
                title: "Lifetimes".to_string(),
                body: "Elision rules".to_string(),
                score: 3,
            },
            ConsolidatedItem::CommentNuggets {
                comments: vec![CommentNugget {
                    body: "clone less".to_string(),
                    score: 1,
                }],
            },
        ];
        let rendered = render_items(&items);
        let (one, two) = split_at_midpoint(&rendered);

        assert_eq!(format!("{one}{two}"), rendered);
        assert!(one.contains("--- Discussion Thread Start ---"));
        assert!(!one.contains("--- Discussion Thread End ---"));

        let llm = ScriptedCompletion::new(["Ready for Part 2.", "# Report"]);
        synthesize(&llm, "rust", &items).await;

        let turns = &llm.conversations()[1];
        assert!(turns[0].content.contains(one));
        assert!(turns[2].content.contains(two));
        assert!(turns[2].content.contains("--- End Individual Comments ---"));
    }

    #[tokio::test]
    async fn test_payload_braces_do_not_consume_placeholders() {
        let items = vec![
            ConsolidatedItem::IndividualPost {
                id: "p".to_string(),
                title: "Templates".to_string(),
                body: "{source_only} {part} {topic}".to_string(),
                score: 1,
            },
            ConsolidatedItem::CommentNuggets {
                comments: vec![CommentNugget {
                    body: "padding ".repeat(40),
                    score: 1,
                }],
            },
        ];
        let llm = ScriptedCompletion::new(["Ready for Part 2.", "# Report"]);

        synthesize(&llm, "rust", &items).await;

        let turns = &llm.conversations()[1];
        assert!(turns[0].content.contains("Post Body: {source_only} {part} {topic}"));
        assert!(turns[0].content.contains("about the topic: 'rust'"));
    }

    #[tokio::test]
    async fn test_completion_failure_yields_failure_report() {
        let llm = ScriptedCompletion::failing();
        let report = synthesize(&llm, "rust", &[thread()]).await;
        assert!(report.starts_with("# Report Generation Failed"));
    }

    #[test]
    fn test_render_uses_per_type_templates() {
        let text = render_items(&[
            thread(),
            ConsolidatedItem::IndividualPost {
                id: "p".to_string(),
                title: "Post".to_string(),
                body: "Body".to_string(),
                score: 1,
            },
        ]);
        assert!(text.contains("--- Discussion Thread Start ---"));
        assert!(text.contains("Post Body: No body text."));
        assert!(text.contains("- (Score: 4) use Rc"));
        assert!(text.contains("--- Relevant Post ---\nTitle: Post\nPost Body: Body"));
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let (a, b) = split_at_midpoint("ééééé!");
        assert_eq!(a, "ééé");
        assert_eq!(b, "éé!");
        assert_eq!(split_at_midpoint(""), ("", ""));
    }
}
