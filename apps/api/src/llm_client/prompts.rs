// Shared prompt constants.
// Each workflow that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt used for every completion made through `TextCompletion`.
pub const ANALYST_SYSTEM: &str = "You are a careful research analyst and writer. \
    Follow the output format requested in each message exactly. \
    Do NOT add preambles, apologies, or commentary outside the requested output.";

/// Instruction appended wherever the model must stay inside supplied material.
pub const SOURCE_ONLY_INSTRUCTION: &str = "\
    Use ONLY the material provided in this conversation. \
    Do NOT invent facts, numbers, quotes, or usernames.";

/// Fills `{name}` placeholders in one pass over `template`.
///
/// Only the template is scanned, so substituted values are inserted verbatim
/// even when they contain text that looks like a placeholder. Unknown
/// placeholders are left as written.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
