// Community research: topic → communities → ranked content → narrative report.
// All LLM calls go through the `TextCompletion` capability; all platform calls
// through `Platform`.

pub mod answer;
pub mod collector;
pub mod consolidator;
pub mod discovery;
pub mod handlers;
pub mod keywords;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod selector;
pub mod synthesizer;
