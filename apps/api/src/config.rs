use anyhow::{bail, Context, Result};

use crate::research::selector::SelectionCaps;

const DEFAULT_USER_AGENT: &str = "community-research-bot/0.1";
const DEFAULT_SUBMIT_COMMUNITY: &str = "test";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub reddit: RedditCredentials,
    pub firecrawl_api_key: String,
    pub research: ResearchConfig,
    pub publish: PublishConfig,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// Publishing destinations. Twitter is enabled only when a token is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Community that drafted posts are submitted to.
    pub reddit_community: String,
    /// OAuth 2.0 user-context token for the Twitter v2 API.
    pub twitter_access_token: Option<String>,
}

impl PublishConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            reddit_community: non_blank("REDDIT_SUBREDDIT")
                .map(|c| c.trim_start_matches("r/").to_string())
                .unwrap_or_else(|| DEFAULT_SUBMIT_COMMUNITY.to_string()),
            twitter_access_token: non_blank("TWITTER_ACCESS_TOKEN"),
        }
    }
}

/// Tunables for one research run. Defaults follow the larger cap triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchConfig {
    /// How many communities discovery asks for.
    pub community_limit: usize,
    /// Search results requested per community (25 is the older setting).
    pub per_community_limit: usize,
    pub caps: SelectionCaps,
    /// Comments attached to each full thread in the consolidated payload.
    pub thread_comments: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            community_limit: 5,
            per_community_limit: 50,
            caps: SelectionCaps::default(),
            thread_comments: 5,
        }
    }
}

impl ResearchConfig {
    /// Builds the research config from a key lookup, falling back to defaults
    /// for absent keys. Present keys must be positive integers.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base_caps = match lookup("RESEARCH_CAPS_PRESET").as_deref().map(str::trim) {
            None | Some("default") => defaults.caps,
            Some("compact") => SelectionCaps::COMPACT,
            Some(other) => {
                bail!("RESEARCH_CAPS_PRESET must be 'default' or 'compact', got '{other}'")
            }
        };
        Ok(Self {
            community_limit: positive_or(
                &lookup,
                "RESEARCH_COMMUNITY_LIMIT",
                defaults.community_limit,
            )?,
            per_community_limit: positive_or(
                &lookup,
                "RESEARCH_PER_COMMUNITY_LIMIT",
                defaults.per_community_limit,
            )?,
            caps: SelectionCaps {
                submissions: positive_or(
                    &lookup,
                    "RESEARCH_SUBMISSION_CAP",
                    base_caps.submissions,
                )?,
                posts: positive_or(&lookup, "RESEARCH_POST_CAP", base_caps.posts)?,
                comments: positive_or(
                    &lookup,
                    "RESEARCH_COMMENT_CAP",
                    base_caps.comments,
                )?,
            },
            thread_comments: positive_or(
                &lookup,
                "RESEARCH_THREAD_COMMENTS",
                defaults.thread_comments,
            )?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            reddit: RedditCredentials {
                client_id: require_env("REDDIT_CLIENT_ID")?,
                client_secret: require_env("REDDIT_CLIENT_SECRET")?,
                username: require_env("REDDIT_USERNAME")?,
                password: require_env("REDDIT_PASSWORD")?,
                user_agent: std::env::var("REDDIT_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            },
            firecrawl_api_key: require_env("FIRECRAWL_API_KEY")?,
            research: ResearchConfig::from_lookup(|key| std::env::var(key).ok())?,
            publish: PublishConfig::from_lookup(|key| std::env::var(key).ok()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn positive_or<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}
