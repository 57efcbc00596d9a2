//! Reddit backend for the `Platform` capability, over the OAuth API.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Comment, MoreComments, Platform, PlatformError, Submission};
use crate::config::RedditCredentials;
use crate::posting::publisher::{PostedSubmission, SubmissionApi};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
/// Reddit accepts at most 100 ids per morechildren call.
const MORE_CHILDREN_BATCH: usize = 100;
/// Upper bound on expansion round-trips for one submission.
const MAX_EXPANSION_ROUNDS: usize = 128;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    client: reqwest::Client,
    credentials: RedditCredentials,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawSubmission {
    id: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    replies: Value,
}

/// A "load more" placeholder. With no children it is a "continue this
/// thread" link and the hidden replies live under `parent_id`.
#[derive(Debug, Deserialize)]
struct RawMore {
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    parent_id: String,
}

/// One parsed slice of a comment tree.
#[derive(Debug, Default)]
struct CommentBatch {
    comments: Vec<Comment>,
    /// Comment ids to resolve through morechildren.
    more_ids: Vec<String>,
    /// Parent comment ids whose replies must be fetched as a subtree.
    continue_under: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ExpansionStep {
    MoreChildren(Vec<String>),
    ContinueThread(String),
}

/// Accumulates a submission's comments while placeholders are resolved.
/// Every id is requested at most once and every comment is kept once.
#[derive(Debug, Default)]
struct Expansion {
    comments: Vec<Comment>,
    seen: HashSet<String>,
    more_ids: VecDeque<String>,
    threads: VecDeque<String>,
    requested: HashSet<String>,
}

impl Expansion {
    fn absorb(&mut self, batch: CommentBatch) {
        for comment in batch.comments {
            if self.seen.insert(comment.id.clone()) {
                self.comments.push(comment);
            }
        }
        for id in batch.more_ids {
            if self.requested.insert(format!("more:{id}")) {
                self.more_ids.push_back(id);
            }
        }
        for parent in batch.continue_under {
            if self.requested.insert(format!("thread:{parent}")) {
                self.threads.push_back(parent);
            }
        }
    }

    fn next_step(&mut self) -> Option<ExpansionStep> {
        if !self.more_ids.is_empty() {
            let take = self.more_ids.len().min(MORE_CHILDREN_BATCH);
            return Some(ExpansionStep::MoreChildren(self.more_ids.drain(..take).collect()));
        }
        self.threads.pop_front().map(ExpansionStep::ContinueThread)
    }

    fn pending(&self) -> usize {
        self.more_ids.len() + self.threads.len()
    }
}

/// The `{"json": {"errors": [...], "data": ...}}` envelope of `api_type=json` calls.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    json: ApiJson,
}

#[derive(Debug, Deserialize)]
struct ApiJson {
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    name: String,
    url: String,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(credentials.user_agent.clone())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Returns a bearer token, fetching a new one when the cached token is
    /// missing or about to expire.
    async fn access_token(&self) -> Result<String, PlatformError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        let resp = self
            .client
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Auth(format!("status {}: {message}", status.as_u16())));
        }

        let body: TokenResponse = resp.json().await?;
        let value = match (body.access_token, body.error) {
            (Some(token), _) => token,
            (None, Some(error)) => return Err(PlatformError::Auth(error)),
            (None, None) => {
                return Err(PlatformError::Auth("token response had no access_token".to_string()))
            }
        };

        let expires_at = Instant::now() + Duration::from_secs(body.expires_in.unwrap_or(3600));
        debug!("Obtained Reddit access token");
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, PlatformError> {
        let token = self.access_token().await?;
        let resp = self
            .client
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .query(query)
            .query(&[("raw_json", "1")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetches a comment page, or the subtree under `focus` when given.
    async fn comment_page(
        &self,
        submission_id: &str,
        focus: Option<&str>,
    ) -> Result<CommentBatch, PlatformError> {
        let mut query = vec![("limit", "500".to_string())];
        if let Some(comment_id) = focus {
            query.push(("comment", comment_id.to_string()));
        }
        let value = self
            .get_json(&format!("/comments/{submission_id}"), &query)
            .await?;
        flatten_comment_page(submission_id, value)
    }

    async fn more_children(
        &self,
        submission_id: &str,
        ids: &[String],
    ) -> Result<Vec<Thing>, PlatformError> {
        let value = self
            .get_json(
                "/api/morechildren",
                &[
                    ("api_type", "json".to_string()),
                    ("link_id", format!("t3_{submission_id}")),
                    ("children", ids.join(",")),
                ],
            )
            .await?;

        let Some(data) = api_json_data(value, "morechildren")? else {
            return Ok(Vec::new());
        };
        let data: MoreChildrenData = serde_json::from_value(data)
            .map_err(|e| PlatformError::Malformed(format!("morechildren: {e}")))?;
        Ok(data.things)
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let token = self.access_token().await?;
        let mut fields = form.to_vec();
        fields.push(("api_type", "json"));
        let resp = self
            .client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .form(&fields)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    async fn submit(
        &self,
        community: &str,
        title: &str,
        kind: &str,
        content: (&str, &str),
    ) -> Result<PostedSubmission, PlatformError> {
        let value = self
            .post_form(
                "/api/submit",
                &[
                    ("sr", community),
                    ("kind", kind),
                    ("title", title),
                    content,
                    ("resubmit", "true"),
                ],
            )
            .await?;
        parse_submit_response(value)
    }
}

#[async_trait]
impl SubmissionApi for RedditClient {
    async fn submit_text(
        &self,
        community: &str,
        title: &str,
        body: &str,
    ) -> Result<PostedSubmission, PlatformError> {
        self.submit(community, title, "self", ("text", body)).await
    }

    async fn submit_link(
        &self,
        community: &str,
        title: &str,
        url: &str,
    ) -> Result<PostedSubmission, PlatformError> {
        self.submit(community, title, "link", ("url", url)).await
    }

    async fn reply(&self, parent_fullname: &str, body: &str) -> Result<(), PlatformError> {
        let value = self
            .post_form("/api/comment", &[("thing_id", parent_fullname), ("text", body)])
            .await?;
        api_json_data(value, "comment")?;
        Ok(())
    }
}

#[async_trait]
impl Platform for RedditClient {
    async fn search(
        &self,
        community: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Submission>, PlatformError> {
        let value = self
            .get_json(
                &format!("/r/{community}/search"),
                &[
                    ("q", query.to_string()),
                    ("restrict_sr", "1".to_string()),
                    ("sort", "relevance".to_string()),
                    ("t", "year".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        parse_search_listing(value)
    }

    async fn fetch_comments(
        &self,
        submission: &Submission,
        more: MoreComments,
    ) -> Result<Vec<Comment>, PlatformError> {
        let page = self.comment_page(&submission.id, None).await?;
        if more == MoreComments::Drop {
            return Ok(page.comments);
        }

        let mut expansion = Expansion::default();
        expansion.absorb(page);

        let mut rounds = 0;
        while let Some(step) = expansion.next_step() {
            if rounds == MAX_EXPANSION_ROUNDS {
                warn!(
                    "Stopped expanding comments for {} after {} rounds ({} placeholders left)",
                    submission.id,
                    rounds,
                    expansion.pending() + 1
                );
                break;
            }
            rounds += 1;

            let batch = match step {
                ExpansionStep::MoreChildren(ids) => {
                    let things = self.more_children(&submission.id, &ids).await?;
                    flatten_things(&submission.id, things)?
                }
                ExpansionStep::ContinueThread(parent) => {
                    self.comment_page(&submission.id, Some(&parent)).await?
                }
            };
            expansion.absorb(batch);
        }

        debug!(
            "Expanded {} comments for {} in {} rounds",
            expansion.comments.len(),
            submission.id,
            rounds
        );
        Ok(expansion.comments)
    }
}

/// Unwraps an `api_type=json` envelope, turning reported errors into a failure.
fn api_json_data(value: Value, what: &str) -> Result<Option<Value>, PlatformError> {
    let envelope: ApiEnvelope = serde_json::from_value(value)
        .map_err(|e| PlatformError::Malformed(format!("{what}: {e}")))?;
    if !envelope.json.errors.is_empty() {
        return Err(PlatformError::Api {
            status: 200,
            message: format!("{what} errors: {:?}", envelope.json.errors),
        });
    }
    Ok(envelope.json.data)
}

fn parse_submit_response(value: Value) -> Result<PostedSubmission, PlatformError> {
    let data = api_json_data(value, "submit")?
        .ok_or_else(|| PlatformError::Malformed("submit response had no data".to_string()))?;
    let data: SubmitData = serde_json::from_value(data)
        .map_err(|e| PlatformError::Malformed(format!("submit: {e}")))?;
    Ok(PostedSubmission {
        fullname: data.name,
        url: data.url,
    })
}

fn parse_search_listing(value: Value) -> Result<Vec<Submission>, PlatformError> {
    let listing: Listing = serde_json::from_value(value)
        .map_err(|e| PlatformError::Malformed(format!("search listing: {e}")))?;

    listing
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == "t3")
        .map(|thing| {
            let raw: RawSubmission = serde_json::from_value(thing.data)
                .map_err(|e| PlatformError::Malformed(format!("submission: {e}")))?;
            Ok(Submission {
                id: raw.id,
                community: raw.subreddit,
                title: raw.title,
                url: raw.url,
                body: raw.selftext,
                score: raw.score,
            })
        })
        .collect()
}

/// Parses the `[post_listing, comment_listing]` page returned by `/comments/{id}`.
/// Returns comments breadth-first plus whatever is hidden behind placeholders.
fn flatten_comment_page(submission_id: &str, value: Value) -> Result<CommentBatch, PlatformError> {
    let Value::Array(mut parts) = value else {
        return Err(PlatformError::Malformed("comment page is not an array".to_string()));
    };
    if parts.len() < 2 {
        return Err(PlatformError::Malformed("comment page has no comment listing".to_string()));
    }
    let listing: Listing = serde_json::from_value(parts.swap_remove(1))
        .map_err(|e| PlatformError::Malformed(format!("comment listing: {e}")))?;

    flatten_things(submission_id, listing.data.children)
}

fn flatten_things(submission_id: &str, roots: Vec<Thing>) -> Result<CommentBatch, PlatformError> {
    let mut batch = CommentBatch::default();
    let mut queue: VecDeque<Thing> = roots.into();

    while let Some(thing) = queue.pop_front() {
        match thing.kind.as_str() {
            "t1" => {
                let raw: RawComment = serde_json::from_value(thing.data)
                    .map_err(|e| PlatformError::Malformed(format!("comment: {e}")))?;
                if raw.replies.is_object() {
                    let replies: Listing = serde_json::from_value(raw.replies)
                        .map_err(|e| PlatformError::Malformed(format!("replies: {e}")))?;
                    queue.extend(replies.data.children);
                }
                batch.comments.push(Comment {
                    id: raw.id,
                    submission_id: submission_id.to_string(),
                    body: raw.body,
                    score: raw.score,
                });
            }
            "more" => {
                let raw: RawMore = serde_json::from_value(thing.data)
                    .map_err(|e| PlatformError::Malformed(format!("more: {e}")))?;
                if !raw.children.is_empty() {
                    batch.more_ids.extend(raw.children);
                } else if let Some(parent) = raw.parent_id.strip_prefix("t1_") {
                    batch.continue_under.push(parent.to_string());
                }
            }
            other => debug!("Ignoring thing of kind {other} in comment tree"),
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: &str, body: &str, score: i64, replies: Value) -> Value {
        json!({
            "kind": "t1",
            "data": { "id": id, "body": body, "score": score, "replies": replies }
        })
    }

    fn listing(children: Vec<Value>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children } })
    }

    #[test]
    fn test_search_listing_maps_submission_fields() {
        let value = listing(vec![
            json!({ "kind": "t3", "data": {
                "id": "abc", "subreddit": "rust", "title": "Borrowck tips",
                "url": "https://reddit.com/r/rust/abc", "selftext": "body", "score": 42
            }}),
            json!({ "kind": "t5", "data": { "id": "ignored" } }),
        ]);

        let submissions = parse_search_listing(value).unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].id, "abc");
        assert_eq!(submissions[0].community, "rust");
        assert_eq!(submissions[0].body, "body");
        assert_eq!(submissions[0].score, 42);
    }

    #[test]
    fn test_link_post_without_selftext_has_empty_body() {
        let value = listing(vec![json!({ "kind": "t3", "data": {
            "id": "x", "title": "Link", "url": "https://example.com", "score": 1
        }})]);
        let submissions = parse_search_listing(value).unwrap();
        assert_eq!(submissions[0].body, "");
    }

    #[test]
    fn test_comment_page_flattens_breadth_first_and_collects_more_ids() {
        let nested = listing(vec![comment("c3", "grandchild", 1, json!(""))]);
        let page = json!([
            listing(vec![]),
            listing(vec![
                comment("c1", "first", 10, listing(vec![comment("c2", "child", 5, nested)])),
                comment("c4", "second", 7, json!("")),
                json!({ "kind": "more", "data": { "children": ["m1", "m2"] } }),
            ]),
        ]);

        let batch = flatten_comment_page("s1", page).unwrap();
        let ids: Vec<&str> = batch.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c4", "c2", "c3"]);
        assert!(batch.comments.iter().all(|c| c.submission_id == "s1"));
        assert_eq!(batch.more_ids, vec!["m1".to_string(), "m2".to_string()]);
        assert!(batch.continue_under.is_empty());
    }

    fn continue_this_thread(parent: &str) -> Value {
        json!({ "kind": "more", "data": {
            "id": "_", "parent_id": format!("t1_{parent}"), "count": 0, "children": []
        }})
    }

    #[test]
    fn test_continue_this_thread_schedules_the_parent_subtree() {
        let page = json!([
            listing(vec![]),
            listing(vec![comment("c1", "top", 3, listing(vec![continue_this_thread("c1")]))]),
        ]);

        let batch = flatten_comment_page("s1", page).unwrap();
        assert_eq!(batch.comments.len(), 1);
        assert!(batch.more_ids.is_empty());
        assert_eq!(batch.continue_under, vec!["c1".to_string()]);

        let mut expansion = Expansion::default();
        expansion.absorb(batch);
        assert_eq!(
            expansion.next_step(),
            Some(ExpansionStep::ContinueThread("c1".to_string()))
        );

        // The focused page repeats the parent above its hidden replies.
        let subtree = json!([
            listing(vec![]),
            listing(vec![comment(
                "c1",
                "top",
                3,
                listing(vec![comment("d1", "deep reply", 2, json!(""))]),
            )]),
        ]);
        expansion.absorb(flatten_comment_page("s1", subtree).unwrap());

        let ids: Vec<&str> = expansion.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "d1"]);
        assert_eq!(expansion.next_step(), None);
    }

    #[test]
    fn test_top_level_empty_placeholder_is_ignored() {
        let page = json!([
            listing(vec![]),
            listing(vec![json!({ "kind": "more", "data": {
                "id": "_", "parent_id": "t3_s1", "count": 0, "children": []
            }})]),
        ]);
        let batch = flatten_comment_page("s1", page).unwrap();
        assert!(batch.more_ids.is_empty());
        assert!(batch.continue_under.is_empty());
    }

    #[test]
    fn test_expansion_batches_ids_and_never_repeats_a_request() {
        let mut expansion = Expansion::default();
        let ids: Vec<String> = (0..150).map(|i| format!("m{i}")).collect();
        expansion.absorb(CommentBatch {
            more_ids: ids.clone(),
            continue_under: vec!["c9".to_string()],
            ..CommentBatch::default()
        });

        let Some(ExpansionStep::MoreChildren(first)) = expansion.next_step() else {
            panic!("expected a morechildren batch");
        };
        assert_eq!(first.len(), MORE_CHILDREN_BATCH);

        // Ids already requested are not queued again.
        expansion.absorb(CommentBatch {
            more_ids: vec!["m0".to_string(), "m149".to_string()],
            ..CommentBatch::default()
        });

        let Some(ExpansionStep::MoreChildren(second)) = expansion.next_step() else {
            panic!("expected the remaining ids");
        };
        assert_eq!(second.len(), 50);
        assert_eq!(second.last().map(String::as_str), Some("m149"));
        assert_eq!(
            expansion.next_step(),
            Some(ExpansionStep::ContinueThread("c9".to_string()))
        );
        assert_eq!(expansion.next_step(), None);
    }

    #[test]
    fn test_submit_response_yields_fullname_and_url() {
        let value = json!({ "json": { "errors": [], "data": {
            "id": "abc",
            "name": "t3_abc",
            "url": "https://www.reddit.com/r/test/comments/abc/title/"
        }}});
        let posted = parse_submit_response(value).unwrap();
        assert_eq!(posted.fullname, "t3_abc");
        assert_eq!(posted.url, "https://www.reddit.com/r/test/comments/abc/title/");
    }

    #[test]
    fn test_submit_errors_are_reported() {
        let value = json!({ "json": { "errors": [
            ["SUBREDDIT_NOEXIST", "that community doesn't exist", "sr"]
        ]}});
        let err = parse_submit_response(value).unwrap_err();
        assert!(matches!(
            err,
            PlatformError::Api { ref message, .. } if message.contains("SUBREDDIT_NOEXIST")
        ));
    }

    #[test]
    fn test_comment_page_must_be_array() {
        let result = flatten_comment_page("s1", json!({ "kind": "Listing" }));
        assert!(matches!(result, Err(PlatformError::Malformed(_))));
    }
}
