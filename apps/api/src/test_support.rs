//! Scripted fakes for the capabilities behind `AppState`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{Config, PublishConfig, RedditCredentials, ResearchConfig};
use crate::llm_client::{ChatTurn, ImageAttachment, LlmError, TextCompletion, VisionCompletion};
use crate::platform::{Comment, MoreComments, Platform, PlatformError, Submission};
use crate::posting::images::ImageFetcher;
use crate::posting::publisher::{
    OutgoingPost, PostedSubmission, PublishTarget, Publisher, SubmissionApi,
};
use crate::posting::scraper::{PageScraper, ScrapeError};
use crate::state::AppState;

pub fn submission(id: &str, title: &str, body: &str, score: i64) -> Submission {
    Submission {
        id: id.to_string(),
        community: "test".to_string(),
        title: title.to_string(),
        url: format!("https://example.com/{id}"),
        body: body.to_string(),
        score,
    }
}

pub fn comment(id: &str, submission_id: &str, body: &str, score: i64) -> Comment {
    Comment {
        id: id.to_string(),
        submission_id: submission_id.to_string(),
        body: body.to_string(),
        score,
    }
}

/// Replies from a fixed queue; fails once the queue is empty or when built with `failing`.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    always_fail: bool,
    prompts: Mutex<Vec<String>>,
    conversations: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            always_fail: false,
            prompts: Mutex::new(Vec::new()),
            conversations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Prompts received through `complete`.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Turn histories received through `converse`.
    pub fn conversations(&self) -> Vec<Vec<ChatTurn>> {
        self.conversations.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len() + self.conversations.lock().unwrap().len()
    }

    fn next_reply(&self) -> Result<String, LlmError> {
        if self.always_fail {
            return Err(LlmError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.next_reply()
    }

    async fn converse(&self, turns: &[ChatTurn]) -> Result<String, LlmError> {
        self.conversations.lock().unwrap().push(turns.to_vec());
        self.next_reply()
    }
}

/// In-memory platform with per-community and per-submission failure injection.
#[derive(Default)]
pub struct FakePlatform {
    search_results: HashMap<String, Vec<Submission>>,
    failing_communities: HashSet<String>,
    first_page: HashMap<String, Vec<Comment>>,
    expanded: HashMap<String, Vec<Comment>>,
    failing_threads: HashSet<String>,
    searches: Mutex<Vec<(String, usize)>>,
    comment_fetches: Mutex<Vec<(String, MoreComments)>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_community(mut self, community: &str, submissions: Vec<Submission>) -> Self {
        self.search_results.insert(community.to_string(), submissions);
        self
    }

    pub fn with_failing_community(mut self, community: &str) -> Self {
        self.failing_communities.insert(community.to_string());
        self
    }

    pub fn with_comments(mut self, submission_id: &str, comments: Vec<Comment>) -> Self {
        self.first_page.insert(submission_id.to_string(), comments);
        self
    }

    /// Comments only returned when placeholders are expanded.
    pub fn with_hidden_comments(mut self, submission_id: &str, comments: Vec<Comment>) -> Self {
        self.expanded.insert(submission_id.to_string(), comments);
        self
    }

    pub fn with_failing_thread(mut self, submission_id: &str) -> Self {
        self.failing_threads.insert(submission_id.to_string());
        self
    }

    pub fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn comment_fetches(&self) -> Vec<(String, MoreComments)> {
        self.comment_fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn search(
        &self,
        community: &str,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<Submission>, PlatformError> {
        self.searches
            .lock()
            .unwrap()
            .push((community.to_string(), limit));
        if self.failing_communities.contains(community) {
            return Err(PlatformError::Api {
                status: 403,
                message: format!("r/{community} is private"),
            });
        }
        Ok(self
            .search_results
            .get(community)
            .map(|subs| subs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_comments(
        &self,
        submission: &Submission,
        more: MoreComments,
    ) -> Result<Vec<Comment>, PlatformError> {
        self.comment_fetches
            .lock()
            .unwrap()
            .push((submission.id.clone(), more));
        if self.failing_threads.contains(&submission.id) {
            return Err(PlatformError::Network("connection reset".to_string()));
        }
        let mut comments = self
            .first_page
            .get(&submission.id)
            .cloned()
            .unwrap_or_default();
        if more == MoreComments::Expand {
            comments.extend(self.expanded.get(&submission.id).cloned().unwrap_or_default());
        }
        Ok(comments)
    }
}

/// Returns a fixed markdown page, or fails.
pub struct StaticScraper {
    page: Option<String>,
}

impl StaticScraper {
    pub fn new(page: &str) -> Self {
        Self {
            page: Some(page.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { page: None }
    }
}

#[async_trait]
impl PageScraper for StaticScraper {
    async fn scrape(&self, _url: &str) -> Result<String, ScrapeError> {
        self.page.clone().ok_or(ScrapeError::Api {
            status: 500,
            message: "scripted failure".to_string(),
        })
    }
}

/// Vision replies from a fixed queue; records each prompt and how many images came with it.
pub struct ScriptedVision {
    replies: Mutex<VecDeque<String>>,
    always_fail: bool,
    requests: Mutex<Vec<(String, usize)>>,
}

impl ScriptedVision {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            always_fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn image_counts(&self) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, count)| *count)
            .collect()
    }
}

#[async_trait]
impl VisionCompletion for ScriptedVision {
    async fn complete_with_images(
        &self,
        prompt: &str,
        images: &[ImageAttachment],
    ) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), images.len()));
        if self.always_fail {
            return Err(LlmError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

/// Serves a tiny PNG for every URL except those marked as failing.
#[derive(Default)]
pub struct StaticImages {
    failing: HashSet<String>,
}

impl StaticImages {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

#[async_trait]
impl ImageFetcher for StaticImages {
    async fn fetch(&self, url: &str) -> Result<ImageAttachment, ScrapeError> {
        if self.failing.contains(url) {
            return Err(ScrapeError::Api {
                status: 404,
                message: format!("{url} not found"),
            });
        }
        Ok(ImageAttachment {
            media_type: "image/png".to_string(),
            data: b"\x89PNG".to_vec(),
        })
    }
}

/// Records what it was asked to publish; optionally fails every attempt.
pub struct FakePublisher {
    target: PublishTarget,
    fail: bool,
    published: Mutex<Vec<OutgoingPost>>,
}

impl FakePublisher {
    pub fn new(target: PublishTarget) -> Self {
        Self {
            target,
            fail: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(target: PublishTarget) -> Self {
        Self {
            fail: true,
            ..Self::new(target)
        }
    }

    pub fn published(&self) -> Vec<OutgoingPost> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    fn target(&self) -> PublishTarget {
        self.target
    }

    async fn publish(&self, post: &OutgoingPost) -> Result<String, PlatformError> {
        if self.fail {
            return Err(PlatformError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        self.published.lock().unwrap().push(post.clone());
        Ok(match self.target {
            PublishTarget::Reddit => "https://reddit.test/post".to_string(),
            PublishTarget::Twitter => "https://twitter.test/post".to_string(),
        })
    }
}

/// Records submission calls as `kind:community:title:content` strings.
#[derive(Default)]
pub struct FakeSubmissionApi {
    fail_links: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeSubmissionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_links(mut self) -> Self {
        self.fail_links = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionApi for FakeSubmissionApi {
    async fn submit_text(
        &self,
        community: &str,
        title: &str,
        body: &str,
    ) -> Result<PostedSubmission, PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("text:{community}:{title}:{body}"));
        Ok(PostedSubmission {
            fullname: "t3_text".to_string(),
            url: format!("https://reddit.com/r/{community}/text"),
        })
    }

    async fn submit_link(
        &self,
        community: &str,
        title: &str,
        url: &str,
    ) -> Result<PostedSubmission, PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("link:{community}:{title}:{url}"));
        if self.fail_links {
            return Err(PlatformError::Api {
                status: 200,
                message: "link submissions are disabled".to_string(),
            });
        }
        Ok(PostedSubmission {
            fullname: "t3_link".to_string(),
            url: format!("https://reddit.com/r/{community}/link"),
        })
    }

    async fn reply(&self, parent_fullname: &str, body: &str) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("reply:{parent_fullname}:{body}"));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "test-key".to_string(),
        reddit: RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            user_agent: "test-agent".to_string(),
        },
        firecrawl_api_key: "fc-key".to_string(),
        research: ResearchConfig::default(),
        publish: PublishConfig {
            reddit_community: "test".to_string(),
            twitter_access_token: None,
        },
        port: 8080,
        rust_log: "info".to_string(),
    }
}

pub fn test_state(llm: ScriptedCompletion, platform: FakePlatform) -> AppState {
    test_state_with(llm, platform, StaticScraper::failing())
}

pub fn test_state_with(
    llm: ScriptedCompletion,
    platform: FakePlatform,
    scraper: StaticScraper,
) -> AppState {
    AppState {
        llm: Arc::new(llm),
        vision: Arc::new(ScriptedVision::failing()),
        platform: Arc::new(platform),
        scraper: Arc::new(scraper),
        images: Arc::new(StaticImages::all()),
        publishers: Vec::new(),
        config: test_config(),
    }
}
