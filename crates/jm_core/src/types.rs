use serde::{Deserialize, Serialize};

/// Values used when a field cannot be extracted from the page.
pub mod defaults {
    pub const ARTICLE_AUTHOR: &str = "unknown author";
    pub const USER: &str = "unknown user";
    pub const TIME: &str = "unknown time";
    pub const READ_TIME: &str = "unknown";
    pub const COLUMN: &str = "none";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    pub url: Option<String>,
}

impl Default for AuthorInfo {
    fn default() -> Self {
        Self {
            name: defaults::ARTICLE_AUTHOR.to_string(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStats {
    pub likes: u64,
    pub comments: u64,
    pub collects: u64,
}

/// Page-level metadata that is extracted independently of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub publish_time: String,
    pub read_time: String,
    pub column: String,
}

impl Default for ArticleMetadata {
    fn default() -> Self {
        Self {
            publish_time: defaults::TIME.to_string(),
            read_time: defaults::READ_TIME.to_string(),
            column: defaults::COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub author: AuthorInfo,
    /// Body already converted to Markdown.
    pub content: String,
    pub stats: ArticleStats,
    #[serde(flatten)]
    pub metadata: ArticleMetadata,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub author: String,
    pub content: String,
    pub time: String,
    pub likes: u64,
    /// Count as displayed by the site, not `replies.len()`.
    pub reply_count: u64,
    pub replies: Vec<ReplyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub author: String,
    pub content: String,
    pub time: String,
    pub likes: u64,
}
