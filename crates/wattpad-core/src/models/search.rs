// Search and browse results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de_id;
use crate::error::{Result, WattpadError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorySearchResults {
    pub stories: Vec<StorySummary>,
    pub total: u64,
    /// Related tag suggestions, passed through as sent.
    pub tags: Vec<Value>,
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorySummary {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub vote_count: u64,
    pub read_count: u64,
    pub comment_count: u64,
    pub mature: bool,
    pub completed: bool,
    pub cover: Option<String>,
    pub url: Option<String>,
    pub num_parts: u32,
    pub is_paywalled: bool,
    pub user: Option<AuthorName>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorName {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSearchResults {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub name: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub num_lists: u64,
    pub num_followers: u64,
    pub num_stories_published: u64,
    pub following: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub name: String,
    #[serde(rename = "categoryID")]
    pub category_id: Option<u64>,
    #[serde(rename = "browseURL")]
    pub browse_url: Option<String>,
    #[serde(rename = "tagURL")]
    pub tag_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TopicsEnvelope {
    topics: Vec<Topic>,
}

impl StorySearchResults {
    pub fn from_json(obj: &Value) -> Result<Self> {
        decode(obj, "story search results")
    }
}

impl UserSearchResults {
    /// Accepts `{ "users": [...] }` or a bare array of users.
    pub fn from_json(obj: &Value) -> Result<Self> {
        if obj.is_array() {
            let users = decode(obj, "user search results")?;
            return Ok(UserSearchResults { users });
        }
        decode(obj, "user search results")
    }
}

impl Topic {
    pub fn list_from_json(obj: &Value) -> Result<Vec<Topic>> {
        let envelope: TopicsEnvelope = decode(obj, "topics")?;
        Ok(envelope.topics)
    }
}

fn decode<T: serde::de::DeserializeOwned>(obj: &Value, what: &'static str) -> Result<T> {
    T::deserialize(obj).map_err(|e| WattpadError::parse(what, e.to_string()))
}
