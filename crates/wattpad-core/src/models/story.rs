// Story metadata as returned by the v3 story endpoint and the `group` object
// of the v4 part endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{opt_str, req_id, Part, PublishedPart, User};
use crate::error::{Result, WattpadError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub author: User,
    pub description: String,
    pub cover: Option<String>,
    /// Canonical story URL with the trailing numeric id suffix removed.
    pub url: Option<String>,
    pub last_published_part: Option<PublishedPart>,
    pub parts: Vec<Part>,
    pub is_paywalled: bool,
    pub tags: Vec<String>,
}

impl Story {
    /// Parse a story object.
    pub fn from_json(obj: &Value) -> Result<Self> {
        let id = req_id(obj, "id", "story")?;
        let title = opt_str(obj, "title")
            .ok_or_else(|| WattpadError::parse("story", "Story JSON is missing 'title'."))?;

        let author = match obj.get("user") {
            Some(user) if user.is_object() => User::from_json(user)?,
            _ => {
                return Err(WattpadError::parse(
                    "story",
                    "Story JSON is missing a valid 'user' object.",
                ))
            }
        };

        let last_published_part = match obj.get("lastPublishedPart") {
            Some(v) if v.is_object() => Some(PublishedPart::from_json(v)?),
            None | Some(Value::Null) => None,
            Some(_) => {
                warn!(story_id = id, "'lastPublishedPart' is present but not an object");
                None
            }
        };

        let parts = match obj.get("parts").and_then(Value::as_array) {
            Some(items) => items.iter().map(Part::from_json).collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let tags = obj
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Story {
            id,
            title,
            author,
            description: opt_str(obj, "description").unwrap_or_default(),
            cover: opt_str(obj, "cover"),
            url: opt_str(obj, "url").map(|u| sanitize_url(&u)),
            last_published_part,
            parts,
            is_paywalled: obj
                .get("isPaywalled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            tags,
        })
    }

    /// Parse the response of the part endpoint, where the owning story is
    /// nested under `group`.
    pub fn from_part_response(obj: &Value) -> Result<Self> {
        match obj.get("group") {
            Some(group) if group.is_object() => Story::from_json(group),
            _ => Err(WattpadError::parse(
                "part response",
                "Invalid part response JSON: Missing 'group' object",
            )),
        }
    }

    /// First part whose title does not mark it as front matter, falling back
    /// to the first part.
    pub fn first_chapter(&self) -> Option<&Part> {
        const FRONT_MATTER: [&str; 3] = ["author's note", "aesthetics", "prologue"];

        self.parts
            .iter()
            .find(|p| {
                let title = p.title.to_lowercase();
                !FRONT_MATTER.iter().any(|m| title.contains(m))
            })
            .or_else(|| self.parts.first())
    }

    pub fn part(&self, part_id: u64) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == part_id)
    }
}

/// Drop a trailing `-<digits>` segment from the last path component.
fn sanitize_url(url: &str) -> String {
    let Some(dash) = url.rfind('-') else {
        return url.to_string();
    };
    let after_slash = url.rfind('/').map_or(true, |slash| dash > slash);
    let suffix = &url[dash + 1..];
    if dash > 0 && after_slash && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
        url[..dash].to_string()
    } else {
        url.to_string()
    }
}
