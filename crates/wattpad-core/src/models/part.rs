// Story parts (chapters) and the latest-published-part summary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt_id, opt_str, opt_timestamp, req_id};
use crate::error::Result;

/// One chapter of a story. Its text is fetched separately through
/// `text_url`; see `WattpadClient::render_part`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: u64,
    pub title: String,
    /// Usually a relative path such as `/apiv2/?m=storytext&id=...`.
    pub text_url: Option<String>,
}

impl Part {
    /// Parse `{ "id", "title", "text_url": { "text" } }`.
    pub fn from_json(obj: &Value) -> Result<Self> {
        let id = req_id(obj, "id", "part")?;
        let title = opt_str(obj, "title").unwrap_or_default();
        let text_url = obj
            .get("text_url")
            .and_then(|t| opt_str(t, "text"))
            .filter(|s| !s.is_empty());

        Ok(Part {
            id,
            title,
            text_url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPart {
    pub id: u64,
    pub title: Option<String>,
    pub create_date: Option<NaiveDateTime>,
}

impl PublishedPart {
    pub fn from_json(obj: &Value) -> Result<Self> {
        Ok(PublishedPart {
            id: opt_id(obj, "id").unwrap_or(0),
            title: opt_str(obj, "title"),
            create_date: opt_timestamp(obj, "createDate")?,
        })
    }
}
