// Story author.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::opt_str;
use crate::error::{Result, WattpadError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Handle, as used in profile URLs.
    pub username: String,
    pub avatar: Option<String>,
}

impl User {
    /// Build a user from an API object.
    ///
    /// The API uses two shapes. When `fullname` is present it holds the
    /// display name and `name` holds the handle; otherwise `name` is the
    /// display name and `username` the handle.
    pub fn from_json(obj: &Value) -> Result<Self> {
        if !obj.is_object() {
            return Err(WattpadError::parse("user", format!("expected an object, got {obj}")));
        }

        let avatar = opt_str(obj, "avatar");

        let (name, username) = match opt_str(obj, "fullname") {
            Some(fullname) => {
                let handle = opt_str(obj, "name").ok_or_else(|| {
                    WattpadError::parse(
                        "user",
                        "User JSON has 'fullname' but is missing the 'name' field required for username mapping.",
                    )
                })?;
                (fullname, handle)
            }
            None => {
                let name = opt_str(obj, "name").ok_or_else(|| {
                    WattpadError::parse(
                        "user",
                        "User JSON is missing required 'name' field (when 'fullname' is absent).",
                    )
                })?;
                let username = opt_str(obj, "username").ok_or_else(|| {
                    WattpadError::parse(
                        "user",
                        "User JSON is missing required 'username' field (when 'fullname' is absent).",
                    )
                })?;
                (name, username)
            }
        };

        Ok(User {
            name,
            username,
            avatar,
        })
    }
}
