//! Report sections

use serde::Serialize;
use serde_json::Value;

use crate::error::TransposeError;
use crate::types::string_fields;

/// Returns the normalised key for a section title: spaces removed and lower-cased.
pub fn get_key(title: &str) -> String {
    title.replace(' ', "").to_lowercase()
}

/// A named grouping of charts within a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Section {
    pub key: String,
    pub title: String,
}

impl Section {
    /// Return a new Section object.
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Section {
            key: key.into(),
            title: title.into(),
        }
    }

    /// Return a Section whose key is derived from its title.
    pub fn from_title(title: &str) -> Self {
        Self::new(get_key(title), title)
    }
}

impl TryFrom<&Value> for Section {
    type Error = TransposeError;

    /// Accepts an object with exactly the keys `key` and `title`, both with string values.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match string_fields(value, &["key", "title"]).as_deref() {
            Some(&[key, title]) => Ok(Self::new(key, title)),
            _ => Err(TransposeError::Construction {
                field: "section",
                reason: r#"only objects of format {"key": <string>, "title": <string>} are accepted"#,
            }),
        }
    }
}
