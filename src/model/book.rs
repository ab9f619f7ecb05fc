use serde::{Deserialize, Serialize};
use slice_framework::Params;

/// A book on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
}

/// Parameters for adding a book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookCreate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl BookCreate {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }

    /// Reads `title` and `author` from request params. Missing or non-string
    /// values become empty strings and fail [`validate`](Self::validate).
    pub fn from_params(params: &Params) -> Self {
        let field = |name: &str| {
            params
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            title: field("title"),
            author: field("author"),
        }
    }

    /// Names of the blank fields.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();
        if self.title.is_empty() {
            errors.push("title");
        }
        if self.author.is_empty() {
            errors.push("author");
        }
        errors
    }
}
