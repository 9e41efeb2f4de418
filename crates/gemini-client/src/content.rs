//! Parsing model text into a blog post

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Generated recipe blog post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub content: String,
    pub excerpt: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

/// Extract the JSON object from model text and read a `BlogPost` out of it.
///
/// The model often wraps the object in prose or a code fence, so everything
/// from the first `{` to the last `}` is taken. Missing or mistyped fields
/// become empty rather than failing the whole post.
pub fn parse_blog_post(text: &str) -> Result<BlogPost> {
    let start = text
        .find('{')
        .ok_or_else(|| Error::Parse("no JSON object in generated text".into()))?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| Error::Parse("unterminated JSON object in generated text".into()))?;

    let value: Value = serde_json::from_str(&text[start..=end])
        .map_err(|e| Error::Parse(format!("invalid JSON in generated text: {e}")))?;

    Ok(BlogPost {
        content: string_field(&value, "content"),
        excerpt: string_field(&value, "excerpt"),
        ingredients: list_field(&value, "ingredients"),
        instructions: list_field(&value, "instructions"),
    })
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
