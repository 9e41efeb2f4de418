//! Prompt construction for recipe content

use crate::client::{GenerateRequest, GenerationConfig};
use crate::constants::PINTEREST_DESCRIPTION_MAX_CHARS;

/// Request for a full recipe blog post, answered as a JSON object with
/// `content`, `excerpt`, `ingredients` and `instructions`.
pub fn blog_post(title: &str) -> GenerateRequest {
    let prompt = format!(
        r#"You are a professional recipe blogger. Create a detailed blog post for a recipe titled: "{title}"

Please provide the response in this exact JSON format:
{{
  "content": "Full blog post content with introduction and story",
  "excerpt": "Brief 2-3 sentence excerpt",
  "ingredients": ["ingredient 1", "ingredient 2", ...],
  "instructions": ["step 1", "step 2", ...]
}}

Make it engaging, SEO-friendly, and include cooking tips."#
    );

    GenerateRequest {
        prompt,
        config: GenerationConfig {
            temperature: 0.7,
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: 2048,
        },
    }
}

/// Request for a plain-text Pinterest pin description with hashtags.
pub fn pinterest_description(title: &str, excerpt: &str) -> GenerateRequest {
    let prompt = format!(
        "Create a compelling Pinterest pin description (max {PINTEREST_DESCRIPTION_MAX_CHARS} characters) for this recipe:
Title: {title}
Excerpt: {excerpt}

Make it engaging and include relevant hashtags. Just provide the description, no JSON."
    );

    GenerateRequest {
        prompt,
        config: GenerationConfig {
            temperature: 0.8,
            top_k: None,
            top_p: None,
            max_output_tokens: 500,
        },
    }
}
