//! Input normalization and prompt assembly.
//!
//! Every free-text field is passed through [`sanitize`] before it reaches the
//! generation backend or storage. Stripping `<`, `>`, `{` and `}` is the only
//! defense against markup and template injection into the prompt.

/// Upper bound on any single free-text field, in characters
pub const MAX_INPUT_CHARS: usize = 2000;

pub const SYSTEM_PROMPT: &str = "You are an expert freelance consultant who writes clear, \
client-winning proposals based on job descriptions and freelancer profiles. Keep tone \
consistent and professional with the user's selected tone.";

const STRIPPED_CHARS: [char; 4] = ['<', '>', '{', '}'];

/// Strip injection characters and truncate to [`MAX_INPUT_CHARS`]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_INPUT_CHARS)
}

/// Truncation counts characters, not bytes, and happens after stripping.
pub fn sanitize_with_limit(input: &str, max_chars: usize) -> String {
    input
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .take(max_chars)
        .collect()
}

/// Profiles are opaque JSON. They are flattened to a string and then
/// sanitized like any other field, so braces from the encoding are removed too.
pub fn sanitize_profile(profile: &serde_json::Value) -> String {
    match profile {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => sanitize(text),
        other => sanitize(&other.to_string()),
    }
}

pub fn build_user_prompt(job_text: &str, profile: &str, tone: &str) -> String {
    format!(
        "Job Description:\n{}\n\nFreelancer Profile:\n{}\n\nTone: {}",
        job_text, profile, tone
    )
}
