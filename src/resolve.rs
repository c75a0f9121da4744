// src/resolve.rs
use std::path::PathBuf;

use crate::profile::Profile;

/// The content to publish. Exactly one variant per invocation; the variant
/// is the posting mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Blocks(serde_json::Value),
    File(PathBuf),
}

/// Fully resolved intent to publish, built once per invocation.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub token: String,
    pub channel: String,
    pub content: Content,
    /// Post text as a snippet even when it fits in a single message.
    pub snippet: bool,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
    pub icon_url: Option<String>,
    pub thread_ts: Option<String>,
}

/// Flag and environment values feeding resolution. Empty strings count as
/// unset.
#[derive(Debug, Default)]
pub struct Sources {
    pub token: Option<String>,
    pub env_token: Option<String>,
    pub channel: Option<String>,
    pub env_channel: Option<String>,
    pub text: Option<String>,
    pub textfile: Option<String>,
    pub blocks: Option<String>,
    pub file: Option<String>,
    pub snippet: bool,
    pub thread_ts: Option<String>,
    pub icon: Option<String>,
    pub icon_url: Option<String>,
    pub username: Option<String>,
}

/// First candidate that is set and non-empty.
pub fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .find(|s| !s.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Rewrite the literal two-character sequence `\n` to a real newline.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Merge flags, environment, and profile into a `PostRequest`.
///
/// Precedence per field is strictly first-non-empty: flag > environment >
/// profile. Every missing required field appends its own error line; all
/// lines are reported together rather than stopping at the first.
pub fn resolve(src: Sources, profile: &Profile) -> Result<PostRequest, Vec<String>> {
    let mut errors = Vec::new();

    let token = first_non_empty(&[
        src.token.as_deref(),
        src.env_token.as_deref(),
        Some(&profile.token),
    ])
    .unwrap_or_default()
    .to_string();
    if token.is_empty() {
        errors.push("error: slack token is required".to_string());
    }

    let channel = first_non_empty(&[
        src.channel.as_deref(),
        src.env_channel.as_deref(),
        Some(&profile.channel),
    ])
    .unwrap_or_default()
    .to_string();
    if channel.is_empty() {
        errors.push("error: channel is required".to_string());
    }

    // Posting mode, first match wins: text > blocks > textfile > file.
    let mut content = None;
    if let Some(text) = non_empty(src.text) {
        content = Some(Content::Text(unescape_newlines(&text)));
    } else if let Some(raw) = non_empty(src.blocks) {
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(blocks) => content = Some(Content::Blocks(blocks)),
            Err(e) => errors.push(format!("error: failed to parse blocks json: {e}")),
        }
    } else if let Some(path) = non_empty(src.textfile) {
        match std::fs::read_to_string(&path) {
            Ok(text) => content = Some(Content::Text(text)),
            Err(e) => errors.push(format!("error: failed to read text file {path}: {e}")),
        }
    } else if let Some(path) = non_empty(src.file) {
        content = Some(Content::File(PathBuf::from(path)));
    } else {
        errors.push("error: --text option is required".to_string());
    }

    match content {
        Some(content) if errors.is_empty() => Ok(PostRequest {
            token,
            channel,
            content,
            snippet: src.snippet,
            username: non_empty(src.username),
            icon_emoji: non_empty(src.icon),
            icon_url: non_empty(src.icon_url),
            thread_ts: non_empty(src.thread_ts),
        }),
        _ => Err(errors),
    }
}
