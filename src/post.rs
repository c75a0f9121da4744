// src/post.rs
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::resolve::{Content, PostRequest};
use crate::slack::{FileUpload, MsgOption, SlackApi};

/// Longest text Slack renders in a single section block.
/// https://api.slack.com/reference/block-kit/blocks#section_fields
pub const MESSAGE_TEXT_LIMIT: usize = 3000;

/// Outcome of a publish attempt. `timestamp` is empty when the operation
/// does not yield one (file uploads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResult {
    pub channel: String,
    pub timestamp: String,
}

/// Pick one of the request shapes (message, blocks, upload) and forward it
/// to the client. Text over the single-message limit is uploaded as a
/// snippet regardless of the snippet flag.
pub fn dispatch<C: SlackApi>(req: &PostRequest, client: &C) -> Result<PostResult> {
    match &req.content {
        Content::Text(text) => {
            let oversized = text.len() > MESSAGE_TEXT_LIMIT;
            if oversized {
                eprintln!(
                    "[INFO] text length exceeds {MESSAGE_TEXT_LIMIT} characters, uploading as a snippet."
                );
            }
            if oversized || req.snippet {
                upload_snippet(req, text, client)
            } else {
                post_text(req, text, client)
            }
        }
        Content::Blocks(blocks) => post_blocks(req, blocks, client),
        Content::File(path) => upload_path(req, path, client),
    }
}

/// Decoration options in their fixed order: thread placement, icon (emoji
/// wins over URL), username. The payload option is appended by the caller.
fn decoration_options(req: &PostRequest) -> Vec<MsgOption> {
    let mut opts = Vec::new();

    if let Some(ts) = &req.thread_ts {
        opts.push(MsgOption::ThreadTs(ts.clone()));
    }

    match (&req.icon_emoji, &req.icon_url) {
        (Some(emoji), _) => opts.push(MsgOption::IconEmoji(emoji.clone())),
        (None, Some(url)) => opts.push(MsgOption::IconUrl(url.clone())),
        (None, None) => {}
    }

    if let Some(name) = &req.username {
        opts.push(MsgOption::Username(name.clone()));
    }
    opts
}

fn post_text<C: SlackApi>(req: &PostRequest, text: &str, client: &C) -> Result<PostResult> {
    let mut opts = decoration_options(req);
    opts.push(MsgOption::Text(text.to_string()));

    let (channel, timestamp) = client
        .post_message(&req.channel, &opts)
        .context("failed to post message")?;
    Ok(PostResult { channel, timestamp })
}

fn post_blocks<C: SlackApi>(
    req: &PostRequest,
    blocks: &serde_json::Value,
    client: &C,
) -> Result<PostResult> {
    let mut opts = decoration_options(req);
    opts.push(MsgOption::Blocks(blocks.clone()));

    let (channel, timestamp) = client
        .post_message(&req.channel, &opts)
        .context("failed to post blocks")?;
    Ok(PostResult { channel, timestamp })
}

fn upload_snippet<C: SlackApi>(req: &PostRequest, text: &str, client: &C) -> Result<PostResult> {
    let upload = FileUpload {
        filename: snippet_filename(),
        content: text.as_bytes().to_vec(),
        channel: req.channel.clone(),
        thread_ts: req.thread_ts.clone(),
    };
    client
        .upload_file(upload)
        .context("failed to upload snippet")?;

    // The upload API does not return a message timestamp.
    Ok(PostResult {
        channel: req.channel.clone(),
        timestamp: String::new(),
    })
}

fn upload_path<C: SlackApi>(req: &PostRequest, path: &Path, client: &C) -> Result<PostResult> {
    let content =
        std::fs::read(path).with_context(|| format!("failed to read file {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(snippet_filename);

    let upload = FileUpload {
        filename,
        content,
        channel: req.channel.clone(),
        thread_ts: req.thread_ts.clone(),
    };
    client
        .upload_file(upload)
        .with_context(|| format!("failed to upload file {}", path.display()))?;

    Ok(PostResult {
        channel: req.channel.clone(),
        timestamp: String::new(),
    })
}

/// Synthesized name for snippet uploads, from the post time.
fn snippet_filename() -> String {
    format!("{}.txt", Local::now().format("%Y%m%d_%H%M%S"))
}
