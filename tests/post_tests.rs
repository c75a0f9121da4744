// tests/post_tests.rs
// Dispatcher tests against a recording SlackApi substitute; no network.

use std::cell::RefCell;

use anyhow::Result;
use slack_quickpost::post::{dispatch, MESSAGE_TEXT_LIMIT};
use slack_quickpost::resolve::{Content, PostRequest};
use slack_quickpost::slack::{FileInfo, FileUpload, MsgOption, SlackApi};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Message {
        channel: String,
        opts: Vec<MsgOption>,
    },
    Upload(FileUpload),
}

#[derive(Default)]
struct RecordingClient {
    calls: RefCell<Vec<Call>>,
    fail_with: Option<String>,
}

impl RecordingClient {
    fn failing(error: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_with: Some(error.to_string()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl SlackApi for RecordingClient {
    fn post_message(&self, channel: &str, opts: &[MsgOption]) -> Result<(String, String)> {
        self.calls.borrow_mut().push(Call::Message {
            channel: channel.to_string(),
            opts: opts.to_vec(),
        });
        if let Some(error) = &self.fail_with {
            anyhow::bail!("{error}");
        }
        Ok(("C0TEST".to_string(), "1712345678.000100".to_string()))
    }

    fn upload_file(&self, upload: FileUpload) -> Result<FileInfo> {
        let name = upload.filename.clone();
        self.calls.borrow_mut().push(Call::Upload(upload));
        if let Some(error) = &self.fail_with {
            anyhow::bail!("{error}");
        }
        Ok(FileInfo {
            id: "F0TEST".to_string(),
            name,
        })
    }
}

fn request(content: Content) -> PostRequest {
    PostRequest {
        token: "xoxb-test".to_string(),
        channel: "C0TEST".to_string(),
        content,
        snippet: false,
        username: None,
        icon_emoji: None,
        icon_url: None,
        thread_ts: None,
    }
}

fn text_request(text: &str) -> PostRequest {
    request(Content::Text(text.to_string()))
}

// --- Path selection ---

#[test]
fn test_short_text_takes_message_path() {
    let client = RecordingClient::default();
    let result = dispatch(&text_request("hello"), &client).unwrap();

    assert_eq!(result.channel, "C0TEST");
    assert_eq!(result.timestamp, "1712345678.000100");
    match &client.calls()[..] {
        [Call::Message { channel, opts }] => {
            assert_eq!(channel, "C0TEST");
            assert_eq!(opts.last(), Some(&MsgOption::Text("hello".to_string())));
        }
        other => panic!("expected one message call, got {other:?}"),
    }
}

#[test]
fn test_text_at_limit_still_posts_message() {
    let client = RecordingClient::default();
    let text = "a".repeat(MESSAGE_TEXT_LIMIT);
    let result = dispatch(&text_request(&text), &client).unwrap();

    assert!(!result.timestamp.is_empty());
    assert!(matches!(&client.calls()[..], [Call::Message { .. }]));
}

#[test]
fn test_oversized_text_promoted_to_upload() {
    let client = RecordingClient::default();
    let text = "a".repeat(MESSAGE_TEXT_LIMIT + 1);
    let result = dispatch(&text_request(&text), &client).unwrap();

    // Uploads never produce a message timestamp.
    assert_eq!(result.channel, "C0TEST");
    assert_eq!(result.timestamp, "");
    match &client.calls()[..] {
        [Call::Upload(upload)] => {
            assert!(upload.filename.ends_with(".txt"));
            assert_eq!(upload.content, text.as_bytes());
            assert_eq!(upload.channel, "C0TEST");
        }
        other => panic!("expected one upload call, got {other:?}"),
    }
}

#[test]
fn test_snippet_flag_uploads_short_text() {
    let client = RecordingClient::default();
    let mut req = text_request("short");
    req.snippet = true;
    let result = dispatch(&req, &client).unwrap();

    assert_eq!(result.timestamp, "");
    assert!(matches!(&client.calls()[..], [Call::Upload(_)]));
}

// --- Decorations ---

#[test]
fn test_decoration_order_and_icon_precedence() {
    let client = RecordingClient::default();
    let mut req = text_request("hi");
    req.thread_ts = Some("1700000000.000001".to_string());
    req.icon_emoji = Some(":tada:".to_string());
    req.icon_url = Some("https://example.com/icon.png".to_string());
    req.username = Some("quickpost".to_string());
    dispatch(&req, &client).unwrap();

    match &client.calls()[..] {
        [Call::Message { opts, .. }] => assert_eq!(
            opts,
            &vec![
                MsgOption::ThreadTs("1700000000.000001".to_string()),
                // Emoji wins when both icon forms are given.
                MsgOption::IconEmoji(":tada:".to_string()),
                MsgOption::Username("quickpost".to_string()),
                MsgOption::Text("hi".to_string()),
            ]
        ),
        other => panic!("expected one message call, got {other:?}"),
    }
}

#[test]
fn test_icon_url_used_when_no_emoji() {
    let client = RecordingClient::default();
    let mut req = text_request("hi");
    req.icon_url = Some("https://example.com/icon.png".to_string());
    dispatch(&req, &client).unwrap();

    match &client.calls()[..] {
        [Call::Message { opts, .. }] => assert_eq!(
            opts,
            &vec![
                MsgOption::IconUrl("https://example.com/icon.png".to_string()),
                MsgOption::Text("hi".to_string()),
            ]
        ),
        other => panic!("expected one message call, got {other:?}"),
    }
}

#[test]
fn test_upload_carries_thread_ts_only() {
    let client = RecordingClient::default();
    let mut req = text_request("short");
    req.snippet = true;
    req.thread_ts = Some("1700000000.000001".to_string());
    req.icon_emoji = Some(":tada:".to_string());
    req.username = Some("quickpost".to_string());
    dispatch(&req, &client).unwrap();

    match &client.calls()[..] {
        [Call::Upload(upload)] => {
            assert_eq!(upload.thread_ts.as_deref(), Some("1700000000.000001"));
        }
        other => panic!("expected one upload call, got {other:?}"),
    }
}

// --- Blocks ---

#[test]
fn test_blocks_path_posts_payload() {
    let client = RecordingClient::default();
    let blocks = serde_json::json!([{"type": "divider"}]);
    let result = dispatch(&request(Content::Blocks(blocks.clone())), &client).unwrap();

    assert_eq!(result.timestamp, "1712345678.000100");
    match &client.calls()[..] {
        [Call::Message { opts, .. }] => {
            assert_eq!(opts.last(), Some(&MsgOption::Blocks(blocks)));
        }
        other => panic!("expected one message call, got {other:?}"),
    }
}

// --- File uploads ---

#[test]
fn test_file_upload_uses_basename_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.log");
    std::fs::write(&path, b"log line\n").unwrap();

    let client = RecordingClient::default();
    let mut req = request(Content::File(path));
    req.thread_ts = Some("1700000000.000001".to_string());
    let result = dispatch(&req, &client).unwrap();

    assert_eq!(result.channel, "C0TEST");
    assert_eq!(result.timestamp, "");
    match &client.calls()[..] {
        [Call::Upload(upload)] => {
            assert_eq!(upload.filename, "report.log");
            assert_eq!(upload.content, b"log line\n");
            assert_eq!(upload.thread_ts.as_deref(), Some("1700000000.000001"));
        }
        other => panic!("expected one upload call, got {other:?}"),
    }
}

#[test]
fn test_missing_file_fails_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.txt");

    let client = RecordingClient::default();
    let err = dispatch(&request(Content::File(path.clone())), &client).unwrap_err();

    assert!(format!("{err:#}").contains("missing.txt"));
    assert!(client.calls().is_empty());
}

// --- Error wrapping ---

#[test]
fn test_message_failure_names_the_path() {
    let client = RecordingClient::failing("channel_not_found");
    let err = dispatch(&text_request("hi"), &client).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("failed to post message"));
    assert!(rendered.contains("channel_not_found"));
}

#[test]
fn test_blocks_failure_names_the_path() {
    let client = RecordingClient::failing("invalid_blocks");
    let blocks = serde_json::json!([{"type": "divider"}]);
    let err = dispatch(&request(Content::Blocks(blocks)), &client).unwrap_err();
    assert!(format!("{err:#}").contains("failed to post blocks"));
}

#[test]
fn test_snippet_failure_names_the_path() {
    let client = RecordingClient::failing("upload_error");
    let mut req = text_request("short");
    req.snippet = true;
    let err = dispatch(&req, &client).unwrap_err();
    assert!(format!("{err:#}").contains("failed to upload snippet"));
}
