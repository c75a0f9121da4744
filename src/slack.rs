use anyhow::{Context, Result};
use serde_json::Value;

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Message payload and decoration options, applied in the order given.
#[derive(Debug, Clone, PartialEq)]
pub enum MsgOption {
    Text(String),
    Blocks(Value),
    ThreadTs(String),
    IconEmoji(String),
    IconUrl(String),
    Username(String),
}

/// Parameters for a file upload. The byte length must be known up front.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub filename: String,
    pub content: Vec<u8>,
    pub channel: String,
    pub thread_ts: Option<String>,
}

/// Metadata of an uploaded file. Uploads never yield a message timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
}

/// The two Slack Web API operations this tool depends on. The wire format
/// stays behind this seam so the dispatcher can run against a substitute.
pub trait SlackApi {
    /// Post a single message. Returns (channel, timestamp) from the reply.
    fn post_message(&self, channel: &str, opts: &[MsgOption]) -> Result<(String, String)>;

    /// Upload a file and share it to a channel.
    fn upload_file(&self, upload: FileUpload) -> Result<FileInfo>;
}

/// HTTP client for the Slack Web API.
pub struct SlackClient {
    token: String,
    base_url: String,
    agent: ureq::Agent,
}

impl SlackClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// Build a full API URL for a method name.
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Make an authenticated GET request, return the parsed envelope.
    fn get(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.api_url(method);
        let mut req = self.agent.get(&url).header("Authorization", &self.bearer());
        for &(key, value) in params {
            req = req.query(key, value);
        }
        let resp_str = req
            .call()
            .with_context(|| format!("GET {method} failed"))?
            .body_mut()
            .read_to_string()
            .context("failed to read response body")?;
        let body: Value =
            serde_json::from_str(&resp_str).context("failed to parse response JSON")?;
        check_ok(&body, method)?;
        Ok(body)
    }

    /// Make an authenticated POST request with form data, return the parsed
    /// envelope.
    fn post_form(&self, method: &str, form: Vec<(&str, String)>) -> Result<Value> {
        let url = self.api_url(method);
        let resp_str = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .send_form(form)
            .with_context(|| format!("POST {method} failed"))?
            .body_mut()
            .read_to_string()
            .context("failed to read response body")?;
        let body: Value =
            serde_json::from_str(&resp_str).context("failed to parse response JSON")?;
        check_ok(&body, method)?;
        Ok(body)
    }
}

/// Every Web API reply carries an `ok` flag and an `error` code on failure.
fn check_ok(json: &Value, method: &str) -> Result<()> {
    if json["ok"].as_bool() != Some(true) {
        let msg = json["error"].as_str().unwrap_or("unknown error");
        anyhow::bail!("slack API error on {method}: {msg}");
    }
    Ok(())
}

impl SlackApi for SlackClient {
    fn post_message(&self, channel: &str, opts: &[MsgOption]) -> Result<(String, String)> {
        let mut form: Vec<(&str, String)> = vec![("channel", channel.to_string())];
        for opt in opts {
            match opt {
                MsgOption::Text(text) => form.push(("text", text.clone())),
                MsgOption::Blocks(blocks) => form.push(("blocks", blocks.to_string())),
                MsgOption::ThreadTs(ts) => form.push(("thread_ts", ts.clone())),
                MsgOption::IconEmoji(emoji) => form.push(("icon_emoji", emoji.clone())),
                MsgOption::IconUrl(url) => form.push(("icon_url", url.clone())),
                MsgOption::Username(name) => form.push(("username", name.clone())),
            }
        }

        let body = self.post_form("chat.postMessage", form)?;
        let channel = body["channel"].as_str().unwrap_or_default().to_string();
        let ts = body["ts"].as_str().unwrap_or_default().to_string();
        Ok((channel, ts))
    }

    fn upload_file(&self, upload: FileUpload) -> Result<FileInfo> {
        // Reserve an upload URL for the file.
        let length = upload.content.len().to_string();
        let reserved = self.get(
            "files.getUploadURLExternal",
            &[("filename", &upload.filename), ("length", &length)],
        )?;
        let upload_url = reserved["upload_url"]
            .as_str()
            .context("missing upload_url in response")?;
        let file_id = reserved["file_id"]
            .as_str()
            .context("missing file_id in response")?;

        // Send the raw content to the reserved URL.
        self.agent
            .post(upload_url)
            .header("Content-Type", "application/octet-stream")
            .send(&upload.content[..])
            .with_context(|| format!("content upload for {} failed", upload.filename))?;

        // Attach the uploaded file to the target channel.
        let files = serde_json::json!([{ "id": file_id, "title": upload.filename }]).to_string();
        let mut form: Vec<(&str, String)> =
            vec![("files", files), ("channel_id", upload.channel.clone())];
        if let Some(ts) = &upload.thread_ts {
            form.push(("thread_ts", ts.clone()));
        }
        let completed = self.post_form("files.completeUploadExternal", form)?;

        let file = &completed["files"][0];
        Ok(FileInfo {
            id: file["id"].as_str().unwrap_or(file_id).to_string(),
            name: file["name"].as_str().unwrap_or(&upload.filename).to_string(),
        })
    }
}
