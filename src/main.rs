// src/main.rs
use clap::Parser;

use slack_quickpost::post::{self, PostResult};
use slack_quickpost::profile::{self, Profile};
use slack_quickpost::resolve::{self, Sources};
use slack_quickpost::slack::SlackClient;

#[derive(Parser)]
#[command(
    name = "slack-quickpost",
    version,
    about = "Post a message, Block Kit payload, or file to a Slack channel"
)]
struct Cli {
    /// Message text to post (a literal `\n` becomes a newline)
    #[arg(long)]
    text: Option<String>,

    /// Post the contents of a text file
    #[arg(long)]
    textfile: Option<String>,

    /// Post text as a snippet even when it fits in one message
    #[arg(long)]
    snippet: bool,

    /// Block Kit JSON payload to post
    #[arg(long)]
    blocks: Option<String>,

    /// File to upload
    #[arg(long)]
    file: Option<String>,

    /// Slack app OAuth token (falls back to SLACK_TOKEN, then the profile)
    #[arg(long)]
    token: Option<String>,

    /// Channel ID to post to (falls back to SLACK_CHANNEL, then the profile)
    #[arg(long)]
    channel: Option<String>,

    /// Profile name (falls back to SLACK_QUICKPOST_PROFILE)
    #[arg(long)]
    profile: Option<String>,

    /// Post under an existing thread
    #[arg(long)]
    thread_ts: Option<String>,

    /// Icon emoji for the message
    #[arg(long)]
    icon: Option<String>,

    /// Icon image URL (ignored when --icon is set)
    #[arg(long)]
    icon_url: Option<String>,

    /// Override the posting user name
    #[arg(long)]
    username: Option<String>,

    /// Always exit with status 0, even on failure
    #[arg(long)]
    nofail: bool,
}

fn main() {
    let cli = Cli::parse();
    let nofail = cli.nofail;

    match run(cli) {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&e.to_string(), nofail),
        },
        Err(message) => fail(&message, nofail),
    }
}

/// Print the failure message and exit: 1 normally, 0 under --nofail.
fn fail(message: &str, nofail: bool) -> ! {
    println!("{message}");
    std::process::exit(if nofail { 0 } else { 1 });
}

fn run(cli: Cli) -> Result<PostResult, String> {
    let env_profile = std::env::var("SLACK_QUICKPOST_PROFILE").unwrap_or_default();
    let profile_name =
        resolve::first_non_empty(&[cli.profile.as_deref(), Some(&env_profile)]);
    let profile = match profile_name {
        Some(name) => load_profile_or_warn(name),
        None => Profile::default(),
    };

    let sources = Sources {
        token: cli.token,
        env_token: std::env::var("SLACK_TOKEN").ok(),
        channel: cli.channel,
        env_channel: std::env::var("SLACK_CHANNEL").ok(),
        text: cli.text,
        textfile: cli.textfile,
        blocks: cli.blocks,
        file: cli.file,
        snippet: cli.snippet,
        thread_ts: cli.thread_ts,
        icon: cli.icon,
        icon_url: cli.icon_url,
        username: cli.username,
    };

    let req = resolve::resolve(sources, &profile).map_err(|errors| errors.join("\n"))?;

    let client = SlackClient::new(&req.token);
    post::dispatch(&req, &client).map_err(|e| format!("{e:#}"))
}

/// A profile that fails to load is reported as a warning and treated as
/// empty; the run fails later only if required fields stay unresolved.
fn load_profile_or_warn(name: &str) -> Profile {
    match profile::profile_path(name).and_then(|path| profile::load_profile(&path)) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("warning: failed to load profile {name}: {e:#}");
            Profile::default()
        }
    }
}
