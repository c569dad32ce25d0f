//! Line-oriented stdin/stdout front end.
//!
//! Each non-empty line is either a JSON idea submission or a slash command.
//! Replies are single JSON lines on stdout; the prompt goes to stderr.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::bus::{Envelope, Topic};
use crate::error::CommandError;
use crate::pipeline::{IdeaSubmission, Pipeline};

/// Envelopes shown by `/recent` and `/topic` when no count is given.
const DEFAULT_LIMIT: usize = 10;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(IdeaSubmission),
    Recent(usize),
    Topic { topic: Topic, limit: usize },
    History(Uuid),
    Help,
    Quit,
}

impl Command {
    /// Parse a trimmed, non-empty line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Submit(IdeaSubmission::from_json(line)?));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("quit" | "exit", []) => Ok(Self::Quit),
            ("help", []) => Ok(Self::Help),
            ("recent", []) => Ok(Self::Recent(DEFAULT_LIMIT)),
            ("recent", [n]) => Ok(Self::Recent(parse_limit(n, "/recent [n]")?)),
            ("recent", _) => Err(CommandError::Usage("/recent [n]")),
            ("topic", [topic]) => Ok(Self::Topic {
                topic: topic.parse()?,
                limit: DEFAULT_LIMIT,
            }),
            ("topic", [topic, n]) => Ok(Self::Topic {
                topic: topic.parse()?,
                limit: parse_limit(n, "/topic <name> [n]")?,
            }),
            ("topic", _) => Err(CommandError::Usage("/topic <name> [n]")),
            ("history", [id]) => id
                .parse()
                .map(Self::History)
                .map_err(|_| CommandError::Usage("/history <message-id>")),
            ("history", _) => Err(CommandError::Usage("/history <message-id>")),
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

fn parse_limit(raw: &str, usage: &'static str) -> Result<usize, CommandError> {
    raw.parse().map_err(|_| CommandError::Usage(usage))
}

/// Run a command against the pipeline and render the reply line.
///
/// Returns `None` for `/quit`.
pub fn execute(pipeline: &Pipeline, command: Command) -> Option<String> {
    let reply = match command {
        Command::Quit => return None,
        Command::Help => json!({
            "usage": [
                "{\"contentKind\": ..., \"persona\": ..., \"title\": ..., \"rawIdea\": ...}",
                "/recent [n]",
                "/topic <name> [n]",
                "/history <message-id>",
                "/quit",
            ],
            "topics": Topic::ALL.iter().map(Topic::as_str).collect::<Vec<_>>(),
        }),
        Command::Submit(submission) => match pipeline.submit(submission) {
            Ok(outcome) => json!(outcome),
            Err(e) => json!({ "error": e.to_string() }),
        },
        Command::Recent(n) => envelopes(pipeline.bus().recent(n)),
        Command::Topic { topic, limit } => {
            envelopes(pipeline.bus().recent_for_topic(topic, limit))
        }
        Command::History(id) => envelopes(pipeline.bus().history(id)),
    };
    Some(reply.to_string())
}

fn envelopes(list: Vec<Envelope>) -> serde_json::Value {
    json!({ "count": list.len(), "messages": list })
}

/// Read commands from stdin until EOF or `/quit`.
pub async fn run(pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    serve(pipeline, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Line loop over any reader/writer pair. Replies go to `out`, one per line.
pub async fn serve<R, W>(pipeline: Arc<Pipeline>, input: R, mut out: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        let reply = match Command::parse(&line) {
            Ok(command) => {
                // Submissions persist the log on every publish; keep that off the runtime.
                let pipeline = Arc::clone(&pipeline);
                tokio::task::spawn_blocking(move || execute(&pipeline, command)).await?
            }
            Err(e) => Some(json!({ "error": e.to_string() }).to_string()),
        };
        let Some(reply) = reply else {
            break;
        };
        out.write_all(reply.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        eprint!("> ");
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}
