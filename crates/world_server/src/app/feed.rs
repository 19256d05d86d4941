use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use zone_engine::{Action, ActionParseError, ActionSender, Identifier, ObjectId, ShutdownHandle, ZoneId};

/// One line of the feed: `{"player": 3, "zone": "tavern", "type": "attack", "target": 1}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    player: u32,
    zone: ZoneId,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

#[derive(Debug, Error)]
pub(crate) enum FeedLineError {
    #[error("invalid action envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error(transparent)]
    Action(#[from] ActionParseError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FeedStats {
    pub(crate) accepted: u64,
    pub(crate) rejected: u64,
}

/// Blank lines yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<(Identifier, Action)>, FeedLineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let envelope: Envelope = serde_json::from_str(line)?;
    let action = Action::from_json_map(envelope.payload)?;
    Ok(Some((
        Identifier::new(ObjectId(envelope.player), envelope.zone),
        action,
    )))
}

/// Forwards parsed lines to the turn thread until the input ends or the
/// server stops accepting actions.
pub(crate) fn pump_lines(reader: impl BufRead, sender: &ActionSender) -> FeedStats {
    let mut stats = FeedStats::default();
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "action_feed_read_failed");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some((player, action))) => {
                debug!(player = %player, action_type = action.kind(), "action_received");
                if let Err(err) = sender.submit(player, action) {
                    warn!(error = %err, "action_feed_server_closed");
                    break;
                }
                stats.accepted += 1;
            }
            Ok(None) => {}
            Err(err) => {
                stats.rejected += 1;
                warn!(line = index + 1, error = %err, "action_line_rejected");
            }
        }
    }
    stats
}

/// Reads JSON lines from stdin on a named thread. End of input requests a
/// server shutdown.
pub(crate) fn spawn_stdin_feed(
    sender: ActionSender,
    shutdown: ShutdownHandle,
) -> io::Result<JoinHandle<FeedStats>> {
    thread::Builder::new()
        .name("action-feed".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let stats = pump_lines(stdin.lock(), &sender);
            info!(
                accepted = stats.accepted,
                rejected = stats.rejected,
                "action_feed_closed"
            );
            shutdown.request();
            stats
        })
}
