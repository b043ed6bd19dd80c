//! Outbound event types for the soul event bus.
//!
//! `SoulEvent` is broadcast while a mental process runs. Subscribers (the
//! WebSocket handler, the terminal chat loop) fold these into what the user
//! sees. All variants are Clone + Send + Sync for use with tokio broadcast
//! channels.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::process::ProcessKind;
use crate::soul::SoulId;

/// Kind of an outbound message, used by clients to style it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAction {
    /// Internal reasoning, shown as the soul's inner thoughts.
    Thinks,
    /// A reply addressed to the user.
    Answers,
}

impl fmt::Display for MessageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageAction::Thinks => write!(f, "thinks"),
            MessageAction::Answers => write!(f, "answers"),
        }
    }
}

/// Events emitted while a soul handles a perception.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SoulEvent {
    /// A perception was accepted and a process started running.
    ProcessStarted { soul_id: SoulId, process: ProcessKind },

    /// A new outbound message began streaming.
    MessageStarted {
        soul_id: SoulId,
        message_id: Uuid,
        action: MessageAction,
    },

    /// A fragment of an outbound message.
    MessageDelta {
        soul_id: SoulId,
        message_id: Uuid,
        text: String,
    },

    /// An outbound message finished; `content` is the full text.
    MessageCompleted {
        soul_id: SoulId,
        message_id: Uuid,
        action: MessageAction,
        content: String,
    },

    /// The turn finished; `next_process` handles the next perception.
    ProcessFinished {
        soul_id: SoulId,
        next_process: ProcessKind,
    },

    /// The turn failed; no state was committed.
    ProcessFailed { soul_id: SoulId, error: String },

    /// The soul was reset to its initial state.
    Reset { soul_id: SoulId },
}

impl SoulEvent {
    /// The soul this event belongs to.
    pub fn soul_id(&self) -> SoulId {
        match self {
            SoulEvent::ProcessStarted { soul_id, .. }
            | SoulEvent::MessageStarted { soul_id, .. }
            | SoulEvent::MessageDelta { soul_id, .. }
            | SoulEvent::MessageCompleted { soul_id, .. }
            | SoulEvent::ProcessFinished { soul_id, .. }
            | SoulEvent::ProcessFailed { soul_id, .. }
            | SoulEvent::Reset { soul_id } => *soul_id,
        }
    }
}
