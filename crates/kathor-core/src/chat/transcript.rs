//! Client-side view of a conversation, folded from soul events.
//!
//! Both the terminal chat and the web page show the same thing: the user's
//! lines, the soul's thoughts and answers as they stream in, and whether
//! the soul is currently thinking.

use serde::Serialize;
use uuid::Uuid;

use kathor_types::event::{MessageAction, SoulEvent};
use kathor_types::soul::SoulId;

/// Shown in place of a soul message that has no text yet.
pub const PLACEHOLDER: &str = "...";

/// One line of the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    User {
        content: String,
    },
    Soul {
        message_id: Uuid,
        action: MessageAction,
        content: String,
        complete: bool,
    },
}

impl TranscriptEntry {
    /// Text to render, with the placeholder for a still-empty message.
    pub fn display_text(&self) -> &str {
        match self {
            TranscriptEntry::User { content } => content,
            TranscriptEntry::Soul { content, .. } if content.is_empty() => PLACEHOLDER,
            TranscriptEntry::Soul { content, .. } => content,
        }
    }
}

/// What changed after applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    /// The event belonged to another soul or changed nothing visible.
    Ignored,
    ProcessStarted,
    MessageStarted { action: MessageAction },
    Delta { action: MessageAction, text: String },
    /// A message finished; answers are what gets spoken aloud.
    Completed { action: MessageAction, content: String },
    TurnFinished,
    TurnFailed { error: String },
    Cleared,
}

impl TranscriptUpdate {
    /// Finalized text that should be sent to speech synthesis.
    pub fn speech_text(&self) -> Option<&str> {
        match self {
            TranscriptUpdate::Completed {
                action: MessageAction::Answers,
                content,
            } if !content.is_empty() => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    soul_id: SoulId,
    entries: Vec<TranscriptEntry>,
    thinking: bool,
}

impl Transcript {
    pub fn new(soul_id: SoulId) -> Self {
        Self {
            soul_id,
            entries: Vec::new(),
            thinking: false,
        }
    }

    pub fn soul_id(&self) -> SoulId {
        self.soul_id
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Record a line the user sent.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.entries.push(TranscriptEntry::User {
            content: content.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.thinking = false;
    }

    /// Fold one event into the transcript.
    pub fn apply(&mut self, event: &SoulEvent) -> TranscriptUpdate {
        if event.soul_id() != self.soul_id {
            return TranscriptUpdate::Ignored;
        }
        match event {
            SoulEvent::ProcessStarted { .. } => {
                self.thinking = true;
                TranscriptUpdate::ProcessStarted
            }
            SoulEvent::MessageStarted {
                message_id, action, ..
            } => {
                self.thinking = *action == MessageAction::Thinks;
                self.entries.push(TranscriptEntry::Soul {
                    message_id: *message_id,
                    action: *action,
                    content: String::new(),
                    complete: false,
                });
                TranscriptUpdate::MessageStarted { action: *action }
            }
            SoulEvent::MessageDelta {
                message_id, text, ..
            } => match self.soul_entry(*message_id) {
                Some((action, content, _)) => {
                    content.push_str(text);
                    TranscriptUpdate::Delta {
                        action,
                        text: text.clone(),
                    }
                }
                None => TranscriptUpdate::Ignored,
            },
            SoulEvent::MessageCompleted {
                message_id,
                action,
                content,
                ..
            } => {
                match self.soul_entry(*message_id) {
                    Some((_, text, complete)) => {
                        *text = content.clone();
                        *complete = true;
                    }
                    None => self.entries.push(TranscriptEntry::Soul {
                        message_id: *message_id,
                        action: *action,
                        content: content.clone(),
                        complete: true,
                    }),
                }
                TranscriptUpdate::Completed {
                    action: *action,
                    content: content.clone(),
                }
            }
            SoulEvent::ProcessFinished { .. } => {
                self.thinking = false;
                TranscriptUpdate::TurnFinished
            }
            SoulEvent::ProcessFailed { error, .. } => {
                self.thinking = false;
                TranscriptUpdate::TurnFailed {
                    error: error.clone(),
                }
            }
            SoulEvent::Reset { .. } => {
                self.clear();
                TranscriptUpdate::Cleared
            }
        }
    }

    fn soul_entry(&mut self, id: Uuid) -> Option<(MessageAction, &mut String, &mut bool)> {
        self.entries.iter_mut().rev().find_map(|entry| match entry {
            TranscriptEntry::Soul {
                message_id,
                action,
                content,
                complete,
            } if *message_id == id => Some((*action, content, complete)),
            _ => None,
        })
    }
}
