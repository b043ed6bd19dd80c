//! Inbound perceptions: what a client dispatches to a soul.

use serde::{Deserialize, Serialize};

use crate::memory::Memory;

/// Action label for ordinary chat messages.
pub const ACTION_SAID: &str = "said";

/// Action label dispatched by the HONK button.
pub const ACTION_HONKED: &str = "honked";

/// Content the HONK button sends along with [`ACTION_HONKED`].
pub const HONK_CONTENT: &str = "*HONK button pressed*";

/// An event dispatched to a soul by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perception {
    /// Who produced the perception (e.g. "User").
    pub name: String,
    /// Action label, e.g. `said` or `honked`.
    pub action: String,
    pub content: String,
}

impl Perception {
    /// A chat message from `name`.
    pub fn said(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: ACTION_SAID.to_string(),
            content: content.into(),
        }
    }

    /// The fixed HONK event.
    pub fn honked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: ACTION_HONKED.to_string(),
            content: HONK_CONTENT.to_string(),
        }
    }

    pub fn is_honk(&self) -> bool {
        self.action == ACTION_HONKED
    }

    /// Render as the user memory appended before a process runs.
    pub fn to_memory(&self) -> Memory {
        Memory::user(format!("{} {}: \"{}\"", self.name, self.action, self.content))
            .with_name(self.name.clone())
    }
}
