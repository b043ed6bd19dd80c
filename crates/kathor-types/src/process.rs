//! The process pointer: which mental process handles the next message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named mental processes a soul can be in.
///
/// The set is closed, so the pointer is always a valid handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// The intent dispatcher.
    #[default]
    Initial,
    /// Entered after rude behaviour; left once the user apologizes.
    Outraged,
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessKind::Initial => write!(f, "initial"),
            ProcessKind::Outraged => write!(f, "outraged"),
        }
    }
}
