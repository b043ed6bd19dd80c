//! HTTP request handlers.

pub mod page;
pub mod perception;
pub mod soul;
pub mod tts;
pub mod ws;

use kathor_types::soul::SoulId;

use crate::http::error::AppError;

/// Parse a soul id path segment.
pub(crate) fn parse_soul_id(raw: &str) -> Result<SoulId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid soul ID: {raw}")))
}
