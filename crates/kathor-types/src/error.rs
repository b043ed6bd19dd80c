use thiserror::Error;

use crate::llm::LlmError;
use crate::soul::SoulId;

/// Errors from a single cognitive step.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    #[error("generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model chose '{answer}', which is not one of the {choices} offered options")]
    InvalidChoice { answer: String, choices: usize },

    #[error("could not parse model answer: {0}")]
    UnparseableAnswer(String),

    #[error("stream ended before the response completed")]
    StreamInterrupted,
}

/// Errors that abort a mental process turn.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error("turn cancelled")]
    Cancelled,
}

/// Errors from soul engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("soul {0} not found")]
    SoulNotFound(SoulId),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Errors from speech synthesis.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("speech API key is not configured")]
    MissingApiKey,

    #[error("no voice id given and no default voice configured")]
    MissingVoice,

    #[error("speech request failed: {0}")]
    Request(String),

    #[error("speech vendor returned {status}: {body}")]
    Upstream { status: u16, body: String },
}
