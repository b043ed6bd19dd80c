//! Conversation compression, run after every turn.
//!
//! Once memory grows past the threshold the soul reflects on what it has
//! learned, folds that into its running conversation notes, and keeps only
//! the persona entry, a summary entry, and the most recent tail.

use kathor_types::error::StepError;
use kathor_types::memory::Memory;
use kathor_types::soul::SoulNotes;

use crate::cognitive::{self, ConversationNotes, InternalMonologue, StepOptions};
use crate::memory::WorkingMemory;
use crate::soul::SoulRuntime;

const REFLECT: &str = "What have I learned in this conversation.";

#[tracing::instrument(
    name = "summarizes",
    skip_all,
    fields(memory_len = memory.len())
)]
pub async fn run(
    runtime: &SoulRuntime,
    notes: &mut SoulNotes,
    memory: WorkingMemory,
) -> Result<WorkingMemory, StepError> {
    let config = runtime.memory_config();
    if memory.len() <= config.compression_threshold {
        return Ok(memory);
    }

    tracing::info!("updating conversation notes");
    let options = StepOptions::default();
    let (reflected, _) = cognitive::run(
        runtime,
        &InternalMonologue::new(REFLECT).with_verb("noted"),
        &memory,
        &options,
    )
    .await?;
    let (_, updated) = cognitive::run(
        runtime,
        &ConversationNotes::new(notes.conversation.clone()),
        &reflected,
        &options,
    )
    .await?;
    notes.conversation = updated.clone();

    let summary =
        Memory::assistant(format!("## Conversation so far\n{updated}")).as_conversation_summary();
    let compressed = memory
        .head(1)
        .with_memory(summary)
        .concat(&memory.tail(config.keep_recent));
    tracing::info!(compressed_len = compressed.len(), "conversation compressed");
    Ok(compressed)
}
