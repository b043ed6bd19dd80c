//! Background refresh of what the soul knows about the user.

use kathor_types::error::StepError;
use kathor_types::soul::SoulNotes;

use crate::cognitive::{self, StepOptions, UserNotes};
use crate::memory::WorkingMemory;
use crate::soul::SoulRuntime;

/// Overwrite `notes.user` from the conversation. Memory is not modified.
#[tracing::instrument(name = "learns_about_user", skip_all)]
pub async fn run(
    runtime: &SoulRuntime,
    notes: &mut SoulNotes,
    memory: &WorkingMemory,
) -> Result<(), StepError> {
    if !runtime.memory_config().learn_about_user {
        return Ok(());
    }
    let (_, updated) = cognitive::run(
        runtime,
        &UserNotes::new(notes.user.clone()),
        memory,
        &StepOptions::default(),
    )
    .await?;
    tracing::debug!(notes = %updated, "user notes updated");
    notes.user = updated;
    Ok(())
}
