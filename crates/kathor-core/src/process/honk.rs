//! Reaction to the HONK button.
//!
//! When the invoking perception is the honk itself the soul stays silent.
//! The engine remembers that a honk was heard and runs this reaction again
//! before the next regular message, which is when the soul complains.

use kathor_types::error::ProcessError;
use kathor_types::event::MessageAction;
use kathor_types::memory::Memory;

use super::ProcessContext;
use crate::cognitive::{self, ExternalDialog};
use crate::memory::WorkingMemory;

const PLEASE_STOP: &str =
    "Respectfully, please don't press that button again, I'd rather not hear the noise.";

pub async fn run(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    if ctx.invoking_perception().is_honk() {
        ctx.log("Heard a honk");
        return Ok(memory);
    }

    let heard = memory.with_memory(Memory::assistant(format!(
        "{} heard a loud, irritating honking noise.",
        ctx.soul_name()
    )));
    let options = ctx.process_options();
    let (pending, stream) =
        cognitive::run_streaming(ctx.runtime(), &ExternalDialog::new(PLEASE_STOP), &heard, &options);
    ctx.dispatch(MessageAction::Answers, stream).await?;
    Ok(pending.finished().await?)
}
