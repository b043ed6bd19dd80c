//! Escalated state entered after rudeness.
//!
//! Every message gets another admonishment. Once the user apologizes the
//! soul grudgingly forgives and hands control back to the dispatcher.

use kathor_types::error::ProcessError;
use kathor_types::event::MessageAction;
use kathor_types::process::ProcessKind;

use super::ProcessContext;
use super::initial::BERATE;
use crate::cognitive::{self, ExternalDialog, InternalMonologue, MentalQuery, StepOptions};
use crate::memory::WorkingMemory;

const APOLOGIZED: &str = "Did the user apologize for being rude, or admit they were wrong?";
const FORGIVE: &str =
    "I'll give this client another chance, but my feelings about them won't be the same.";

pub async fn run(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    let runtime = ctx.runtime();
    let options = ctx.process_options();

    let (pending, stream) =
        cognitive::run_streaming(runtime, &ExternalDialog::new(BERATE), &memory, &options);
    ctx.dispatch(MessageAction::Answers, stream).await?;
    let memory = pending.finished().await?;

    let (_, should_forgive) = cognitive::run(
        runtime,
        &MentalQuery::new(APOLOGIZED),
        &memory,
        &StepOptions::default(),
    )
    .await?;
    ctx.log(format_args!("Has the user apologized: {should_forgive}"));

    if !should_forgive {
        return Ok(memory);
    }

    let (pending, stream) =
        cognitive::run_streaming(runtime, &InternalMonologue::new(FORGIVE), &memory, &options);
    ctx.dispatch(MessageAction::Thinks, stream).await?;
    let memory = pending.finished().await?;
    ctx.set_next_process(ProcessKind::Initial);
    Ok(memory)
}
