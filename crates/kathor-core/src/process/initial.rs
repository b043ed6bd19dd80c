//! The intent dispatcher every conversation starts in.
//!
//! Classifies the latest message into one of five intents and routes to the
//! matching flow: outline an itinerary, ask for missing details, write the
//! itinerary, answer a question, or react to rudeness.

use kathor_types::error::ProcessError;
use kathor_types::event::MessageAction;
use kathor_types::process::ProcessKind;

use super::ProcessContext;
use crate::cognitive::{self, Decision, ExternalDialog, InternalMonologue, MentalQuery};
use crate::memory::WorkingMemory;

pub const INTENT_TRAVEL: &str = "They explicitly asked Kathor about travel destinations";
pub const INTENT_INFO: &str =
    "They provided information that Kathor requested to start building an itinerary";
pub const INTENT_QUESTION: &str = "They asked a new question about the itinerary";
pub const INTENT_CHAT: &str = "They're continuing the conversation or just chit-chatting";
pub const INTENT_RUDE: &str = "They're being rude or impolite to Kathor";

pub const INTENTS: [&str; 5] = [
    INTENT_TRAVEL,
    INTENT_INFO,
    INTENT_QUESTION,
    INTENT_CHAT,
    INTENT_RUDE,
];

const INTENT_DESCRIPTION: &str = "What is the intent of the user with their latest message?";
const CAN_OUTLINE: &str = "Kathor has enough information to write an outline of the itinerary.";
const NEEDS_MORE_INFO: &str =
    "Kathor needs more information before he can start building the itinerary.";
const THINK_ABOUT_QUESTION: &str = "Think carefully about the intent of the user's question.";
const PROCESS_RUDENESS: &str = "Process what the user has just said to you.";

/// Shared with the outraged process.
pub(crate) const BERATE: &str = "- Berate the user for being rude.\n\
                                 - Belittle their intelligence, and lack of culture.\n\
                                 - Demand an apology.";

const OUTLINE: &str = "Kathor does NOT PLAN the ITINERARY yet. He just:\n\
                       1. outlines his itinerary planning approach in a concise step-by-step list, using a few words for each step\n\
                       2. either:\n  \
                         2.1. makes a list of all the information missing, if any\n  \
                         2.2. OR if he has all the information he needs, says something like 'let's start building the itinerary!'";

const ASK_FOR_INFO: &str = "Kathor asks the user for more information.";
const WRITE_ITINERARY: &str =
    "Kathor writes the itinerary based on all the available information, enclosing the itinerary in ```";
const ANSWER: &str = "Kathor answers the user's question";

pub async fn run(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    let runtime = ctx.runtime();
    let options = ctx.process_options();

    let (_, intent) = cognitive::run(
        runtime,
        &Decision::new(INTENT_DESCRIPTION, &INTENTS),
        &memory,
        &options,
    )
    .await?;
    ctx.log(format_args!("Intent: {intent}"));

    let mut memory = memory;
    match intent.as_str() {
        INTENT_TRAVEL | INTENT_INFO => {
            let (_, can_outline) =
                cognitive::run(runtime, &MentalQuery::new(CAN_OUTLINE), &memory, &options).await?;
            return if can_outline {
                with_outline(ctx, memory).await
            } else {
                with_information_request(ctx, memory).await
            };
        }
        INTENT_QUESTION => {
            ctx.log("Thinking about the user's question");
            let (pending, stream) = cognitive::run_streaming(
                runtime,
                &InternalMonologue::new(THINK_ABOUT_QUESTION),
                &memory,
                &options,
            );
            ctx.dispatch(MessageAction::Thinks, stream).await?;
            memory = pending.finished().await?;
        }
        INTENT_RUDE => {
            ctx.log("Handling rude behavior");
            let (pending, stream) = cognitive::run_streaming(
                runtime,
                &InternalMonologue::new(PROCESS_RUDENESS),
                &memory,
                &options,
            );
            ctx.dispatch(MessageAction::Thinks, stream).await?;
            memory = pending.finished().await?;

            let (pending, stream) =
                cognitive::run_streaming(runtime, &ExternalDialog::new(BERATE), &memory, &options);
            ctx.dispatch(MessageAction::Answers, stream).await?;
            memory = pending.finished().await?;

            ctx.set_next_process(ProcessKind::Outraged);
            return Ok(memory);
        }
        _ => {}
    }

    ctx.log("Answering the user's message");
    let (pending, stream) =
        cognitive::run_streaming(runtime, &ExternalDialog::new(ANSWER), &memory, &options);
    ctx.dispatch(MessageAction::Answers, stream).await?;
    Ok(pending.finished().await?)
}

async fn with_outline(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    let runtime = ctx.runtime();
    let options = ctx.process_options();

    ctx.log("Outlining itinerary approach");
    let (pending, stream) =
        cognitive::run_streaming(runtime, &ExternalDialog::new(OUTLINE), &memory, &options);
    ctx.dispatch(MessageAction::Answers, stream).await?;
    let memory = pending.finished().await?;

    let (_, missing_information) =
        cognitive::run(runtime, &MentalQuery::new(NEEDS_MORE_INFO), &memory, &options).await?;
    if missing_information {
        return with_information_request(ctx, memory).await;
    }
    with_itinerary_writing(ctx, memory).await
}

async fn with_information_request(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    let runtime = ctx.runtime();
    let options = ctx.process_options();

    let (pending, stream) = cognitive::run_streaming(
        runtime,
        &InternalMonologue::new(THINK_ABOUT_QUESTION),
        &memory,
        &options,
    );
    ctx.dispatch(MessageAction::Thinks, stream).await?;
    let memory = pending.finished().await?;

    ctx.log("Asking for more information");
    let (pending, stream) =
        cognitive::run_streaming(runtime, &ExternalDialog::new(ASK_FOR_INFO), &memory, &options);
    ctx.dispatch(MessageAction::Answers, stream).await?;
    Ok(pending.finished().await?)
}

async fn with_itinerary_writing(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    let options = ctx.process_options();

    ctx.log("Writing the itinerary based on all the available information");
    let (pending, stream) = cognitive::run_streaming(
        ctx.runtime(),
        &ExternalDialog::new(WRITE_ITINERARY),
        &memory,
        &options,
    );
    ctx.dispatch(MessageAction::Answers, stream).await?;
    Ok(pending.finished().await?)
}
