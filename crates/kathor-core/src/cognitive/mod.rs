//! Cognitive steps: single prompt-shaped LLM calls over working memory.
//!
//! A step renders a command memory from the current working memory, sends
//! the memory plus that command to the provider, and post-processes the raw
//! answer into a typed value and the memory entry to append. The command
//! itself is never kept in memory.

pub mod decision;
pub mod external_dialog;
pub mod internal_monologue;
pub mod mental_query;
pub mod notes;
pub mod stream;
pub mod strip;

pub use decision::Decision;
pub use external_dialog::ExternalDialog;
pub use internal_monologue::InternalMonologue;
pub use mental_query::MentalQuery;
pub use notes::{ConversationNotes, UserNotes};
pub use stream::{PendingMemory, TextStream};
pub use strip::{EntityVerbStripper, strip_entity_and_verb};

use tokio::sync::oneshot;
use tracing::Instrument;

use kathor_types::error::StepError;
use kathor_types::llm::{CompletionRequest, StopReason};
use kathor_types::memory::Memory;

use crate::memory::WorkingMemory;
use crate::soul::SoulRuntime;

/// One prompt-shaped transformation of working memory.
pub trait CognitiveStep {
    type Output;

    /// Short name used in spans and logs.
    fn name(&self) -> &'static str;

    /// The instruction appended (transiently) after the working memory.
    fn command(&self, memory: &WorkingMemory) -> Memory;

    /// Turn the raw model answer into the memory to append and the value.
    fn post_process(
        &self,
        memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, Self::Output), StepError>;
}

/// A step whose value is display text and can therefore be streamed.
pub trait TextStep: CognitiveStep<Output = String> + Clone + Send + 'static {
    /// Cleaner applied to fragments while they stream.
    fn stripper(&self, soul_name: &str) -> EntityVerbStripper;
}

/// Per-call execution options.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Model identifier; the configured utility model when absent.
    pub model: Option<String>,
}

impl StepOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
        }
    }
}

fn build_request<S: CognitiveStep>(
    runtime: &SoulRuntime,
    step: &S,
    memory: &WorkingMemory,
    options: &StepOptions,
    stream: bool,
) -> CompletionRequest {
    let mut messages = memory.to_messages();
    messages.push(step.command(memory).to_message());
    let llm = runtime.llm();
    // Never ask for more than the provider can return
    let max_tokens = llm
        .max_tokens
        .min(runtime.provider().capabilities().max_output_tokens);
    CompletionRequest {
        model: options
            .model
            .clone()
            .unwrap_or_else(|| llm.utility_model().to_string()),
        messages,
        system: None,
        max_tokens,
        temperature: Some(llm.temperature),
        stream,
        stop_sequences: None,
    }
}

/// Run a step with a single non-streaming completion.
pub async fn run<S: CognitiveStep>(
    runtime: &SoulRuntime,
    step: &S,
    memory: &WorkingMemory,
    options: &StepOptions,
) -> Result<(WorkingMemory, S::Output), StepError> {
    let request = build_request(runtime, step, memory, options, false);
    let span = tracing::info_span!(
        "cognitive_step",
        step = step.name(),
        gen_ai.operation.name = "chat",
        gen_ai.provider.name = runtime.provider().name(),
        gen_ai.request.model = %request.model,
        memory_len = memory.len(),
    );
    let response = runtime
        .provider()
        .complete(&request)
        .instrument(span)
        .await?;
    if response.stop_reason == StopReason::MaxTokens {
        tracing::warn!(step = step.name(), "answer cut off at the token limit");
    }
    tracing::debug!(step = step.name(), answer = %response.content, "step answered");
    let (entry, value) = step.post_process(memory, &response.content)?;
    Ok((memory.with_memory(entry), value))
}

/// Run a text step with a streaming completion.
///
/// Nothing is sent until the returned stream is polled. The pending memory
/// resolves only after the stream has been drained.
pub fn run_streaming<S: TextStep>(
    runtime: &SoulRuntime,
    step: &S,
    memory: &WorkingMemory,
    options: &StepOptions,
) -> (PendingMemory, TextStream) {
    let request = build_request(runtime, step, memory, options, true);
    tracing::debug!(
        step = step.name(),
        model = %request.model,
        memory_len = memory.len(),
        "streaming cognitive step"
    );
    let events = runtime.provider().stream(request);
    let (tx, rx) = oneshot::channel();
    let text = TextStream::new(events, step.stripper(memory.soul_name()), tx);

    let step = step.clone();
    let pending = PendingMemory::new(
        memory.clone(),
        rx,
        Box::new(move |base, raw| step.post_process(base, raw).map(|(entry, _)| entry)),
    );
    (pending, text)
}

/// The first `{...}` object embedded in a model answer, if any.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
