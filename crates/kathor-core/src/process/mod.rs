//! Mental processes: the branching flows that answer a perception.
//!
//! A process receives working memory (already extended with the invoking
//! perception) and a [`ProcessContext`], runs cognitive steps, emits
//! messages through the context, and returns the memory to commit. The
//! process pointer is only changed through `set_next_process`; the engine
//! commits it together with the memory once the process returns `Ok`.

pub mod honk;
pub mod initial;
pub mod outraged;
pub mod summarize;
pub mod user_model;

use futures_util::StreamExt;
use uuid::Uuid;

use kathor_types::error::ProcessError;
use kathor_types::event::{MessageAction, SoulEvent};
use kathor_types::perception::Perception;
use kathor_types::process::ProcessKind;
use kathor_types::soul::SoulId;

use crate::cognitive::{StepOptions, TextStream};
use crate::event::EventBus;
use crate::memory::WorkingMemory;
use crate::soul::SoulRuntime;

/// A message a process emitted during one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedMessage {
    pub action: MessageAction,
    pub content: String,
}

/// Everything a running process may read or affect besides its memory.
pub struct ProcessContext<'a> {
    runtime: &'a SoulRuntime,
    bus: &'a EventBus,
    soul_id: SoulId,
    invoking: &'a Perception,
    next_process: ProcessKind,
    emitted: Vec<EmittedMessage>,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        runtime: &'a SoulRuntime,
        bus: &'a EventBus,
        soul_id: SoulId,
        invoking: &'a Perception,
        current: ProcessKind,
    ) -> Self {
        Self {
            runtime,
            bus,
            soul_id,
            invoking,
            next_process: current,
            emitted: Vec::new(),
        }
    }

    pub fn runtime(&self) -> &'a SoulRuntime {
        self.runtime
    }

    pub fn soul_name(&self) -> &'a str {
        self.runtime.soul_name()
    }

    /// The perception that started this turn.
    pub fn invoking_perception(&self) -> &'a Perception {
        self.invoking
    }

    /// Options for the steps a process runs on the main model.
    pub fn process_options(&self) -> StepOptions {
        StepOptions::with_model(&self.runtime.llm().model)
    }

    /// Hand the next perception to `kind`. Committed only if the turn succeeds.
    pub fn set_next_process(&mut self, kind: ProcessKind) {
        tracing::debug!(soul_id = %self.soul_id, next = %kind, "next process set");
        self.next_process = kind;
    }

    pub fn next_process(&self) -> ProcessKind {
        self.next_process
    }

    /// Diagnostic log line attributed to this soul.
    pub fn log(&self, message: impl std::fmt::Display) {
        tracing::info!(soul_id = %self.soul_id, soul = self.soul_name(), "{message}");
    }

    /// Emit a streamed message and wait for it to finish.
    ///
    /// Returns the full displayed text. Fragments are published as they
    /// arrive; a stream error aborts the turn.
    pub async fn dispatch(
        &mut self,
        action: MessageAction,
        mut stream: TextStream,
    ) -> Result<String, ProcessError> {
        let message_id = Uuid::now_v7();
        self.bus.publish(SoulEvent::MessageStarted {
            soul_id: self.soul_id,
            message_id,
            action,
        });

        let mut content = String::new();
        while let Some(fragment) = stream.next().await {
            let text = fragment?;
            content.push_str(&text);
            self.bus.publish(SoulEvent::MessageDelta {
                soul_id: self.soul_id,
                message_id,
                text,
            });
        }

        self.bus.publish(SoulEvent::MessageCompleted {
            soul_id: self.soul_id,
            message_id,
            action,
            content: content.clone(),
        });
        self.emitted.push(EmittedMessage {
            action,
            content: content.clone(),
        });
        Ok(content)
    }

    /// Messages emitted so far, in order.
    pub fn emitted(&self) -> &[EmittedMessage] {
        &self.emitted
    }

    pub(crate) fn into_emitted(self) -> Vec<EmittedMessage> {
        self.emitted
    }
}

/// Run the process the pointer names.
pub async fn run(
    kind: ProcessKind,
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
) -> Result<WorkingMemory, ProcessError> {
    match kind {
        ProcessKind::Initial => initial::run(ctx, memory).await,
        ProcessKind::Outraged => outraged::run(ctx, memory).await,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use kathor_types::config::KathorConfig;

    use crate::llm::BoxLlmProvider;
    use crate::llm::scripted::ScriptedProvider;
    use crate::soul::SoulRuntime;

    pub const PERSONA: &str = "You are Kathor Minos, a travel planner.";

    pub fn runtime(script: &ScriptedProvider) -> SoulRuntime {
        let mut config = KathorConfig::default();
        config.memory.learn_about_user = false;
        SoulRuntime::new(BoxLlmProvider::new(script.clone()), &config, PERSONA)
    }
}
