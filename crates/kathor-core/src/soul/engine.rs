//! The soul engine: owns live conversations and runs their turns.
//!
//! A turn appends the perception to a copy of the committed memory, runs
//! the honk reaction or the current mental process, then the compression
//! and user-notes subprocesses, and commits memory, notes and the process
//! pointer together. Nothing is committed if the turn fails or is
//! cancelled.
//!
//! Callers that do not wait for the outcome use [`SoulEngine::enqueue`]:
//! each soul drains its queued perceptions on one worker task, so turns run
//! in arrival order.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use kathor_types::error::{EngineError, ProcessError};
use kathor_types::event::SoulEvent;
use kathor_types::perception::Perception;
use kathor_types::process::ProcessKind;
use kathor_types::soul::{SoulId, SoulNotes, SoulSnapshot};

use super::runtime::SoulRuntime;
use super::state::{SoulSession, SoulState};
use crate::event::EventBus;
use crate::process::{self, EmittedMessage, ProcessContext, honk, summarize, user_model};

const EVENT_CAPACITY: usize = 1024;

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Process that will handle the next perception.
    pub next_process: ProcessKind,
    /// Messages emitted during the turn, in order.
    pub messages: Vec<EmittedMessage>,
}

/// Registry of live souls sharing one runtime and one event bus.
pub struct SoulEngine {
    runtime: Arc<SoulRuntime>,
    bus: EventBus,
    souls: DashMap<SoulId, Arc<SoulSession>>,
}

impl SoulEngine {
    pub fn new(runtime: SoulRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
            bus: EventBus::new(EVENT_CAPACITY),
            souls: DashMap::new(),
        }
    }

    pub fn runtime(&self) -> &SoulRuntime {
        &self.runtime
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Receive every soul's events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SoulEvent> {
        self.bus.subscribe()
    }

    /// Start a new conversation in its initial state.
    pub fn create_soul(&self) -> SoulId {
        let id = SoulId::new();
        let session = SoulSession::new(id, SoulState::fresh(&self.runtime));
        self.souls.insert(id, Arc::new(session));
        tracing::info!(soul_id = %id, soul = self.runtime.soul_name(), "soul created");
        id
    }

    pub fn contains(&self, soul_id: SoulId) -> bool {
        self.souls.contains_key(&soul_id)
    }

    /// Drop a conversation, cancelling any turn in flight.
    pub fn remove(&self, soul_id: SoulId) -> bool {
        match self.souls.remove(&soul_id) {
            Some((_, session)) => {
                session.close_queue();
                session.cancel_turn();
                tracing::info!(soul_id = %soul_id, "soul removed");
                true
            }
            None => false,
        }
    }

    fn session(&self, soul_id: SoulId) -> Result<Arc<SoulSession>, EngineError> {
        self.souls
            .get(&soul_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::SoulNotFound(soul_id))
    }

    /// Handle one perception. Waits for any turn already running on this
    /// soul to finish first.
    pub async fn dispatch(
        &self,
        soul_id: SoulId,
        perception: Perception,
    ) -> Result<ProcessOutcome, EngineError> {
        self.run_dispatch(soul_id, perception, None).await
    }

    /// Queue a perception and return at once. The soul's worker runs queued
    /// turns one after another in the order they were queued; outcomes are
    /// only visible as events.
    pub fn enqueue(
        self: &Arc<Self>,
        soul_id: SoulId,
        perception: Perception,
    ) -> Result<(), EngineError> {
        let session = self.session(soul_id)?;
        session.enqueue(perception, |rx, closed| {
            tokio::spawn(drain_queue(Arc::downgrade(self), soul_id, rx, closed));
        });
        Ok(())
    }

    #[tracing::instrument(
        name = "soul_turn",
        skip(self, perception, queue_closed),
        fields(soul_id = %soul_id, action = %perception.action)
    )]
    async fn run_dispatch(
        &self,
        soul_id: SoulId,
        perception: Perception,
        queue_closed: Option<&CancellationToken>,
    ) -> Result<ProcessOutcome, EngineError> {
        let session = self.session(soul_id)?;
        let _turn = session.lock_turn().await;
        let token = session.turn_token();
        // A reset between dequeue and lock discards the perception.
        if queue_closed.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!("queued perception discarded by reset");
            return Err(ProcessError::Cancelled.into());
        }
        let state = session.committed().await;

        self.bus.publish(SoulEvent::ProcessStarted {
            soul_id,
            process: state.process,
        });

        let result = tokio::select! {
            _ = token.cancelled() => Err(ProcessError::Cancelled),
            result = run_turn(&self.runtime, &self.bus, soul_id, state, &perception) => result,
        };

        match result {
            Ok((state, messages)) => {
                let next_process = state.process;
                tracing::info!(
                    next_process = %next_process,
                    memory_len = state.memory.len(),
                    messages = messages.len(),
                    "turn finished"
                );
                session.commit(state).await;
                self.bus.publish(SoulEvent::ProcessFinished {
                    soul_id,
                    next_process,
                });
                Ok(ProcessOutcome {
                    next_process,
                    messages,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "turn failed, state left unchanged");
                self.bus.publish(SoulEvent::ProcessFailed {
                    soul_id,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Start over: drop queued perceptions, cancel the running turn, then
    /// restore the initial state.
    pub async fn reset(&self, soul_id: SoulId) -> Result<(), EngineError> {
        let session = self.session(soul_id)?;
        session.close_queue();
        session.cancel_turn();
        let _turn = session.lock_turn().await;
        session.commit(SoulState::fresh(&self.runtime)).await;
        tracing::info!(soul_id = %soul_id, "soul reset");
        self.bus.publish(SoulEvent::Reset { soul_id });
        Ok(())
    }

    pub async fn snapshot(&self, soul_id: SoulId) -> Result<SoulSnapshot, EngineError> {
        let state = self.session(soul_id)?.committed().await;
        Ok(SoulSnapshot {
            id: soul_id,
            soul_name: self.runtime.soul_name().to_string(),
            process: state.process,
            memory_len: state.memory.len(),
            notes: state.notes,
        })
    }

    pub async fn notes(&self, soul_id: SoulId) -> Result<SoulNotes, EngineError> {
        Ok(self.session(soul_id)?.committed().await.notes)
    }

    pub async fn current_process(&self, soul_id: SoulId) -> Result<ProcessKind, EngineError> {
        Ok(self.session(soul_id)?.committed().await.process)
    }
}

/// Worker behind [`SoulEngine::enqueue`]. Ends when the queue is closed, the
/// soul is removed or the engine is dropped.
async fn drain_queue(
    engine: Weak<SoulEngine>,
    soul_id: SoulId,
    mut rx: mpsc::UnboundedReceiver<Perception>,
    closed: CancellationToken,
) {
    loop {
        let perception = tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            next = rx.recv() => match next {
                Some(perception) => perception,
                None => break,
            },
        };
        let Some(engine) = engine.upgrade() else {
            break;
        };
        // Failures are already published as process_failed events
        match engine.run_dispatch(soul_id, perception, Some(&closed)).await {
            Ok(outcome) => {
                tracing::debug!(
                    soul_id = %soul_id,
                    next_process = %outcome.next_process,
                    "queued turn finished"
                );
            }
            Err(EngineError::SoulNotFound(_)) => break,
            Err(e) => tracing::debug!(soul_id = %soul_id, error = %e, "queued turn failed"),
        }
    }
    tracing::debug!(soul_id = %soul_id, "perception queue closed");
}

impl std::fmt::Debug for SoulEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoulEngine")
            .field("souls", &self.souls.len())
            .field("bus", &self.bus)
            .finish()
    }
}

async fn run_turn(
    runtime: &SoulRuntime,
    bus: &EventBus,
    soul_id: SoulId,
    mut state: SoulState,
    perception: &Perception,
) -> Result<(SoulState, Vec<EmittedMessage>), ProcessError> {
    let mut memory = state.memory.with_memory(perception.to_memory());
    let mut ctx = ProcessContext::new(runtime, bus, soul_id, perception, state.process);

    if perception.is_honk() {
        memory = honk::run(&mut ctx, memory).await?;
        state.heard_honk = true;
    } else {
        if state.heard_honk {
            memory = honk::run(&mut ctx, memory).await?;
            state.heard_honk = false;
        }
        memory = process::run(state.process, &mut ctx, memory).await?;
    }
    state.process = ctx.next_process();
    let messages = ctx.into_emitted();

    memory = match summarize::run(runtime, &mut state.notes, memory.clone()).await {
        Ok(compressed) => compressed,
        Err(e) => {
            tracing::warn!(error = %e, "conversation compression failed, keeping full memory");
            memory
        }
    };
    if let Err(e) = user_model::run(runtime, &mut state.notes, &memory).await {
        tracing::warn!(error = %e, "user notes update failed");
    }

    state.memory = memory;
    Ok((state, messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use kathor_types::event::MessageAction;
    use kathor_types::llm::LlmError;

    use crate::llm::scripted::ScriptedProvider;
    use crate::process::initial::{INTENT_CHAT, INTENT_RUDE};
    use crate::process::test_support::runtime;

    fn decided(intent: &str) -> String {
        format!("{{\"decision\": \"{intent}\"}}")
    }

    fn engine(script: &ScriptedProvider) -> SoulEngine {
        SoulEngine::new(runtime(script))
    }

    #[tokio::test]
    async fn chat_turn_publishes_events_and_commits() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Bonjour, traveller!\"");
        let engine = engine(&script);
        let id = engine.create_soul();
        let mut rx = engine.subscribe();

        let outcome = engine
            .dispatch(id, Perception::said("User", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome.next_process, ProcessKind::Initial);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].content, "Bonjour, traveller!");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(SoulEvent::ProcessStarted { .. })));
        assert!(matches!(
            events.get(1),
            Some(SoulEvent::MessageStarted {
                action: MessageAction::Answers,
                ..
            })
        ));
        let streamed: String = events
            .iter()
            .filter_map(|e| match e {
                SoulEvent::MessageDelta { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, "Bonjour, traveller!");
        assert!(matches!(
            events.last(),
            Some(SoulEvent::ProcessFinished {
                next_process: ProcessKind::Initial,
                ..
            })
        ));

        let snapshot = engine.snapshot(id).await.unwrap();
        // persona, perception, reply
        assert_eq!(snapshot.memory_len, 3);
    }

    #[tokio::test]
    async fn outraged_pointer_persists_across_turns() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_RUDE))
            .reply("Kathor thought: \"Rude.\"")
            .reply("Kathor said: \"Apologize.\"")
            .reply("Kathor said: \"I'm waiting.\"")
            .reply("{\"isStatementTrue\": false}");
        let engine = engine(&script);
        let id = engine.create_soul();

        engine.dispatch(id, Perception::said("User", "you idiot")).await.unwrap();
        assert_eq!(engine.current_process(id).await.unwrap(), ProcessKind::Outraged);

        let outcome = engine.dispatch(id, Perception::said("User", "no")).await.unwrap();
        assert_eq!(outcome.next_process, ProcessKind::Outraged);
        assert_eq!(outcome.messages[0].content, "I'm waiting.");
        assert_eq!(script.remaining(), 0);
    }

    #[tokio::test]
    async fn failed_turn_keeps_prior_state() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_CHAT))
            .fail(LlmError::Overloaded("busy".to_string()));
        let engine = engine(&script);
        let id = engine.create_soul();
        let mut rx = engine.subscribe();
        let before = engine.snapshot(id).await.unwrap();

        let err = engine
            .dispatch(id, Perception::said("User", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Process(ProcessError::Step(_))));

        let after = engine.snapshot(id).await.unwrap();
        assert_eq!(after.memory_len, before.memory_len);
        assert_eq!(after.process, before.process);

        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            saw_failure |= matches!(event, SoulEvent::ProcessFailed { .. });
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn honk_is_silent_then_mentioned_on_next_message() {
        let script = ScriptedProvider::new()
            .reply("Kathor said: \"Please don't press that button again.\"")
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Now, where were we?\"")
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Lisbon, then.\"");
        let engine = engine(&script);
        let id = engine.create_soul();

        let honk = engine.dispatch(id, Perception::honked("User")).await.unwrap();
        assert!(honk.messages.is_empty());
        assert!(script.requests().is_empty());

        let next = engine.dispatch(id, Perception::said("User", "hi")).await.unwrap();
        let contents: Vec<_> = next.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Please don't press that button again.", "Now, where were we?"]
        );

        let later = engine.dispatch(id, Perception::said("User", "Lisbon?")).await.unwrap();
        assert_eq!(later.messages.len(), 1);
        assert_eq!(later.messages[0].content, "Lisbon, then.");
    }

    #[tokio::test]
    async fn reset_restores_initial_state() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_RUDE))
            .reply("Kathor thought: \"Rude.\"")
            .reply("Kathor said: \"Apologize.\"");
        let engine = engine(&script);
        let id = engine.create_soul();
        engine.dispatch(id, Perception::said("User", "you idiot")).await.unwrap();

        let mut rx = engine.subscribe();
        engine.reset(id).await.unwrap();

        let snapshot = engine.snapshot(id).await.unwrap();
        assert_eq!(snapshot.process, ProcessKind::Initial);
        assert_eq!(snapshot.memory_len, 1);
        assert_eq!(snapshot.notes, SoulNotes::initial("Kathor"));
        assert!(matches!(rx.try_recv(), Ok(SoulEvent::Reset { .. })));
    }

    #[tokio::test]
    async fn reset_cancels_in_flight_turn() {
        let script = ScriptedProvider::new().stall();
        let engine = Arc::new(engine(&script));
        let id = engine.create_soul();

        let turn = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.dispatch(id, Perception::said("User", "hi")).await })
        };
        while script.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        engine.reset(id).await.unwrap();
        let result = turn.await.unwrap();
        assert!(matches!(
            result,
            Err(EngineError::Process(ProcessError::Cancelled))
        ));
        assert_eq!(engine.snapshot(id).await.unwrap().memory_len, 1);
    }

    #[tokio::test]
    async fn concurrent_dispatches_are_serialized() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"One.\"")
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Two.\"");
        let engine = engine(&script);
        let id = engine.create_soul();

        let (a, b) = tokio::join!(
            engine.dispatch(id, Perception::said("User", "first")),
            engine.dispatch(id, Perception::said("User", "second")),
        );
        assert_eq!(a.unwrap().messages[0].content, "One.");
        assert_eq!(b.unwrap().messages[0].content, "Two.");
        // persona + two turns of (perception, reply)
        assert_eq!(engine.snapshot(id).await.unwrap().memory_len, 5);

        // The second turn saw the first turn's reply.
        let requests = script.requests();
        assert!(
            requests[2]
                .messages
                .iter()
                .any(|m| m.content == "Kathor said: \"One.\"")
        );
    }

    async fn wait_for_finished_turns(rx: &mut broadcast::Receiver<SoulEvent>, turns: usize) {
        let mut finished = 0;
        tokio::time::timeout(Duration::from_secs(5), async {
            while finished < turns {
                if let SoulEvent::ProcessFinished { .. } = rx.recv().await.unwrap() {
                    finished += 1;
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn queued_perceptions_run_in_arrival_order() {
        let mut script = ScriptedProvider::new();
        for n in 1..=4 {
            script = script
                .reply(decided(INTENT_CHAT))
                .reply(format!("Kathor said: \"Reply {n}.\""));
        }
        let engine = Arc::new(engine(&script));
        let id = engine.create_soul();
        let mut rx = engine.subscribe();

        for n in 1..=4 {
            engine
                .enqueue(id, Perception::said("User", format!("message {n}")))
                .unwrap();
        }
        wait_for_finished_turns(&mut rx, 4).await;

        // Each decision request sees exactly the messages queued before it.
        let requests = script.requests();
        for n in 1..=4 {
            let decision = &requests[(n - 1) * 2];
            let seen: Vec<usize> = (1..=4)
                .filter(|m| {
                    decision
                        .messages
                        .iter()
                        .any(|msg| msg.content.contains(&format!("message {m}")))
                })
                .collect();
            assert_eq!(seen, (1..=n).collect::<Vec<_>>());
        }
        // persona + four turns of (perception, reply)
        assert_eq!(engine.snapshot(id).await.unwrap().memory_len, 9);
    }

    #[tokio::test]
    async fn reset_discards_queued_perceptions() {
        let script = ScriptedProvider::new()
            .stall()
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Fresh start.\"");
        let engine = Arc::new(engine(&script));
        let id = engine.create_soul();

        engine.enqueue(id, Perception::said("User", "stuck")).unwrap();
        engine.enqueue(id, Perception::said("User", "dropped")).unwrap();
        while script.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        engine.reset(id).await.unwrap();

        let mut rx = engine.subscribe();
        engine.enqueue(id, Perception::said("User", "after reset")).unwrap();
        wait_for_finished_turns(&mut rx, 1).await;

        let requests = script.requests();
        assert_eq!(requests.len(), 3);
        assert!(
            requests
                .iter()
                .all(|r| r.messages.iter().all(|m| !m.content.contains("dropped")))
        );
        // persona + the post-reset turn
        assert_eq!(engine.snapshot(id).await.unwrap().memory_len, 3);
    }

    #[tokio::test]
    async fn enqueue_for_unknown_soul_is_reported() {
        let engine = Arc::new(engine(&ScriptedProvider::new()));
        let err = engine
            .enqueue(SoulId::new(), Perception::said("User", "hi"))
            .unwrap_err();
        assert!(matches!(err, EngineError::SoulNotFound(_)));
    }

    #[tokio::test]
    async fn unknown_soul_is_reported() {
        let engine = engine(&ScriptedProvider::new());
        let missing = SoulId::new();
        let err = engine
            .dispatch(missing, Perception::said("User", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SoulNotFound(id) if id == missing));
        assert!(!engine.remove(missing));
    }

    #[tokio::test]
    async fn user_notes_refresh_after_turn() {
        let script = ScriptedProvider::new()
            .reply(decided(INTENT_CHAT))
            .reply("Kathor said: \"Hello!\"")
            .reply("- Says hello a lot");
        let mut config = kathor_types::config::KathorConfig::default();
        config.memory.learn_about_user = true;
        let engine = SoulEngine::new(SoulRuntime::new(
            crate::llm::BoxLlmProvider::new(script.clone()),
            &config,
            "persona",
        ));
        let id = engine.create_soul();

        engine.dispatch(id, Perception::said("User", "hello")).await.unwrap();
        assert_eq!(engine.notes(id).await.unwrap().user, "- Says hello a lot");
    }
}
