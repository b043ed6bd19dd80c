//! In-memory provider that replays queued replies.
//!
//! Used by tests across the workspace to drive mental processes without a
//! network. Each `complete` or `stream` call pops the next reply in order;
//! streamed replies are cut into small fragments so consumers see several
//! deltas. Every request is recorded for later inspection.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::Stream;

use kathor_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
    StreamEvent, Usage,
};

use super::provider::LlmProvider;

const FRAGMENT_CHARS: usize = 7;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(LlmError),
    /// Never answers; used to hold a turn in flight.
    Stall,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<CompletionRequest>,
}

/// Provider that answers from a pre-loaded script.
///
/// Cloning shares the script, so a test can keep a handle after boxing the
/// provider.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    capabilities: ProviderCapabilities,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.lock().replies.push_back(Reply::Text(text.into()));
        self
    }

    /// Queue a failing call.
    pub fn fail(self, error: LlmError) -> Self {
        self.lock().replies.push_back(Reply::Fail(error));
        self
    }

    /// Queue a call that never completes.
    pub fn stall(self) -> Self {
        self.lock().replies.push_back(Reply::Stall);
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, request: &CompletionRequest) -> Reply {
        let mut script = self.lock();
        script.requests.push(request.clone());
        script.replies.pop_front().unwrap_or_else(|| {
            Reply::Fail(LlmError::Provider {
                message: "scripted provider has no replies left".to_string(),
            })
        })
    }
}

fn fragments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(FRAGMENT_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let reply = self.next_reply(request);
        let model = request.model.clone();
        async move {
            match reply {
                Reply::Text(content) => Ok(CompletionResponse {
                    id: format!("scripted-{}", uuid::Uuid::now_v7()),
                    content,
                    model,
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Reply::Fail(err) => Err(err),
                Reply::Stall => std::future::pending().await,
            }
        }
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let reply = self.next_reply(&request);
        Box::pin(async_stream::stream! {
            match reply {
                Reply::Text(text) => {
                    yield Ok(StreamEvent::Connected);
                    for text in fragments(&text) {
                        yield Ok(StreamEvent::TextDelta { text });
                    }
                    yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
                    yield Ok(StreamEvent::Done);
                }
                Reply::Fail(err) => {
                    yield Ok(StreamEvent::Connected);
                    yield Err(err);
                }
                Reply::Stall => {
                    yield Ok(StreamEvent::Connected);
                    std::future::pending::<()>().await;
                }
            }
        })
    }
}
