//! Streamed step output and the memory it resolves to.
//!
//! `run_streaming` hands back two halves: a [`TextStream`] of cleaned
//! fragments for the presentation layer, and a [`PendingMemory`] that
//! resolves to the extended working memory once the stream has been fully
//! consumed. The stream is single-consumer and cannot be replayed.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio::sync::oneshot;

use kathor_types::error::StepError;
use kathor_types::llm::{LlmError, StreamEvent};
use kathor_types::memory::Memory;

use super::strip::EntityVerbStripper;
use crate::memory::WorkingMemory;

type ProviderStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;
type PostProcess = Box<dyn FnOnce(&WorkingMemory, &str) -> Result<Memory, StepError> + Send>;

pin_project! {
    /// Cleaned text fragments of one streamed step.
    pub struct TextStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<String, StepError>> + Send>>,
    }
}

impl TextStream {
    pub(crate) fn new(
        events: ProviderStream,
        mut stripper: EntityVerbStripper,
        completion: oneshot::Sender<Result<String, StepError>>,
    ) -> Self {
        let inner = async_stream::stream! {
            let mut events = events;
            let mut raw = String::new();
            let mut failure = None;

            while let Some(event) = events.next().await {
                match event {
                    Ok(StreamEvent::TextDelta { text }) => {
                        raw.push_str(&text);
                        let visible = stripper.push(&text);
                        if !visible.is_empty() {
                            yield Ok(visible);
                        }
                    }
                    Ok(StreamEvent::Done) => break,
                    Ok(_) => {}
                    Err(e) => {
                        failure = Some(StepError::from(e));
                        break;
                    }
                }
            }

            match failure {
                Some(err) => {
                    let _ = completion.send(Err(err.clone()));
                    yield Err(err);
                }
                None => {
                    let tail = stripper.finish();
                    if !tail.is_empty() {
                        yield Ok(tail);
                    }
                    let _ = completion.send(Ok(raw));
                }
            }
        };
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for TextStream {
    type Item = Result<String, StepError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream").finish_non_exhaustive()
    }
}

/// Working memory that becomes available once its [`TextStream`] completes.
pub struct PendingMemory {
    base: WorkingMemory,
    completion: oneshot::Receiver<Result<String, StepError>>,
    post_process: PostProcess,
}

impl PendingMemory {
    pub(crate) fn new(
        base: WorkingMemory,
        completion: oneshot::Receiver<Result<String, StepError>>,
        post_process: PostProcess,
    ) -> Self {
        Self {
            base,
            completion,
            post_process,
        }
    }

    /// Wait for the stream to finish and return the extended memory.
    ///
    /// Fails with `StreamInterrupted` if the stream was dropped before its
    /// end, and with the stream's own error if generation failed.
    pub async fn finished(self) -> Result<WorkingMemory, StepError> {
        let raw = self
            .completion
            .await
            .map_err(|_| StepError::StreamInterrupted)??;
        let memory = (self.post_process)(&self.base, &raw)?;
        Ok(self.base.with_memory(memory))
    }
}

impl std::fmt::Debug for PendingMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMemory")
            .field("base_len", &self.base.len())
            .finish_non_exhaustive()
    }
}
