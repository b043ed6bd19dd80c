//! Per-conversation state and its session wrapper.

use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio_util::sync::CancellationToken;

use kathor_types::perception::Perception;
use kathor_types::process::ProcessKind;
use kathor_types::soul::{SoulId, SoulNotes};

use super::SoulRuntime;
use crate::memory::WorkingMemory;

/// State committed at the end of each successful turn.
#[derive(Debug, Clone)]
pub struct SoulState {
    pub memory: WorkingMemory,
    pub process: ProcessKind,
    pub notes: SoulNotes,
    /// A honk arrived and the soul has not complained about it yet.
    pub heard_honk: bool,
}

impl SoulState {
    pub fn fresh(runtime: &SoulRuntime) -> Self {
        Self {
            memory: runtime.fresh_memory(),
            process: ProcessKind::Initial,
            notes: SoulNotes::initial(runtime.soul_name()),
            heard_honk: false,
        }
    }
}

/// Sending half of a soul's perception queue.
///
/// `closed` is cancelled when the queue is discarded, so perceptions still
/// buffered behind it are dropped instead of run.
#[derive(Debug, Clone)]
struct TurnQueue {
    tx: mpsc::UnboundedSender<Perception>,
    closed: CancellationToken,
}

/// One live conversation.
///
/// The turn lock makes turns single-writer: a second dispatch waits for the
/// first to commit. The state lock is only held to copy or replace state, so
/// reads never wait for a running turn. The token cancels whichever turn is
/// in flight.
#[derive(Debug)]
pub struct SoulSession {
    id: SoulId,
    turn: Mutex<()>,
    state: Mutex<SoulState>,
    cancel: StdMutex<CancellationToken>,
    queue: StdMutex<Option<TurnQueue>>,
}

impl SoulSession {
    pub fn new(id: SoulId, state: SoulState) -> Self {
        Self {
            id,
            turn: Mutex::new(()),
            state: Mutex::new(state),
            cancel: StdMutex::new(CancellationToken::new()),
            queue: StdMutex::new(None),
        }
    }

    pub fn id(&self) -> SoulId {
        self.id
    }

    /// Held for the whole of a turn or a reset.
    pub(crate) async fn lock_turn(&self) -> MutexGuard<'_, ()> {
        self.turn.lock().await
    }

    /// Copy of the last committed state.
    pub async fn committed(&self) -> SoulState {
        self.state.lock().await.clone()
    }

    pub(crate) async fn commit(&self, state: SoulState) {
        *self.state.lock().await = state;
    }

    /// Token for the turn about to start.
    pub(crate) fn turn_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Queue a perception behind earlier ones. The first perception after
    /// creation or a reset opens a fresh queue and hands its receiving half
    /// to `start`.
    pub(crate) fn enqueue(
        &self,
        perception: Perception,
        start: impl FnOnce(mpsc::UnboundedReceiver<Perception>, CancellationToken),
    ) {
        let mut queue = self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let perception = match queue.as_ref() {
            Some(open) => match open.tx.send(perception) {
                Ok(()) => return,
                // Worker gone; start another one
                Err(mpsc::error::SendError(perception)) => perception,
            },
            None => perception,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        // The receiver is still held here, so this cannot fail.
        let _ = tx.send(perception);
        start(rx, closed.clone());
        *queue = Some(TurnQueue { tx, closed });
    }

    /// Drop the queue and every perception still waiting in it.
    pub(crate) fn close_queue(&self) {
        let queue = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(queue) = queue {
            queue.closed.cancel();
        }
    }

    /// Cancel the in-flight turn and arm a fresh token for later ones.
    pub(crate) fn cancel_turn(&self) {
        let mut token = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        token.cancel();
        *token = CancellationToken::new();
    }
}
