//! The unmerged-chunk work queue.
//!
//! Multi-producer/multi-consumer with a close signal: sort workers publish
//! sorted chunks, merge workers claim pairs and feed their results back
//! into the same queue. Consumers suspend on a [`Notify`] instead of
//! spinning; every state change wakes all waiters so each can re-check its
//! own exit condition.
//!
//! Termination works without completion flags. `close` marks the end of
//! the sort stage, and a claimed-but-unpublished merge is tracked in
//! `merges_in_flight`, so "no more work can ever appear" is the observable
//! condition `closed && merges_in_flight == 0 && chunks.len() <= 1`. The
//! single surviving chunk is deliberately left in place: it belongs to the
//! terminal reduction that runs after the pool has drained, never to a
//! pool worker.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::chunk::ChunkHandle;

#[derive(Default)]
struct QueueState {
    chunks: VecDeque<ChunkHandle>,
    merges_in_flight: usize,
    closed: bool,
}

pub struct MergeQueue {
    state: Mutex<QueueState>,
    changed: Notify,
}

impl Default for MergeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            changed: Notify::new(),
        }
    }

    /// Publishes a freshly sorted chunk. Must not be called after
    /// [`close`](Self::close).
    pub fn publish(&self, chunk: ChunkHandle) {
        {
            let mut state = self.state.lock();
            debug_assert!(!state.closed, "publish after close");
            state.chunks.push_back(chunk);
        }
        self.changed.notify_waiters();
    }

    /// Signals that the sort stage has finished: no more sorted chunks
    /// will arrive. Merge results may still re-enter the queue.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.changed.notify_waiters();
    }

    /// Claims the next pair of chunks to merge, FIFO order.
    ///
    /// Suspends while fewer than two chunks are queued but more can still
    /// appear. Returns `None` once the queue is closed, no merge is in
    /// flight and at most one chunk remains.
    pub async fn claim_pair(&self) -> Option<(ChunkHandle, ChunkHandle)> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before inspecting the state so a notification
            // between the check and the await is never lost.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.chunks.len() >= 2 {
                    if let (Some(first), Some(second)) =
                        (state.chunks.pop_front(), state.chunks.pop_front())
                    {
                        state.merges_in_flight += 1;
                        return Some((first, second));
                    }
                }
                if state.closed && state.merges_in_flight == 0 && state.chunks.len() <= 1 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Publishes a merge result and retires the claim it came from.
    pub fn publish_merged(&self, chunk: ChunkHandle) {
        {
            let mut state = self.state.lock();
            state.chunks.push_back(chunk);
            state.merges_in_flight -= 1;
        }
        self.changed.notify_waiters();
    }

    /// Retires a claim whose merge failed, so the remaining workers can
    /// still observe quiescence and exit.
    pub fn abort_claim(&self) {
        {
            let mut state = self.state.lock();
            state.merges_in_flight -= 1;
        }
        self.changed.notify_waiters();
    }

    /// Takes the terminal survivor. Only meaningful after every pool
    /// worker has exited; `None` means the run had no records at all.
    pub fn take_final(&self) -> Option<ChunkHandle> {
        self.state.lock().chunks.pop_front()
    }

    /// Queued chunk count, for the progress monitor.
    pub fn depth(&self) -> usize {
        self.state.lock().chunks.len()
    }
}
