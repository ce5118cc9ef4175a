//! Inbound byte accumulator and single-slot reply correlator
//!
//! Every chunk read from the printer is appended to an ordered buffer, then
//! the pending wait (if any) is resolved. Both happen under one lock, so a
//! resolved waiter always sees the bytes that woke it.
//!
//! At most one wait is outstanding: a second caller joins the existing one
//! and is woken by the same arrival.
//!
//! Once closed, new waits resolve with `Closed` immediately until the inbox
//! is reopened for the next connection.

use futures::future::{FutureExt, Shared};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::trace;

/// Why a wait completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// New bytes were appended to the buffer
    Data,
    /// The connection was torn down first
    Closed,
}

enum Slot {
    Empty,
    Pending {
        tx: oneshot::Sender<Wake>,
        rx: Shared<oneshot::Receiver<Wake>>,
    },
}

struct InboxState {
    buffer: Vec<u8>,
    slot: Slot,
    open: bool,
}

pub(crate) struct Inbox {
    state: Mutex<InboxState>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(InboxState {
                buffer: Vec::new(),
                slot: Slot::Empty,
                open: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the next inbound chunk, joining the pending wait if there is one
    pub(crate) fn wait(&self) -> impl Future<Output = Wake> + Send + 'static {
        let mut guard = self.lock();
        let state = &mut *guard;
        let rx = if !state.open {
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(Wake::Closed);
            rx.shared()
        } else if let Slot::Pending { rx, .. } = &state.slot {
            rx.clone()
        } else {
            let (tx, rx) = oneshot::channel();
            let rx = rx.shared();
            state.slot = Slot::Pending { tx, rx: rx.clone() };
            rx
        };
        // A dropped sender means the inbox itself is gone
        async move { rx.await.unwrap_or(Wake::Closed) }
    }

    /// Append a chunk received from the printer, then wake the pending wait
    ///
    /// Never blocks on the reader and never fails; bytes are not interpreted.
    pub(crate) fn push(&self, chunk: &[u8]) {
        let mut state = self.lock();
        state.buffer.extend_from_slice(chunk);
        trace!(len = chunk.len(), total = state.buffer.len(), "inbound bytes");
        Self::resolve(&mut state, Wake::Data);
    }

    /// Drop buffered input and close
    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        state.buffer.clear();
        state.open = false;
        Self::resolve(&mut state, Wake::Closed);
    }

    /// Release any pending wait with `Closed` and refuse new ones, keeping
    /// buffered input
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.open = false;
        Self::resolve(&mut state, Wake::Closed);
    }

    /// Release the pending wait with `Closed` when its request never went out
    pub(crate) fn cancel(&self) {
        Self::resolve(&mut self.lock(), Wake::Closed);
    }

    /// Accept waits again, for a new connection
    pub(crate) fn reopen(&self) {
        self.lock().open = true;
    }

    fn resolve(state: &mut InboxState, wake: Wake) {
        if let Slot::Pending { tx, .. } = std::mem::replace(&mut state.slot, Slot::Empty) {
            // Receivers may all be gone; the slot is freed either way
            let _ = tx.send(wake);
        }
    }

    pub(crate) fn last_byte(&self) -> Option<u8> {
        self.lock().buffer.last().copied()
    }

    pub(crate) fn snapshot(&self) -> Vec<u8> {
        self.lock().buffer.clone()
    }

    pub(crate) fn is_waiting(&self) -> bool {
        matches!(self.lock().slot, Slot::Pending { .. })
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}
