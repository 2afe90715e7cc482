//! Inbound message queue.
//!
//! Transports deliver messages on their own threads or callbacks; the match
//! drains them once per frame. The sending half is cheap to clone and `Send`.
//! Once the receiving side closes the queue, pushes are dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::protocol::{Envelope, decode};
use crate::error::ProtocolError;

#[derive(Debug, Default)]
struct Queue {
    messages: VecDeque<Envelope>,
    closed: bool,
}

/// Receiving half, owned by the sync driver.
#[derive(Debug, Default)]
pub struct Inbox {
    inner: Arc<Mutex<Queue>>,
}

/// Sending half, handed to the transport.
#[derive(Debug, Clone)]
pub struct InboxSender {
    inner: Arc<Mutex<Queue>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> InboxSender {
        InboxSender {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Take every queued message in arrival order.
    pub fn drain(&self) -> Vec<Envelope> {
        self.inner.lock().messages.drain(..).collect()
    }

    /// Drop everything queued and refuse further messages. Idempotent.
    pub fn close(&self) {
        let mut queue = self.inner.lock();
        queue.closed = true;
        queue.messages.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().messages.is_empty()
    }
}

impl InboxSender {
    /// Queue a message; dropped if the inbox is closed.
    pub fn push(&self, envelope: Envelope) {
        let mut queue = self.inner.lock();
        if !queue.closed {
            queue.messages.push_back(envelope);
        }
    }

    /// Decode a raw wire message and queue it.
    pub fn push_encoded(&self, data: &str) -> Result<(), ProtocolError> {
        self.push(decode(data)?);
        Ok(())
    }
}
