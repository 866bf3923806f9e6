// ABOUTME: Bounded per-connection outbound frame queue with drop-oldest-inbox overflow policy
// ABOUTME: A plain mpsc channel cannot evict a specific queued item, so this uses a guarded deque

use crate::codec::{Frame, Opcode};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Outbound frame queue for one connection.
///
/// Bounded at `capacity` frames. On overflow, the oldest `INBOX` frame is
/// evicted to make room, so a slow or idle reader never causes a pending
/// reply to be dropped (§5 resource policy).
pub struct SendQueue {
    inner: Mutex<VecDeque<Frame>>,
    notify: Notify,
    capacity: usize,
}

impl SendQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(SendQueue {
            inner: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity,
        })
    }

    pub async fn push(&self, frame: Frame) {
        let mut guard = self.inner.lock().await;
        if guard.len() >= self.capacity {
            if let Some(pos) = guard.iter().position(|f| f.opcode == Opcode::Inbox as u32) {
                guard.remove(pos);
                tracing::warn!("send queue full, dropped oldest inbox frame");
            } else {
                guard.pop_front();
                tracing::warn!("send queue full, dropped oldest frame");
            }
        }
        guard.push_back(frame);
        drop(guard);
        self.notify.notify_one();
    }

    /// Waits for and removes the next frame to send.
    pub async fn pop(&self) -> Frame {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(frame) = guard.pop_front() {
                    return frame;
                }
            }
            self.notify.notified().await;
        }
    }
}
