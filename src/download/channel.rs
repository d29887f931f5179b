//! Progress Channel
//!
//! Ordered queue from the active worker to the single consumer. Sending never
//! blocks: when the consumer falls behind, consecutive `DownloadProgress`
//! events of the same generation collapse into the latest one. Every other
//! event is queued as-is.

use super::events::{Envelope, ProgressEvent};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<VecDeque<Envelope>>,
    notify: Notify,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Envelope>> {
        // A panicking producer cannot leave the queue half-updated
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Consumer end; also mints generation-bound senders
#[derive(Debug, Default)]
pub struct ProgressChannel {
    shared: Arc<Shared>,
}

/// Producer end bound to one worker generation
#[derive(Debug, Clone)]
pub struct ProgressSender {
    generation: u64,
    shared: Arc<Shared>,
}

impl ProgressSender {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues an event without blocking
    pub fn send(&self, event: ProgressEvent) {
        {
            let mut queue = self.shared.queue();
            let coalesce = event.is_progress()
                && queue
                    .back()
                    .is_some_and(|last| last.generation == self.generation && last.event.is_progress());
            if coalesce {
                if let Some(last) = queue.back_mut() {
                    last.event = event;
                }
            } else {
                queue.push_back(Envelope {
                    generation: self.generation,
                    event,
                });
            }
        }
        self.shared.notify.notify_one();
    }
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self, generation: u64) -> ProgressSender {
        ProgressSender {
            generation,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Takes everything queued so far, in order
    pub fn drain(&self) -> Vec<Envelope> {
        self.shared.queue().drain(..).collect()
    }

    pub fn try_recv(&self) -> Option<Envelope> {
        self.shared.queue().pop_front()
    }

    /// Waits for the next event
    pub async fn recv(&self) -> Envelope {
        loop {
            let notified = self.shared.notify.notified();
            if let Some(envelope) = self.try_recv() {
                return envelope;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
