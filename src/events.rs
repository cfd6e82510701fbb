//! In-process notifications connecting the REST side to the near-me channel.
//!
//! Post creation publishes onto this channel; the live dispatch task is the
//! single consumer. Publishing never blocks the request handler.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostEvent {
    Created { post_id: i32 },
}

/// Cloneable publishing handle.
#[derive(Clone)]
pub struct PostEvents {
    tx: UnboundedSender<PostEvent>,
}

impl PostEvents {
    pub fn channel() -> (Self, UnboundedReceiver<PostEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: PostEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!(?event, "post event dropped: dispatch task not running");
        }
    }
}
