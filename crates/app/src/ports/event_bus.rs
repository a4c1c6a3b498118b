//! Event bus port: publish/subscribe for forum events.

use std::future::Future;

use agora_domain::error::AgoraError;
use agora_domain::event::ForumEvent;

/// Publishes forum events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: ForumEvent) -> impl Future<Output = Result<(), AgoraError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: ForumEvent) -> impl Future<Output = Result<(), AgoraError>> + Send {
        (**self).publish(event)
    }
}
