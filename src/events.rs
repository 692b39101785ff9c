//! Change-event bus for realtime views.
//!
//! Views like study-hall occupancy follow push-then-refetch: mutations
//! publish a small change event naming the stream and entity, subscribers
//! (the SSE feed) forward it, and clients refetch the affected list. There
//! are no ordering or delivery guarantees; a slow subscriber that lags
//! simply misses events and catches up on its next refetch.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStream {
    StudyHalls,
    Discussions,
}

impl EventStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStream::StudyHalls => "study_halls",
            EventStream::Discussions => "discussions",
        }
    }
}

impl std::str::FromStr for EventStream {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study_halls" => Ok(EventStream::StudyHalls),
            "discussions" => Ok(EventStream::Discussions),
            _ => Err(()),
        }
    }
}

/// What changed. Carries just enough for a client to decide what to
/// refetch, never the changed data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    pub stream: EventStream,
    pub school_id: Uuid,
    pub entity_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publishing with no subscribers is fine; the event just evaporates.
    pub fn publish(&self, event: ChangeEvent) {
        debug!(
            stream = event.stream.as_str(),
            school_id = %event.school_id,
            entity_id = %event.entity_id,
            "Publishing change event"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
