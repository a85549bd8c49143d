use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::id::EventId;

/// The assembled result of one orchestration run.
///
/// One composite exists per run: the trigger event anchors it as the parent
/// (it is never also a child), and every settled derived event is appended
/// as a child in dispatch order. The structure is append-only; children are
/// recorded verbatim with no deduplication or validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeEvent {
    id: EventId,
    parent: Event,
    children: Vec<Event>,
}

impl CompositeEvent {
    /// Anchor a new composite on the run's trigger event.
    pub fn new(parent: Event) -> Self {
        Self {
            id: parent.id().clone(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn parent(&self) -> &Event {
        &self.parent
    }

    /// Children in the order they settled.
    pub fn children(&self) -> &[Event] {
        &self.children
    }

    pub fn add_child(&mut self, event: Event) {
        self.children.push(event);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
