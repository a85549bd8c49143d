//! Processing/publishing capabilities the orchestrator composes.
//!
//! The engine owns no domain logic of its own. Margin, risk and shipping
//! calculations live behind the [`Processor`] trait, and the finished
//! composite leaves the engine through the [`Publisher`] trait. Both are
//! object-safe and `Send + Sync`, so one orchestrator instance can be
//! shared across threads.

use std::sync::Arc;

use tradeloom_events::{CompositeEvent, Event};

/// The slot a processor occupies in the orchestrator.
///
/// Registration inspects this, and the dispatch rules address processors by
/// it: a trade event is handed to all three slots, shipping and reclassified
/// margin events to risk and margin only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Margin,
    Risk,
    Shipping,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Margin => "margin",
            ProcessorKind::Risk => "risk",
            ProcessorKind::Shipping => "shipping",
        }
    }
}

impl core::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain calculation step.
///
/// Processors are pure with respect to the engine: they receive an event
/// and **return** whatever derived events it produces instead of calling
/// back into the dispatcher. The engine enqueues the returned events and
/// feeds them through the same dispatch rules, so a processor never needs
/// a handle to the orchestrator and cannot re-enter it.
///
/// Returning an empty `Vec` is valid (the step derived nothing). An `Err`
/// aborts the whole run; nothing is published.
pub trait Processor: Send + Sync {
    /// Which slot this instance fills.
    fn kind(&self) -> ProcessorKind;

    /// Derive zero or more events from `event`.
    fn process(&self, event: &Event) -> anyhow::Result<Vec<Event>>;
}

/// Terminal sink for a finished composite.
///
/// Invoked exactly once per successful run, after every derived event has
/// settled into the tree. An `Err` fails the run; the engine never retries
/// or re-publishes.
pub trait Publisher: Send + Sync {
    fn publish(&self, composite: CompositeEvent) -> anyhow::Result<()>;
}

impl<P> Processor for Arc<P>
where
    P: Processor + ?Sized,
{
    fn kind(&self) -> ProcessorKind {
        (**self).kind()
    }

    fn process(&self, event: &Event) -> anyhow::Result<Vec<Event>> {
        (**self).process(event)
    }
}

impl<P> Publisher for Arc<P>
where
    P: Publisher + ?Sized,
{
    fn publish(&self, composite: CompositeEvent) -> anyhow::Result<()> {
        (**self).publish(composite)
    }
}


