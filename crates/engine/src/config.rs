//! Orchestrator construction.
//!
//! An orchestrator is only obtainable through [`OrchestratorBuilder`], which
//! validates the full configuration up front: every processor slot filled
//! exactly once, a publisher bound, a dispatch budget set. A built
//! orchestrator therefore has no partially-initialized state, and a missing
//! processor is a build-time error rather than a mid-run surprise.

use std::sync::Arc;

use thiserror::Error;

use crate::orchestrator::Orchestrator;
use crate::processor::{Processor, ProcessorKind, Publisher};

/// Default per-run dispatch budget.
///
/// Generous for well-behaved processor sets (a typical trade run settles in
/// single digits); a run that reaches it is looping.
pub const DEFAULT_EVENT_LIMIT: usize = 10_000;

/// Configuration error raised while building an [`Orchestrator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A processor was registered for a slot that is already filled.
    #[error("a {0} processor is already registered")]
    DuplicateProcessor(ProcessorKind),

    /// A processor slot was left empty.
    #[error("no {0} processor registered")]
    MissingProcessor(ProcessorKind),

    /// No publisher was configured.
    #[error("no publisher configured")]
    MissingPublisher,
}

/// Builder for [`Orchestrator`].
///
/// Slots are addressed by each processor's own [`ProcessorKind`];
/// registering the same slot twice is rejected rather than silently
/// replacing the earlier instance.
pub struct OrchestratorBuilder {
    margin: Option<Arc<dyn Processor>>,
    risk: Option<Arc<dyn Processor>>,
    shipping: Option<Arc<dyn Processor>>,
    publisher: Option<Arc<dyn Publisher>>,
    event_limit: usize,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            margin: None,
            risk: None,
            shipping: None,
            publisher: None,
            event_limit: DEFAULT_EVENT_LIMIT,
        }
    }

    /// Fill the slot named by `processor.kind()`.
    pub fn register(mut self, processor: Arc<dyn Processor>) -> Result<Self, BuildError> {
        let kind = processor.kind();
        let slot = match kind {
            ProcessorKind::Margin => &mut self.margin,
            ProcessorKind::Risk => &mut self.risk,
            ProcessorKind::Shipping => &mut self.shipping,
        };

        if slot.is_some() {
            return Err(BuildError::DuplicateProcessor(kind));
        }
        *slot = Some(processor);
        Ok(self)
    }

    /// Bind the sink that receives each run's finished composite.
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Cap the number of events a single run may dispatch.
    pub fn event_limit(mut self, limit: usize) -> Self {
        self.event_limit = limit;
        self
    }

    /// Validate the configuration and produce a ready orchestrator.
    pub fn build(self) -> Result<Orchestrator, BuildError> {
        let margin = self
            .margin
            .ok_or(BuildError::MissingProcessor(ProcessorKind::Margin))?;
        let risk = self
            .risk
            .ok_or(BuildError::MissingProcessor(ProcessorKind::Risk))?;
        let shipping = self
            .shipping
            .ok_or(BuildError::MissingProcessor(ProcessorKind::Shipping))?;
        let publisher = self.publisher.ok_or(BuildError::MissingPublisher)?;

        Ok(Orchestrator::new(
            margin,
            risk,
            shipping,
            publisher,
            self.event_limit,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: the processor/publisher slots are trait objects without a
// `Debug` bound, so the derive cannot apply.
impl core::fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("margin", &self.margin.is_some())
            .field("risk", &self.risk.is_some())
            .field("shipping", &self.shipping.is_some())
            .field("publisher", &self.publisher.is_some())
            .field("event_limit", &self.event_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tradeloom_events::{CompositeEvent, Event};

    use super::*;

    struct NullProcessor(ProcessorKind);

    impl Processor for NullProcessor {
        fn kind(&self) -> ProcessorKind {
            self.0
        }

        fn process(&self, _event: &Event) -> anyhow::Result<Vec<Event>> {
            Ok(Vec::new())
        }
    }

    struct NullPublisher;

    impl Publisher for NullPublisher {
        fn publish(&self, _composite: CompositeEvent) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn full_builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
            .register(Arc::new(NullProcessor(ProcessorKind::Margin)))
            .unwrap()
            .register(Arc::new(NullProcessor(ProcessorKind::Risk)))
            .unwrap()
            .register(Arc::new(NullProcessor(ProcessorKind::Shipping)))
            .unwrap()
            .publisher(Arc::new(NullPublisher))
    }

    #[test]
    fn build_succeeds_with_all_slots_filled() {
        assert!(full_builder().build().is_ok());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let err = full_builder()
            .register(Arc::new(NullProcessor(ProcessorKind::Risk)))
            .unwrap_err();

        assert_eq!(err, BuildError::DuplicateProcessor(ProcessorKind::Risk));
    }

    #[test]
    fn missing_processor_fails_build() {
        let err = OrchestratorBuilder::new()
            .register(Arc::new(NullProcessor(ProcessorKind::Margin)))
            .unwrap()
            .register(Arc::new(NullProcessor(ProcessorKind::Risk)))
            .unwrap()
            .publisher(Arc::new(NullPublisher))
            .build()
            .unwrap_err();

        assert_eq!(err, BuildError::MissingProcessor(ProcessorKind::Shipping));
    }

    #[test]
    fn missing_publisher_fails_build() {
        let err = OrchestratorBuilder::new()
            .register(Arc::new(NullProcessor(ProcessorKind::Margin)))
            .unwrap()
            .register(Arc::new(NullProcessor(ProcessorKind::Risk)))
            .unwrap()
            .register(Arc::new(NullProcessor(ProcessorKind::Shipping)))
            .unwrap()
            .build()
            .unwrap_err();

        assert_eq!(err, BuildError::MissingPublisher);
    }

    #[test]
    fn error_messages_name_the_slot() {
        let err = BuildError::MissingProcessor(ProcessorKind::Margin);
        assert_eq!(err.to_string(), "no margin processor registered");

        let err = BuildError::DuplicateProcessor(ProcessorKind::Shipping);
        assert_eq!(err.to_string(), "a shipping processor is already registered");
    }
}


