//! The dispatch state machine (application-level orchestration).
//!
//! This module drives one trigger event through the margin/risk/shipping
//! processors until the whole tree of derived events has settled, then hands
//! the assembled [`CompositeEvent`] to the publisher.
//!
//! ## Run Lifecycle
//!
//! ```text
//! Trigger
//!   ↓
//! 1. Anchor a fresh composite on the trigger (trigger = parent)
//!   ↓
//! 2. Pop the next event from the work queue and apply the dispatch rules
//!   ↓
//! 3. Enqueue whatever the invoked processors derived
//!   ↓
//! 4. Repeat until the queue drains
//!   ↓
//! 5. Publish the composite (pending must be exactly zero)
//! ```
//!
//! ## Dispatch Rules
//!
//! One exhaustive match, per event kind:
//!
//! - **Trade**: pending += 3, then risk, shipping and margin are each
//!   invoked with the trade event. The trigger is the tree parent and is
//!   never folded as a child.
//! - **Shipping, not the parent**: folded as a child, then pending += 2 and
//!   risk and margin are invoked with it.
//! - **Shipping, equal to the stored parent** (full value, not id alone): a
//!   new shipping event with the cost doubled is built; pending += 2 and
//!   risk and margin are invoked with the doubled event. The doubled event
//!   itself is never queued and never folded.
//! - **Margin with the sentinel id** ([`SHIPPING_COST_MARGIN_ID`]): the
//!   margin amount is reinterpreted as a shipping cost; the reinterpreted
//!   shipping event is folded, then pending += 2 and risk and margin are
//!   invoked with it.
//! - **Margin, any other id**: folded; terminal.
//! - **Risk**: folded; terminal, never dispatched further.
//!
//! ## The Pending Counter
//!
//! `pending` counts processor invocations whose derived events have not yet
//! folded back into the composite. Increments happen as a batch before the
//! invocations they cover, so the counter can never reach zero while
//! derived events are still owed. Decrements are checked: an underflow
//! (folding more than was dispatched) fails the run instead of corrupting
//! the counter, and a drained queue with pending > 0 is reported as a
//! stalled run rather than hanging silently.
//!
//! ## Concurrency
//!
//! `dispatch` borrows the orchestrator immutably and keeps all run state in
//! a per-run [`RunState`], so one orchestrator behind an `Arc` serves
//! overlapping runs from many threads without locks and without any chance
//! of two runs sharing a tree.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace};
use uuid::Uuid;

use tradeloom_events::{CompositeEvent, Event, EventId};

use crate::processor::{Processor, ProcessorKind, Publisher};

/// Margin events carrying this exact id are recorded as shipping cost.
///
/// The margin slot reports the cost of a shipment by echoing the shipment's
/// id; the dispatcher reinterprets such an event as shipping (the margin
/// amount becomes the cost) instead of folding it as margin.
pub const SHIPPING_COST_MARGIN_ID: &str = "tradeEvt-shipEvt";

/// Identifier of a single orchestration run (UUIDv7, time-ordered).
///
/// Purely for log correlation; no dispatch decision reads it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    /// Events popped from the work queue, trigger included.
    pub dispatches: usize,
    /// Events folded into the composite as children.
    pub folded: usize,
}

/// Failure of a single orchestration run.
///
/// Every variant is fatal to its run: nothing is published, and the
/// orchestrator itself carries no state over to the next run.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A processor returned an error; the run is aborted.
    #[error("{kind} processor failed on event {id}")]
    Processor {
        kind: ProcessorKind,
        id: EventId,
        #[source]
        source: anyhow::Error,
    },

    /// The publisher rejected the finished composite.
    #[error("publishing composite {id} failed")]
    Publish {
        id: EventId,
        #[source]
        source: anyhow::Error,
    },

    /// More events folded than were dispatched (e.g. a risk or margin
    /// event arrived as the trigger, or a processor emitted extras).
    #[error("pending count underflow folding event {id}")]
    PendingUnderflow { id: EventId },

    /// The queue drained while derived events were still owed.
    #[error("run stalled with {pending} derived events still pending")]
    StalledRun { pending: u32 },

    /// The per-run dispatch budget was exhausted (runaway derivation).
    #[error("event limit {limit} exceeded in one run")]
    EventLimitExceeded { limit: usize },
}

/// Coordinates the processors and the publisher for trade-event trees.
///
/// Built via [`Orchestrator::builder`]; all slots are non-optional once
/// built. `dispatch` may be called repeatedly and from multiple threads.
pub struct Orchestrator {
    margin: Arc<dyn Processor>,
    risk: Arc<dyn Processor>,
    shipping: Arc<dyn Processor>,
    publisher: Arc<dyn Publisher>,
    event_limit: usize,
}

impl Orchestrator {
    pub(crate) fn new(
        margin: Arc<dyn Processor>,
        risk: Arc<dyn Processor>,
        shipping: Arc<dyn Processor>,
        publisher: Arc<dyn Publisher>,
        event_limit: usize,
    ) -> Self {
        Self {
            margin,
            risk,
            shipping,
            publisher,
            event_limit,
        }
    }

    pub fn builder() -> crate::config::OrchestratorBuilder {
        crate::config::OrchestratorBuilder::new()
    }

    /// Drive one trigger event to a published composite.
    ///
    /// Runs the work queue to completion, then publishes exactly once if
    /// and only if the pending counter is back to zero. On any error the
    /// publisher is not called and the partial tree is discarded.
    pub fn dispatch(&self, trigger: Event) -> Result<RunReport, OrchestrationError> {
        let run_id = RunId::new();
        let span = tracing::debug_span!(
            "dispatch",
            run_id = %run_id,
            trigger_kind = trigger.event_type(),
            trigger_id = %trigger.id(),
        );
        let _span = span.entered();

        let mut state = RunState::new(trigger);

        // Trampoline: derived events queue here instead of re-entering
        // receive on the stack.
        while let Some(event) = state.queue.pop_front() {
            if state.dispatches == self.event_limit {
                return Err(OrchestrationError::EventLimitExceeded {
                    limit: self.event_limit,
                });
            }
            state.dispatches += 1;

            trace!(
                kind = event.event_type(),
                id = %event.id(),
                pending = state.pending,
                queued = state.queue.len(),
                "event received"
            );
            self.receive(&mut state, event)?;
        }

        // Queue drained: every dispatched invocation must have folded back.
        if state.pending != 0 {
            return Err(OrchestrationError::StalledRun {
                pending: state.pending,
            });
        }

        let RunState {
            composite,
            dispatches,
            folded,
            ..
        } = state;
        let id = composite.id().clone();
        let children = composite.len();

        // Single publication site; a successful run publishes exactly once.
        self.publisher
            .publish(composite)
            .map_err(|source| OrchestrationError::Publish { id, source })?;
        info!(children, dispatches, "composite published");

        Ok(RunReport {
            run_id,
            dispatches,
            folded,
        })
    }

    /// Apply the dispatch rules to one event.
    fn receive(&self, state: &mut RunState, event: Event) -> Result<(), OrchestrationError> {
        match &event {
            Event::Trade(_) => {
                state.pending += 3;
                self.invoke(state, ProcessorKind::Risk, &event)?;
                self.invoke(state, ProcessorKind::Shipping, &event)?;
                self.invoke(state, ProcessorKind::Margin, &event)?;
            }
            Event::Shipping(ship) => {
                if event == *state.composite.parent() {
                    // Parent echo: dispatch a doubled-cost copy. The doubled
                    // event never enters the queue and never folds; only its
                    // derivatives do.
                    let doubled = Event::Shipping(ship.doubled());
                    debug!(id = %ship.id, "parent echo; dispatching doubled shipping cost");

                    state.pending += 2;
                    self.invoke(state, ProcessorKind::Risk, &doubled)?;
                    self.invoke(state, ProcessorKind::Margin, &doubled)?;
                } else {
                    state.fold(event.clone())?;

                    state.pending += 2;
                    self.invoke(state, ProcessorKind::Risk, &event)?;
                    self.invoke(state, ProcessorKind::Margin, &event)?;
                }
            }
            Event::Margin(margin) => {
                if margin.id.as_str() == SHIPPING_COST_MARGIN_ID {
                    // Recorded and re-dispatched as shipping, never as margin.
                    let reclassified = Event::Shipping(margin.to_shipping());
                    debug!(id = %margin.id, "reclassifying margin as shipping cost");

                    state.fold(reclassified.clone())?;

                    state.pending += 2;
                    self.invoke(state, ProcessorKind::Risk, &reclassified)?;
                    self.invoke(state, ProcessorKind::Margin, &reclassified)?;
                } else {
                    state.fold(event.clone())?;
                }
            }
            Event::Risk(_) => {
                state.fold(event.clone())?;
            }
        }

        Ok(())
    }

    /// Hand `event` to one processor and queue whatever it derives.
    fn invoke(
        &self,
        state: &mut RunState,
        kind: ProcessorKind,
        event: &Event,
    ) -> Result<(), OrchestrationError> {
        let derived = self
            .processor(kind)
            .process(event)
            .map_err(|source| OrchestrationError::Processor {
                kind,
                id: event.id().clone(),
                source,
            })?;

        trace!(
            processor = %kind,
            id = %event.id(),
            derived = derived.len(),
            "processor invoked"
        );
        state.queue.extend(derived);
        Ok(())
    }

    fn processor(&self, kind: ProcessorKind) -> &dyn Processor {
        match kind {
            ProcessorKind::Margin => self.margin.as_ref(),
            ProcessorKind::Risk => self.risk.as_ref(),
            ProcessorKind::Shipping => self.shipping.as_ref(),
        }
    }
}

// Manual impl: the processor/publisher slots are trait objects without a
// `Debug` bound, so the derive cannot apply.
impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("event_limit", &self.event_limit)
            .finish_non_exhaustive()
    }
}

/// Mutable state of one run.
///
/// Created fresh per `dispatch` call and dropped at its end; runs share
/// nothing through the orchestrator.
struct RunState {
    composite: CompositeEvent,
    queue: VecDeque<Event>,
    /// Processor invocations whose derived events have not yet folded back.
    pending: u32,
    dispatches: usize,
    folded: usize,
}

impl RunState {
    fn new(trigger: Event) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(trigger.clone());

        Self {
            composite: CompositeEvent::new(trigger),
            queue,
            pending: 0,
            dispatches: 0,
            folded: 0,
        }
    }

    /// Settle a terminal event into the composite.
    fn fold(&mut self, event: Event) -> Result<(), OrchestrationError> {
        self.pending = self
            .pending
            .checked_sub(1)
            .ok_or_else(|| OrchestrationError::PendingUnderflow {
                id: event.id().clone(),
            })?;
        self.folded += 1;

        trace!(
            kind = event.event_type(),
            id = %event.id(),
            pending = self.pending,
            "folded into composite"
        );
        self.composite.add_child(event);
        Ok(())
    }
}
