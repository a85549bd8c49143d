//! `tradeloom-engine` — the trade-event orchestration engine.
//!
//! One trigger event fans out through the margin, risk and shipping
//! processors into a tree of derived events; the engine folds every settled
//! event into a single [`CompositeEvent`](tradeloom_events::CompositeEvent)
//! and hands it to the publisher exactly once, only after the whole tree
//! has settled.
//!
//! The engine is synchronous, in-memory and lock-free: all per-run state
//! lives in the run itself, so a shared orchestrator serves concurrent runs
//! without interference.

pub mod config;
pub mod orchestrator;
pub mod processor;

pub use config::{BuildError, DEFAULT_EVENT_LIMIT, OrchestratorBuilder};
pub use orchestrator::{
    OrchestrationError, Orchestrator, RunId, RunReport, SHIPPING_COST_MARGIN_ID,
};
pub use processor::{Processor, ProcessorKind, Publisher};
