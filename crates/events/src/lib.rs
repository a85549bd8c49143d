//! `tradeloom-events` — the event model for trade orchestration.
//!
//! This crate contains **pure data**: the dispatchable event kinds, their
//! identifiers, and the composite tree a run assembles. No dispatch logic
//! lives here; see `tradeloom-engine` for that.

pub mod composite;
pub mod event;
pub mod id;

pub use composite::CompositeEvent;
pub use event::{Event, EventKind, MarginEvent, RiskEvent, ShippingEvent, TradeEvent};
pub use id::EventId;


