//! Demo binary: wires the orchestrator to stand-in desk processors and
//! prints every published composite as JSON.
//!
//! Run with `RUST_LOG=debug` (or `RUST_LOG=tradeloom_engine=trace`) to watch
//! the dispatch decisions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use tradeloom_engine::{Orchestrator, Processor, ProcessorKind, Publisher};
use tradeloom_events::{
    CompositeEvent, Event, EventId, MarginEvent, RiskEvent, ShippingEvent, TradeEvent,
};

fn value_of(event: &Event) -> u64 {
    match event {
        Event::Trade(e) => e.notional,
        Event::Shipping(e) => e.cost,
        Event::Risk(e) => e.exposure,
        Event::Margin(e) => e.amount,
    }
}

/// Risk desk: half the event's value as exposure.
struct RiskDesk;

impl Processor for RiskDesk {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Risk
    }

    fn process(&self, event: &Event) -> anyhow::Result<Vec<Event>> {
        Ok(vec![Event::Risk(RiskEvent {
            id: EventId::from(format!("{}-riskEvt", event.id())),
            exposure: value_of(event) / 2,
            occurred_at: event.occurred_at(),
        })])
    }
}

/// Shipping desk: a tenth of the event's value as freight cost.
struct ShippingDesk;

impl Processor for ShippingDesk {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Shipping
    }

    fn process(&self, event: &Event) -> anyhow::Result<Vec<Event>> {
        Ok(vec![Event::Shipping(ShippingEvent {
            id: EventId::from(format!("{}-shipEvt", event.id())),
            cost: value_of(event) / 10,
            occurred_at: event.occurred_at(),
        })])
    }
}

/// Margin desk: books the first shipment's cost by echoing the shipment id
/// (the dispatcher then records it as shipping cost), and otherwise derives
/// a margin requirement of a twentieth of the value.
struct MarginDesk {
    cost_booked: AtomicBool,
}

impl MarginDesk {
    fn new() -> Self {
        Self {
            cost_booked: AtomicBool::new(false),
        }
    }
}

impl Processor for MarginDesk {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Margin
    }

    fn process(&self, event: &Event) -> anyhow::Result<Vec<Event>> {
        if let Event::Shipping(ship) = event {
            if !self.cost_booked.swap(true, Ordering::SeqCst) {
                return Ok(vec![Event::Margin(MarginEvent {
                    id: ship.id.clone(),
                    amount: ship.cost,
                    occurred_at: ship.occurred_at,
                })]);
            }
        }
        Ok(vec![Event::Margin(MarginEvent {
            id: EventId::from(format!("{}-marginEvt", event.id())),
            amount: value_of(event) / 20,
            occurred_at: event.occurred_at(),
        })])
    }
}

/// Prints each finished composite as pretty JSON.
struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    fn publish(&self, composite: CompositeEvent) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(&composite)?);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tradeloom_observability::init();

    let orchestrator = Orchestrator::builder()
        .register(Arc::new(RiskDesk))?
        .register(Arc::new(ShippingDesk))?
        .register(Arc::new(MarginDesk::new()))?
        .publisher(Arc::new(StdoutPublisher))
        .build()?;

    // A booked trade fans out into risk, shipping and margin; the margin
    // desk echoes the shipment cost, which settles as a shipping child.
    let trade = Event::Trade(TradeEvent {
        id: EventId::from("tradeEvt"),
        notional: 250_000,
        occurred_at: Utc::now(),
    });
    let report = orchestrator.dispatch(trade)?;
    tracing::info!(
        run_id = %report.run_id,
        dispatches = report.dispatches,
        folded = report.folded,
        "trade run settled"
    );

    // A shipping trigger echoes the tree parent, so the desks price the
    // doubled cost while the published parent keeps the original.
    let shipment = Event::Shipping(ShippingEvent {
        id: EventId::from("shipEvt"),
        cost: 1_800,
        occurred_at: Utc::now(),
    });
    let report = orchestrator.dispatch(shipment)?;
    tracing::info!(
        run_id = %report.run_id,
        dispatches = report.dispatches,
        folded = report.folded,
        "shipping run settled"
    );

    Ok(())
}


