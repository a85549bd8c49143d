use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::EventId;

/// Discriminant of an [`Event`] without its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Trade,
    Shipping,
    Risk,
    Margin,
}

impl EventKind {
    /// Stable lowercase label (e.g. for log fields).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Trade => "trade",
            EventKind::Shipping => "shipping",
            EventKind::Risk => "risk",
            EventKind::Margin => "margin",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event: a trade was booked. The trigger kind; never recorded as a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: EventId,
    /// Notional in smallest currency unit (e.g., cents).
    pub notional: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: shipping was arranged for a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingEvent {
    pub id: EventId,
    /// Shipping cost in smallest currency unit (e.g., cents).
    pub cost: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: risk exposure was calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: EventId,
    /// Exposure in smallest currency unit (e.g., cents).
    pub exposure: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a margin requirement was calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginEvent {
    pub id: EventId,
    /// Margin amount in smallest currency unit (e.g., cents).
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

impl ShippingEvent {
    /// Same shipment with the cost doubled.
    ///
    /// Used when a shipping trigger re-enters dispatch as its own echo; the
    /// derived event keeps the source's id and business time.
    pub fn doubled(&self) -> Self {
        Self {
            id: self.id.clone(),
            cost: self.cost.saturating_mul(2),
            occurred_at: self.occurred_at,
        }
    }
}

impl MarginEvent {
    /// Reinterpret this margin as a shipping cost.
    ///
    /// The margin amount becomes the shipping cost; id and business time
    /// carry over unchanged.
    pub fn to_shipping(&self) -> ShippingEvent {
        ShippingEvent {
            id: self.id.clone(),
            cost: self.amount,
            occurred_at: self.occurred_at,
        }
    }
}

/// A dispatchable event.
///
/// Events are immutable facts; anything "derived" (a doubled cost, a
/// reinterpreted margin) is a new value. Equality is full-value equality
/// over kind, id and payload, which the dispatcher relies on when checking
/// whether a shipping event echoes the tree parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    Trade(TradeEvent),
    Shipping(ShippingEvent),
    Risk(RiskEvent),
    Margin(MarginEvent),
}

impl Event {
    pub fn id(&self) -> &EventId {
        match self {
            Event::Trade(e) => &e.id,
            Event::Shipping(e) => &e.id,
            Event::Risk(e) => &e.id,
            Event::Margin(e) => &e.id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Trade(_) => EventKind::Trade,
            Event::Shipping(_) => EventKind::Shipping,
            Event::Risk(_) => EventKind::Risk,
            Event::Margin(_) => EventKind::Margin,
        }
    }

    /// Stable event name/type identifier (e.g. "shipping").
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// When the event occurred (business time).
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Event::Trade(e) => e.occurred_at,
            Event::Shipping(e) => e.occurred_at,
            Event::Risk(e) => e.occurred_at,
            Event::Margin(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_shipping(id: &str, cost: u64) -> ShippingEvent {
        ShippingEvent {
            id: EventId::from(id),
            cost,
            occurred_at: test_time(),
        }
    }

    #[test]
    fn doubled_shipping_keeps_id_and_doubles_cost() {
        let ship = test_shipping("shipEvt", 250);
        let doubled = ship.doubled();

        assert_eq!(doubled.id, ship.id);
        assert_eq!(doubled.cost, 500);
        assert_eq!(doubled.occurred_at, ship.occurred_at);
    }

    #[test]
    fn margin_reinterprets_as_shipping_with_amount_as_cost() {
        let margin = MarginEvent {
            id: EventId::from("tradeEvt-shipEvt"),
            amount: 320,
            occurred_at: test_time(),
        };

        let ship = margin.to_shipping();
        assert_eq!(ship.id, margin.id);
        assert_eq!(ship.cost, 320);
        assert_eq!(ship.occurred_at, margin.occurred_at);
    }

    #[test]
    fn equality_is_full_value_not_id_alone() {
        let at = test_time();
        let a = Event::Shipping(ShippingEvent {
            id: EventId::from("shipEvt"),
            cost: 100,
            occurred_at: at,
        });
        let b = Event::Shipping(ShippingEvent {
            id: EventId::from("shipEvt"),
            cost: 200,
            occurred_at: at,
        });

        assert_ne!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a, a.clone());
    }

    #[test]
    fn events_of_different_kinds_never_compare_equal() {
        let at = test_time();
        let ship = Event::Shipping(ShippingEvent {
            id: EventId::from("evt"),
            cost: 100,
            occurred_at: at,
        });
        let margin = Event::Margin(MarginEvent {
            id: EventId::from("evt"),
            amount: 100,
            occurred_at: at,
        });

        assert_ne!(ship, margin);
    }

    #[test]
    fn event_type_labels_match_kinds() {
        let trade = Event::Trade(TradeEvent {
            id: EventId::from("tradeEvt"),
            notional: 1_000,
            occurred_at: test_time(),
        });

        assert_eq!(trade.event_type(), "trade");
        assert_eq!(trade.kind(), EventKind::Trade);
        assert_eq!(EventKind::Margin.as_str(), "margin");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let risk = Event::Risk(RiskEvent {
            id: EventId::from("tradeEvt-riskEvt"),
            exposure: 50,
            occurred_at: test_time(),
        });

        let value = serde_json::to_value(&risk).unwrap();
        assert_eq!(value["kind"], "risk");
        assert_eq!(value["id"], "tradeEvt-riskEvt");
        assert_eq!(value["exposure"], 50);
    }
}


