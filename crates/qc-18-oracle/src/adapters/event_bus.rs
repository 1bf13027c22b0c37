//! Event Bus adapter
//!
//! Implements the EventBus port by recording every published event.

use crate::events::OracleEvent;
use crate::ports::EventBus;

/// In-memory event bus adapter for testing
pub struct InMemoryEventBus {
    events: parking_lot::RwLock<Vec<OracleEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<OracleEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, event: OracleEvent) -> Result<(), String> {
        tracing::trace!(kind = event.kind(), "oracle event");
        self.events.write().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_memory_event_bus() {
        let bus = InMemoryEventBus::new();

        let result = bus.publish(OracleEvent::SetFxRate {
            denom: "CHEQ".into(),
            rate: dec!(1.5),
        });

        assert!(result.is_ok());
        assert_eq!(bus.event_count(), 1);
        assert_eq!(bus.get_events()[0].kind(), "set_fx_rate");
    }
}
