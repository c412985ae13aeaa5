use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::events::{EventReason, ReconcileEvent, Subscribe};

/// Subscriber that keeps every event in memory.
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<ReconcileEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReconcileEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn reasons(&self) -> Vec<EventReason> {
        self.events().into_iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl Subscribe for EventCollector {
    async fn on_event(&self, event: &ReconcileEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
