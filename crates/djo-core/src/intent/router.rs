use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use djo_model::RecordKind;

use crate::{
    error::CoreError,
    intent::{CeleryHandler, CollectStaticHandler, CreateUserHandler, IntentHandler, MigrateHandler},
};

/// Kind → handler table consulted by the reconciler.
#[derive(Clone, Default)]
pub struct HandlerRouter {
    handlers: BTreeMap<RecordKind, Arc<dyn IntentHandler>>,
}

impl HandlerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with a handler for every kind.
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        register_default_handlers(&mut router);
        router
    }

    /// Register `handler` for its kind. A kind can only be registered once.
    pub fn register(&mut self, handler: Arc<dyn IntentHandler>) -> Result<(), CoreError> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(CoreError::DuplicateHandler(kind));
        }
        debug!(kind = %kind, handler = handler.name(), "registered intent handler");
        self.handlers.insert(kind, handler);
        Ok(())
    }

    pub fn get(&self, kind: RecordKind) -> Option<Arc<dyn IntentHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<RecordKind> {
        self.handlers.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Register the built-in handler of every kind not yet present.
pub fn register_default_handlers(router: &mut HandlerRouter) {
    let defaults: [Arc<dyn IntentHandler>; 4] = [
        Arc::new(MigrateHandler),
        Arc::new(CollectStaticHandler),
        Arc::new(CeleryHandler),
        Arc::new(CreateUserHandler),
    ];
    for handler in defaults {
        if router.get(handler.kind()).is_none() {
            router.handlers.insert(handler.kind(), handler);
        }
    }
}
