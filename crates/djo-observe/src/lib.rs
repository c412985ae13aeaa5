//! Logging for the operator: subscriber setup and a reconcile-event logger.
mod logger;
pub use logger::*;

mod events;
pub use events::EventLogger;
