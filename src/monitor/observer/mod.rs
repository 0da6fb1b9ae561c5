pub mod api;
pub mod scripted;

pub use api::{EventSink, ObservationService, SubscriptionHandle};
pub use scripted::ScriptedObserver;

#[cfg(test)]
mod tests;
