//! Query module: the query handle, its callback payloads, and the correlation store.

pub mod events;
mod lifecycle;
mod store;

pub use events::{AnswerEvent, CancelEvent, ErrorEvent, FinishEvent, StartEvent};
pub use lifecycle::Query;
pub use store::CorrelationStore;
