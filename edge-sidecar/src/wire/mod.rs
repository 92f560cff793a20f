pub mod codec;
pub mod event;
pub mod proto;

pub use event::{Event, EventPayload, EventType, Source};
