pub mod batch;
pub mod dispatch;
pub mod queue;

pub use batch::{Batch, BatcherTask};
pub use dispatch::LegacyEvent;
pub use queue::{channel, EventConsumer, EventProducer};
