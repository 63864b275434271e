pub mod client;
pub mod messages;

pub use client::{NatsClient, NatsNavigator};
pub use messages::{ProgressMessage, VerdictMessage};
