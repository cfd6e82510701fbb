pub mod messages;
pub mod registry;
pub mod session;

pub use messages::{ClientMessage, ServerMessage};
pub use registry::{ConnectionId, SubscriptionRegistry};
pub use session::nearme_ws;
