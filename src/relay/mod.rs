pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::{relay_handler, relay_move};
pub use manager::{ClientId, RoomRelay};
pub use messages::{RelayEvent, RelayMessage};
