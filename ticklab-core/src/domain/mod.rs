//! Domain types for the ticklab kernel.

pub mod ids;
pub mod instrument;
pub mod order;
pub mod tick;

pub use ids::LocalId;
pub use instrument::{InstrumentError, InstrumentInfo};
pub use order::{OrderAck, OrderUpdate, Side, TradeReport};
pub use tick::{BookLevel, Tick, TickError, MAX_BOOK_LEVELS};
