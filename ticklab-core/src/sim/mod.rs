//! Simulation: an in-process venue, a recording double and the replay
//! driver that connects them to a strategy.

pub mod recording;
pub mod replay;
pub mod venue;

pub use recording::{RecordingRuntime, Submission};
pub use replay::{Replay, ReplaySummary, SimError};
pub use venue::{SimVenue, VenueEvent, VenueStats};
