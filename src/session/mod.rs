//! Sessions - isolated game tables and the host that runs them

pub mod game;
pub mod host;

pub use game::{AppliedEvent, GameSession, SessionStats, SessionStatus};
pub use host::{BatchReport, SessionHost};
