mod clock;
mod frontend;
mod game;

pub use clock::FrameClock;
pub use frontend::{Controls, FrameState, Frontend, InputState, KeySet};
pub use game::{GameSession, Mode, Role, SessionError, SessionOutcome};
