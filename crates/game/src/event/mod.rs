mod queue;
mod types;

pub use queue::DirectiveQueue;
pub use types::{Directive, ScoreScreen, Sound};
