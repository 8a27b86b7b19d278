mod engine;
mod entities;
mod geometry;

pub use engine::{PhysicsEngine, StepEvents};
pub use entities::{Ball, Paddle, PaddleMove, Score, Side};
pub use geometry::{Rect, is_rightward, rounded_rect_circle_contact, wrap_to_pi};
