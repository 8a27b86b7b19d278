use glam::Vec2;

use crate::config::BoardConfig;
use crate::event::{ScoreScreen, Sound};
use crate::physics::{Ball, Paddle, PaddleMove, Rect, Score};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeySet: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const W = 1 << 4;
        const S = 1 << 5;
        const A = 1 << 6;
        const D = 1 << 7;
    }
}

/// Which keys steer a paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controls {
    Arrows,
    Wasd,
}

impl Controls {
    /// One move per tick; up wins over down, down over left, left over right.
    pub fn paddle_move(&self, keys: KeySet) -> Option<PaddleMove> {
        let [up, down, left, right] = match self {
            Controls::Arrows => [KeySet::UP, KeySet::DOWN, KeySet::LEFT, KeySet::RIGHT],
            Controls::Wasd => [KeySet::W, KeySet::S, KeySet::A, KeySet::D],
        };
        [
            (up, PaddleMove::Up),
            (down, PaddleMove::Down),
            (left, PaddleMove::Left),
            (right, PaddleMove::Right),
        ]
        .into_iter()
        .find(|(key, _)| keys.contains(*key))
        .map(|(_, mv)| mv)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub keys: KeySet,
    pub quit: bool,
    pub pause: bool,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub board: Vec2,
    pub ball: Vec2,
    pub ball_radius: f32,
    pub left: Rect,
    pub right: Rect,
    pub score: Score,
}

impl FrameState {
    pub fn new(board: &BoardConfig, ball: &Ball, left: &Paddle, right: &Paddle, score: Score) -> Self {
        Self {
            board: Vec2::new(board.width, board.height),
            ball: ball.position,
            ball_radius: ball.radius,
            left: left.rect(),
            right: right.rect(),
            score,
        }
    }
}

/// Rendering, audio and input as seen by a running session.
pub trait Frontend {
    fn render_frame(&mut self, frame: &FrameState);

    fn play_sound(&mut self, sound: Sound);

    fn poll_input(&mut self) -> InputState;

    /// Shows a score or pause screen. Returns false if the player quit.
    fn show_score_screen(&mut self, screen: ScoreScreen, score: &Score) -> bool;
}
