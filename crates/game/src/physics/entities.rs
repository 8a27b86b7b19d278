use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, is_rightward, wrap_to_pi};
use crate::config::BoardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleMove {
    Up,
    Down,
    Left,
    Right,
}

impl PaddleMove {
    fn delta(&self, speed: f32) -> Vec2 {
        match self {
            PaddleMove::Up => Vec2::new(0.0, -speed),
            PaddleMove::Down => Vec2::new(0.0, speed),
            PaddleMove::Left => Vec2::new(-speed, 0.0),
            PaddleMove::Right => Vec2::new(speed, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    side: Side,
    position: Vec2,
    size: Vec2,
}

impl Paddle {
    pub fn new(side: Side, board: &BoardConfig) -> Self {
        Self {
            side,
            position: Self::start_position(side, board),
            size: Vec2::new(board.paddle_width, board.paddle_height),
        }
    }

    pub fn start_position(side: Side, board: &BoardConfig) -> Vec2 {
        let x = match side {
            Side::Left => board.left_paddle_x,
            Side::Right => board.right_paddle_x,
        };
        Vec2::new(x, (board.height - board.paddle_height) / 2.0)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position(self.position, self.size)
    }

    pub fn center_y(&self) -> f32 {
        self.position.y + self.size.y / 2.0
    }

    pub fn reset(&mut self, board: &BoardConfig) {
        self.position = Self::start_position(self.side, board);
    }

    /// Horizontal range the paddle may occupy: its own half of the board.
    pub fn x_bounds(&self, board: &BoardConfig) -> (f32, f32) {
        match self.side {
            Side::Left => (0.0, board.midline() - self.size.x),
            Side::Right => (board.midline(), board.width - self.size.x),
        }
    }

    pub fn clamp_to_board(&self, position: Vec2, board: &BoardConfig) -> Vec2 {
        let (min_x, max_x) = self.x_bounds(board);
        Vec2::new(
            position.x.clamp(min_x, max_x),
            position.y.clamp(0.0, board.height - self.size.y),
        )
    }

    pub fn place(&mut self, position: Vec2, board: &BoardConfig) {
        self.position = self.clamp_to_board(position, board);
    }

    /// Moves one step unless the ball has left the board. Returns whether the
    /// paddle actually moved.
    pub fn step(&mut self, mv: PaddleMove, speed: f32, board: &BoardConfig, ball_x: f32) -> bool {
        if !(0.0 < ball_x && ball_x < board.width) {
            return false;
        }

        let target = self.clamp_to_board(self.position + mv.delta(speed), board);
        if target == self.position {
            return false;
        }
        self.position = target;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub position: Vec2,
    angle: f32,
    pub speed: f32,
    pub radius: f32,
}

impl Ball {
    pub fn new(position: Vec2, angle: f32, speed: f32, radius: f32) -> Self {
        Self {
            position,
            angle: wrap_to_pi(angle),
            speed,
            radius,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = wrap_to_pi(angle);
    }

    pub fn is_rightward(&self) -> bool {
        is_rightward(self.angle)
    }

    pub fn velocity(&self) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        Vec2::new(cos, sin) * self.speed
    }

    pub fn advance(&mut self) {
        self.position += self.velocity();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u8,
    pub right: u8,
    pub max: u8,
}

impl Score {
    pub fn new(max: u8) -> Self {
        Self {
            left: 0,
            right: 0,
            max,
        }
    }

    /// Credits a point to `side`; no-op once the match is decided.
    pub fn record(&mut self, side: Side) {
        if self.is_finished() {
            return;
        }
        match side {
            Side::Left => self.left += 1,
            Side::Right => self.right += 1,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.left >= self.max || self.right >= self.max
    }

    pub fn winner(&self) -> Option<Side> {
        if self.left >= self.max {
            Some(Side::Left)
        } else if self.right >= self.max {
            Some(Side::Right)
        } else {
            None
        }
    }
}
