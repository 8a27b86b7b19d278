use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::entities::{Ball, Paddle, PaddleMove, Side};
use super::geometry::{rounded_rect_circle_contact, wrap_to_pi};
use crate::config::{BoardConfig, Difficulty};

/// Upper bound of the Easy opponent's reaction threshold.
const EASY_MAX_DISTANCE_RATIO: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    pub wall_hit: bool,
    pub paddle_hit: bool,
    pub scored: Option<Side>,
}

pub struct PhysicsEngine {
    board: BoardConfig,
    ball: Ball,
    left: Paddle,
    right: Paddle,
    touching_wall: bool,
    touching_paddle: bool,
    difficulty: Option<Difficulty>,
    min_distance_ratio: f32,
    rng: StdRng,
}

impl PhysicsEngine {
    /// `difficulty` drives the right paddle as a scripted opponent; `None`
    /// leaves both paddles to the caller.
    pub fn new(board: &BoardConfig, difficulty: Option<Difficulty>) -> Self {
        Self::with_rng(board, difficulty, StdRng::from_entropy())
    }

    pub fn with_seed(board: &BoardConfig, difficulty: Option<Difficulty>, seed: u64) -> Self {
        Self::with_rng(board, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(board: &BoardConfig, difficulty: Option<Difficulty>, mut rng: StdRng) -> Self {
        let ball = Self::serve(board, &mut rng);
        Self {
            board: *board,
            ball,
            left: Paddle::new(Side::Left, board),
            right: Paddle::new(Side::Right, board),
            touching_wall: false,
            touching_paddle: false,
            difficulty,
            min_distance_ratio: 0.0,
            rng,
        }
    }

    fn serve(board: &BoardConfig, rng: &mut StdRng) -> Ball {
        let quadrant = rng.gen_range(0..4u8);
        let angle = FRAC_PI_4 + f32::from(quadrant) * FRAC_PI_2;
        Ball::new(
            board.center(),
            angle,
            board.ball_start_speed,
            board.ball_radius,
        )
    }

    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn move_paddle(&mut self, side: Side, mv: PaddleMove) -> bool {
        let speed = self.board.paddle_speed;
        self.move_paddle_at(side, mv, speed)
    }

    fn move_paddle_at(&mut self, side: Side, mv: PaddleMove, speed: f32) -> bool {
        let board = self.board;
        let ball_x = self.ball.position.x;
        self.paddle_mut(side).step(mv, speed, &board, ball_x)
    }

    /// Positions a paddle from an authoritative source, clamped to its half.
    pub fn place_paddle(&mut self, side: Side, position: Vec2) {
        let board = self.board;
        self.paddle_mut(side).place(position, &board);
    }

    /// Starts a new rally: ball served from the centre, paddles back home.
    pub fn reset_rally(&mut self) {
        self.ball = Self::serve(&self.board, &mut self.rng);
        self.left.reset(&self.board);
        self.right.reset(&self.board);
        self.touching_wall = false;
        self.touching_paddle = false;
    }

    #[cfg(test)]
    pub(crate) fn set_ball(&mut self, ball: Ball) {
        self.ball = ball;
    }

    /// Moves the scripted opponent (right paddle) one step toward its target.
    pub fn drive_opponent(&mut self) {
        let Some(difficulty) = self.difficulty else {
            return;
        };
        let Some(target) = self.opponent_target(difficulty) else {
            return;
        };

        let mut speed = self.board.paddle_speed;
        if difficulty == Difficulty::Hard {
            speed += self.board.hard_speed_bonus;
        }

        let paddle_y = self.right.position().y;
        let height = self.board.paddle_height;
        let offset = self.board.ai_dead_zone_offset;

        if target > paddle_y + (height + offset) / 2.0 {
            self.move_paddle_at(Side::Right, PaddleMove::Down, speed);
        } else if target < paddle_y + (height - offset) / 2.0 {
            self.move_paddle_at(Side::Right, PaddleMove::Up, speed);
        }
    }

    fn opponent_target(&self, difficulty: Difficulty) -> Option<f32> {
        let ball = &self.ball;
        let toward_opponent = ball.is_rightward();

        match difficulty {
            Difficulty::Impossible => {
                if toward_opponent {
                    Some(self.predict_ball_y(self.right.position().x))
                } else {
                    Some(self.board.height / 2.0)
                }
            }
            Difficulty::Hard => Some(ball.position.y),
            Difficulty::Medium if toward_opponent => Some(ball.position.y),
            Difficulty::Easy
                if toward_opponent
                    && ball.position.x / self.board.width >= self.min_distance_ratio =>
            {
                Some(ball.position.y)
            }
            _ => None,
        }
    }

    /// Ball y when it reaches `x`, folding the straight-line overshoot back
    /// into the board for each wall bounce.
    fn predict_ball_y(&self, x: f32) -> f32 {
        let ball = &self.ball;
        let height = self.board.height;
        let (sin, cos) = ball.angle().sin_cos();

        let distance = (x - ball.position.x) / cos;
        let mut y = (distance * sin + ball.position.y).round();
        let mut folds = 0u32;
        while y > height {
            y -= height;
            folds += 1;
        }
        while y < 0.0 {
            y += height;
            folds += 1;
        }
        if folds % 2 == 1 { height - y } else { y }
    }

    pub fn step(&mut self) -> StepEvents {
        let mut events = StepEvents::default();
        let radius = self.ball.radius;

        let y = self.ball.position.y;
        if !(radius < y && y < self.board.height - radius) {
            if !self.touching_wall {
                let angle = self.ball.angle();
                self.ball.set_angle(-angle);
                self.touching_wall = true;
                events.wall_hit = true;
            }
        } else {
            self.touching_wall = false;
        }

        let ratio = self.board.paddle_corner_ratio;
        let position = self.ball.position;
        let left_contact = rounded_rect_circle_contact(self.left.rect(), ratio, position, radius);
        let right_contact = rounded_rect_circle_contact(self.right.rect(), ratio, position, radius);

        if let Some((side, contact)) = left_contact
            .map(|c| (Side::Left, c))
            .or(right_contact.map(|c| (Side::Right, c)))
        {
            if !self.touching_paddle {
                self.bounce_off_paddle(side, contact);
                self.touching_paddle = true;
                events.paddle_hit = true;
            }
        } else if self.touching_paddle {
            let clear_of_left = self.left.rect().right() + radius < position.x;
            let clear_of_right = position.x < self.right.position().x - radius;
            if clear_of_left && clear_of_right {
                self.touching_paddle = false;
            }
        }

        let x = self.ball.position.x;
        if -radius <= x && x <= self.board.width + radius {
            self.ball.advance();
        } else {
            let scorer = if self.ball.is_rightward() {
                Side::Left
            } else {
                Side::Right
            };
            events.scored = Some(scorer);
            self.reset_rally();
        }

        events
    }

    fn bounce_off_paddle(&mut self, side: Side, contact: Vec2) {
        let board = self.board;
        self.ball.speed = (self.ball.speed + board.ball_speed_step).min(board.ball_max_speed);

        if self.difficulty == Some(Difficulty::Easy) && !self.ball.is_rightward() {
            self.min_distance_ratio = self.rng.gen_range(0.0..EASY_MAX_DISTANCE_RATIO);
        }

        let offset = contact.y - self.paddle(side).center_y();
        let deflection = offset.powi(3) * board.collision_coefficient();
        let max = board.max_ball_angle;
        let reflected = PI - self.ball.angle();

        let angle = match side {
            Side::Left => wrap_to_pi(reflected + deflection).clamp(-max, max),
            Side::Right => {
                let angle = wrap_to_pi(reflected - deflection);
                if 0.0 < angle && angle < PI - max {
                    PI - max
                } else if max - PI < angle && angle < 0.0 {
                    max - PI
                } else {
                    angle
                }
            }
        };
        self.ball.set_angle(angle);
    }
}
