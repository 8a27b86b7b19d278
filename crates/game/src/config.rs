use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use glam::Vec2;

pub const MIN_WIDTH: f32 = 800.0;
pub const MIN_HEIGHT: f32 = 400.0;
pub const DEFAULT_FPS: u32 = 100;
pub const DEFAULT_MAX_SCORE: u8 = 5;

pub const TCP_PORT: u16 = 1010;
pub const SESSION_TIMEOUT_SECS: u64 = 30;
pub const INVITATION_TIMEOUT_SECS: u64 = 10;

pub const BROADCAST_PORT: u16 = 12345;
pub const BROADCAST_INTERVAL_SECS: u64 = 2;
pub const BROADCAST_BUFFER_SIZE: usize = 64;
pub const BROADCAST_IDENTIFIER: &str = "air-hockey";

pub const USERNAME_MAX_LEN: usize = 10;

/// Cuts a username down to `USERNAME_MAX_LEN` characters.
pub fn clamp_username(name: &str) -> String {
    name.trim().chars().take(USERNAME_MAX_LEN).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown difficulty level {0}")]
    UnknownDifficulty(String),
    #[error("board {width}x{height} is smaller than the paddles and ball it must hold")]
    BoardTooSmall { width: f32, height: f32 },
    #[error("max score must be at least 1")]
    InvalidMaxScore,
    #[error("ball speeds must satisfy 0 < start ({start}) <= max ({max})")]
    InvalidSpeeds { start: f32, max: f32 },
    #[error("fps must be at least 1")]
    InvalidFps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Impossible,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Impossible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(level as usize)
            .copied()
            .ok_or_else(|| ConfigError::UnknownDifficulty(level.to_string()))
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownDifficulty(s.to_string()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry and tuning of the playing field. Positions are top-left based,
/// y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardConfig {
    pub width: f32,
    pub height: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_corner_ratio: f32,
    pub left_paddle_x: f32,
    pub right_paddle_x: f32,
    pub paddle_speed: f32,
    pub hard_speed_bonus: f32,
    pub ai_dead_zone_offset: f32,

    pub ball_radius: f32,
    pub ball_start_speed: f32,
    pub ball_speed_step: f32,
    pub ball_max_speed: f32,

    pub max_ball_angle: f32,
    pub max_collision_angle: f32,

    pub max_score: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(MIN_WIDTH, MIN_HEIGHT)
    }
}

impl BoardConfig {
    /// Sizes below the minimum board are raised to it.
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);
        let paddle_width = 50.0;

        Self {
            width,
            height,
            paddle_width,
            paddle_height: 50.0,
            paddle_corner_ratio: 1.0,
            left_paddle_x: 30.0,
            right_paddle_x: width - paddle_width - 30.0,
            paddle_speed: 3.0,
            hard_speed_bonus: 1.0,
            ai_dead_zone_offset: 20.0,
            ball_radius: (width.min(height) / 45.0).floor(),
            ball_start_speed: 2.0,
            ball_speed_step: 0.2,
            ball_max_speed: 10.0,
            max_ball_angle: 60f32.to_radians(),
            max_collision_angle: 60f32.to_radians(),
            max_score: DEFAULT_MAX_SCORE,
        }
    }

    /// Scales the cubed contact offset so a hit on the paddle edge yields
    /// `max_collision_angle`.
    pub fn collision_coefficient(&self) -> f32 {
        self.max_collision_angle / (self.paddle_height / 2.0).powi(3)
    }

    pub fn midline(&self) -> f32 {
        self.width / 2.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.width / 2.0).floor(), (self.height / 2.0).floor())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let holds_paddles = self.paddle_width * 2.0 <= self.midline()
            && self.paddle_height < self.height
            && self.ball_radius * 2.0 < self.height;
        if !holds_paddles || self.ball_radius <= 0.0 {
            return Err(ConfigError::BoardTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_score == 0 {
            return Err(ConfigError::InvalidMaxScore);
        }
        if self.ball_start_speed <= 0.0 || self.ball_start_speed > self.ball_max_speed {
            return Err(ConfigError::InvalidSpeeds {
                start: self.ball_start_speed,
                max: self.ball_max_speed,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetConfig {
    pub tcp_port: u16,
    pub broadcast_port: u16,
    pub broadcast_addr: Ipv4Addr,
    pub broadcast_identifier: String,
    pub broadcast_interval: Duration,
    pub broadcast_buffer_size: usize,
    pub invitation_timeout: Duration,
    pub session_timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            tcp_port: TCP_PORT,
            broadcast_port: BROADCAST_PORT,
            broadcast_addr: Ipv4Addr::BROADCAST,
            broadcast_identifier: BROADCAST_IDENTIFIER.to_string(),
            broadcast_interval: Duration::from_secs(BROADCAST_INTERVAL_SECS),
            broadcast_buffer_size: BROADCAST_BUFFER_SIZE,
            invitation_timeout: Duration::from_secs(INVITATION_TIMEOUT_SECS),
            session_timeout: Duration::from_secs(SESSION_TIMEOUT_SECS),
        }
    }
}

impl NetConfig {
    /// Long enough to hear every peer announce at least twice.
    pub fn discovery_window(&self) -> Duration {
        self.broadcast_interval * 2 + Duration::from_secs(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub net: NetConfig,
    pub fps: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            net: NetConfig::default(),
            fps: DEFAULT_FPS,
        }
    }
}

impl GameConfig {
    pub fn new(width: f32, height: f32, fps: u32) -> Self {
        Self {
            board: BoardConfig::new(width, height),
            net: NetConfig::default(),
            fps,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidFps);
        }
        self.board.validate()
    }
}
