use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Wall,
    Blip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScreen {
    Pause,
    Scored,
    Lose,
    Player1Scored,
    Player2Scored,
}

/// Side effect the server asks the client to perform, shipped inside
/// `ServerData` as `{"kind": ..., "args": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum Directive {
    SoundWall,
    SoundBlip,
    ScoreScreen(ScoreScreen),
    /// `true` when the left (server) player scored.
    UpdateScore(bool),
}

impl Directive {
    pub fn sound(&self) -> Option<Sound> {
        match self {
            Self::SoundWall => Some(Sound::Wall),
            Self::SoundBlip => Some(Sound::Blip),
            _ => None,
        }
    }
}
