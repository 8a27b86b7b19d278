mod app;
mod input;
mod settings;
mod tui;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use puck::{Difficulty, GameConfig};

use app::{App, Launch};
use settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StartMode {
    Single,
    Two,
    Lan,
}

#[derive(Parser)]
#[command(name = "puck")]
#[command(about = "Two player air hockey in the terminal, locally or over the LAN")]
struct Args {
    #[arg(long, help = "Username shown to other players (max 10 characters)")]
    username: Option<String>,

    #[arg(long, default_value = "easy", help = "Computer opponent: easy, medium, hard or impossible")]
    difficulty: Difficulty,

    #[arg(long, help = "Points needed to win the match")]
    max_score: Option<u8>,

    #[arg(long, default_value_t = puck::config::DEFAULT_FPS, help = "Simulation ticks per second")]
    fps: u32,

    #[arg(long, default_value_t = puck::config::MIN_WIDTH, help = "Board width")]
    width: f32,

    #[arg(long, default_value_t = puck::config::MIN_HEIGHT, help = "Board height")]
    height: f32,

    #[arg(long, default_value_t = puck::config::TCP_PORT, help = "Port for invitations and matches")]
    tcp_port: u16,

    #[arg(long, default_value_t = puck::config::BROADCAST_PORT, help = "Port for LAN announcements")]
    broadcast_port: u16,

    #[arg(long, help = "Settings file (default: settings.json)")]
    settings: Option<PathBuf>,

    #[arg(long, value_enum, help = "Skip the main menu and start this mode")]
    mode: Option<StartMode>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::new(self.width, self.height, self.fps);
        if let Some(max_score) = self.max_score {
            config.board.max_score = max_score;
        }
        config.net.tcp_port = self.tcp_port;
        config.net.broadcast_port = self.broadcast_port;
        config
    }

    fn launch(&self) -> Launch {
        match self.mode {
            None => Launch::Menu,
            Some(StartMode::Single) => Launch::SinglePlayer(self.difficulty),
            Some(StartMode::Two) => Launch::TwoPlayers,
            Some(StartMode::Lan) => Launch::Lan,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let config = args.game_config();
    config.validate()?;

    let settings_path = args.settings.clone().unwrap_or_else(settings::default_path);
    let mut settings = Settings::load(&settings_path);
    if let Some(username) = &args.username {
        settings.set_username(username);
    }

    let mut app = App::new(config, settings);
    let result = run(&mut app, args.launch());

    if let Err(e) = app.settings().save(&settings_path) {
        log::warn!("could not save settings: {e}");
    }

    if let Err(e) = &result {
        eprintln!("TUI error: {e}");
    }
    result
}

fn run(app: &mut App, launch: Launch) -> anyhow::Result<()> {
    let mut tui = tui::Tui::new()?;
    let result = app.run(&mut tui, launch);
    tui.restore_terminal()?;
    Ok(result?)
}
