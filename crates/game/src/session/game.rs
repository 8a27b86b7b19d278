use glam::Vec2;

use super::clock::FrameClock;
use super::frontend::{Controls, FrameState, Frontend};
use crate::config::{BoardConfig, Difficulty, GameConfig};
use crate::event::{Directive, DirectiveQueue, ScoreScreen, Sound};
use crate::net::{ClientData, Connection, ServerData, TransportError};
use crate::physics::{Ball, Paddle, PhysicsEngine, Score, Side, StepEvents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs the physics and plays the left paddle.
    Server,
    /// Mirrors the server's state and plays the right paddle.
    Client,
}

#[derive(Debug)]
pub enum Mode {
    SinglePlayer(Difficulty),
    TwoPlayers,
    Network {
        role: Role,
        connection: Connection,
        peer: String,
    },
}

impl Mode {
    fn difficulty(&self) -> Option<Difficulty> {
        match self {
            Mode::SinglePlayer(difficulty) => Some(*difficulty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished(Score),
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection to peer failed: {0}")]
    Transport(#[from] TransportError),
}

/// One match, played until a side reaches the max score or a player leaves.
pub struct GameSession {
    engine: PhysicsEngine,
    score: Score,
    clock: FrameClock,
    mode: Mode,
}

impl GameSession {
    pub fn new(config: &GameConfig, mode: Mode) -> Self {
        let engine = PhysicsEngine::new(&config.board, mode.difficulty());
        Self::with_engine(config, mode, engine)
    }

    pub fn with_seed(config: &GameConfig, mode: Mode, seed: u64) -> Self {
        let engine = PhysicsEngine::with_seed(&config.board, mode.difficulty(), seed);
        Self::with_engine(config, mode, engine)
    }

    fn with_engine(config: &GameConfig, mode: Mode, engine: PhysicsEngine) -> Self {
        Self {
            engine,
            score: Score::new(config.board.max_score),
            clock: FrameClock::new(config.fps),
            mode,
        }
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn run<F: Frontend>(self, frontend: &mut F) -> Result<SessionOutcome, SessionError> {
        let Self {
            mut engine,
            mut score,
            mut clock,
            mode,
        } = self;

        log::debug!("one frame every {:?}", clock.frame_duration());
        let outcome = match mode {
            Mode::SinglePlayer(difficulty) => {
                log::info!("single player session against {difficulty}");
                Ok(run_local(&mut engine, &mut score, &mut clock, false, frontend))
            }
            Mode::TwoPlayers => {
                log::info!("two player session");
                Ok(run_local(&mut engine, &mut score, &mut clock, true, frontend))
            }
            Mode::Network {
                role: Role::Server,
                mut connection,
                peer,
            } => {
                log::info!("serving a match against {peer} at {}", connection.peer_addr());
                let outcome =
                    run_server(&mut engine, &mut score, &mut clock, &mut connection, frontend);
                log::info!("traffic with {peer}: {}", connection.stats());
                outcome
            }
            Mode::Network {
                role: Role::Client,
                mut connection,
                peer,
            } => {
                log::info!("joining {peer}'s match at {}", connection.peer_addr());
                let outcome = run_client(engine.board(), &mut score, &mut connection, frontend);
                log::info!("traffic with {peer}: {}", connection.stats());
                outcome
            }
        };

        match &outcome {
            Ok(SessionOutcome::Finished(score)) => {
                log::info!("session finished {}-{}", score.left, score.right)
            }
            Ok(SessionOutcome::Quit) => log::info!("session left by player"),
            Err(e) => log::warn!("session aborted: {e}"),
        }
        outcome
    }
}

fn play_sounds<F: Frontend>(events: &StepEvents, frontend: &mut F) {
    if events.wall_hit {
        frontend.play_sound(Sound::Wall);
    }
    if events.paddle_hit {
        frontend.play_sound(Sound::Blip);
    }
}

fn render<F: Frontend>(engine: &PhysicsEngine, score: Score, frontend: &mut F) {
    frontend.render_frame(&FrameState::new(
        engine.board(),
        engine.ball(),
        engine.paddle(Side::Left),
        engine.paddle(Side::Right),
        score,
    ));
}

fn run_local<F: Frontend>(
    engine: &mut PhysicsEngine,
    score: &mut Score,
    clock: &mut FrameClock,
    two_players: bool,
    frontend: &mut F,
) -> SessionOutcome {
    clock.reset();
    loop {
        let input = frontend.poll_input();
        if input.quit {
            return SessionOutcome::Quit;
        }
        if input.pause {
            if !frontend.show_score_screen(ScoreScreen::Pause, score) {
                return SessionOutcome::Quit;
            }
            clock.reset();
        }

        if two_players {
            if let Some(mv) = Controls::Wasd.paddle_move(input.keys) {
                engine.move_paddle(Side::Left, mv);
            }
            if let Some(mv) = Controls::Arrows.paddle_move(input.keys) {
                engine.move_paddle(Side::Right, mv);
            }
        } else {
            if let Some(mv) = Controls::Arrows.paddle_move(input.keys) {
                engine.move_paddle(Side::Left, mv);
            }
            engine.drive_opponent();
        }

        let events = engine.step();
        play_sounds(&events, frontend);
        render(engine, *score, frontend);

        if let Some(scorer) = events.scored {
            score.record(scorer);
            let screen = match (two_players, scorer) {
                (true, Side::Left) => ScoreScreen::Player1Scored,
                (true, Side::Right) => ScoreScreen::Player2Scored,
                (false, Side::Left) => ScoreScreen::Scored,
                (false, Side::Right) => ScoreScreen::Lose,
            };
            let keep_playing = frontend.show_score_screen(screen, score);
            if score.is_finished() {
                return SessionOutcome::Finished(*score);
            }
            if !keep_playing {
                return SessionOutcome::Quit;
            }
            clock.reset();
        }

        clock.tick();
    }
}

fn run_server<F: Frontend>(
    engine: &mut PhysicsEngine,
    score: &mut Score,
    clock: &mut FrameClock,
    connection: &mut Connection,
    frontend: &mut F,
) -> Result<SessionOutcome, SessionError> {
    let mut directives = DirectiveQueue::new();
    clock.reset();

    loop {
        let input = frontend.poll_input();
        if input.quit {
            return Ok(SessionOutcome::Quit);
        }
        if let Some(mv) = Controls::Arrows.paddle_move(input.keys) {
            engine.move_paddle(Side::Left, mv);
        }

        let client: ClientData = connection.receive()?;
        engine.place_paddle(Side::Right, Vec2::new(client.right_x, client.right_y));

        let events = engine.step();
        play_sounds(&events, frontend);
        if events.wall_hit {
            directives.push(Directive::SoundWall);
        }
        if events.paddle_hit {
            directives.push(Directive::SoundBlip);
        }
        if let Some(scorer) = events.scored {
            let left_scored = scorer == Side::Left;
            directives.push(Directive::UpdateScore(left_scored));
            directives.push(Directive::ScoreScreen(if left_scored {
                ScoreScreen::Lose
            } else {
                ScoreScreen::Scored
            }));
        }

        let ball = engine.ball();
        let left = engine.paddle(Side::Left).position();
        connection.send(&ServerData {
            left_y: left.y,
            left_x: left.x,
            ball_x: ball.position.x,
            ball_y: ball.position.y,
            directives: directives.take_all(),
        })?;

        render(engine, *score, frontend);

        if let Some(scorer) = events.scored {
            score.record(scorer);
            let screen = if scorer == Side::Left {
                ScoreScreen::Scored
            } else {
                ScoreScreen::Lose
            };
            let keep_playing = frontend.show_score_screen(screen, score);
            if score.is_finished() {
                return Ok(SessionOutcome::Finished(*score));
            }
            if !keep_playing {
                return Ok(SessionOutcome::Quit);
            }
            clock.reset();
        }

        clock.tick();
    }
}

/// The client has no physics of its own: it steers its paddle locally and
/// draws whatever the server reports. Pacing comes from the server.
fn run_client<F: Frontend>(
    board: &BoardConfig,
    score: &mut Score,
    connection: &mut Connection,
    frontend: &mut F,
) -> Result<SessionOutcome, SessionError> {
    let mut own = Paddle::new(Side::Right, board);
    let mut opponent = Paddle::new(Side::Left, board);
    let center = board.center();
    let mut ball = Ball::new(center, 0.0, board.ball_start_speed, board.ball_radius);

    loop {
        let input = frontend.poll_input();
        if input.quit {
            return Ok(SessionOutcome::Quit);
        }
        if let Some(mv) = Controls::Arrows.paddle_move(input.keys) {
            own.step(mv, board.paddle_speed, board, ball.position.x);
        }

        let position = own.position();
        connection.send(&ClientData {
            right_y: position.y,
            right_x: position.x,
        })?;

        let server: ServerData = connection.receive()?;
        opponent.place(Vec2::new(server.left_x, server.left_y), board);
        ball.position = Vec2::new(server.ball_x, server.ball_y);

        let mut keep_playing = true;
        for directive in server.directives {
            match directive {
                Directive::SoundWall | Directive::SoundBlip => {
                    if let Some(sound) = directive.sound() {
                        frontend.play_sound(sound);
                    }
                }
                Directive::UpdateScore(left_scored) => {
                    score.record(if left_scored { Side::Left } else { Side::Right });
                    own.reset(board);
                }
                Directive::ScoreScreen(screen) => {
                    keep_playing &= frontend.show_score_screen(screen, score);
                }
            }
        }

        frontend.render_frame(&FrameState::new(board, &ball, &opponent, &own, *score));

        if score.is_finished() {
            return Ok(SessionOutcome::Finished(*score));
        }
        if !keep_playing {
            return Ok(SessionOutcome::Quit);
        }
    }
}
