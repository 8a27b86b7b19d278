use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use puck::net::{Connection, LocalAddresses, invite};
use puck::{
    FrameState, Frontend, GameConfig, GameSession, InputState, Lobby, Mode, NetConfig, Role,
    Score, ScoreScreen, SessionError, SessionOutcome, Sound, TransportError,
};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(43000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

#[derive(Default)]
struct IdleFrontend {
    frames: usize,
    sounds: Vec<Sound>,
    screens: Vec<ScoreScreen>,
    quit: bool,
}

impl Frontend for IdleFrontend {
    fn render_frame(&mut self, _frame: &FrameState) {
        self.frames += 1;
    }

    fn play_sound(&mut self, sound: Sound) {
        self.sounds.push(sound);
    }

    fn poll_input(&mut self) -> InputState {
        InputState {
            quit: self.quit,
            ..Default::default()
        }
    }

    fn show_score_screen(&mut self, screen: ScoreScreen, _score: &Score) -> bool {
        self.screens.push(screen);
        true
    }
}

fn connected_pair() -> (Connection, Connection) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = Connection::connect(addr, Duration::from_secs(1)).unwrap();
    let (stream, _) = listener.accept().unwrap();
    let server = Connection::new(stream).unwrap();
    client.set_timeout(Duration::from_secs(5)).unwrap();
    server.set_timeout(Duration::from_secs(5)).unwrap();
    (server, client)
}

fn fast_config() -> GameConfig {
    let mut config = GameConfig::new(800.0, 400.0, 10_000);
    config.board.max_score = 1;
    config.board.ball_start_speed = 10.0;
    config
}

#[test]
fn test_network_match_agrees_on_score() {
    let (server_conn, client_conn) = connected_pair();
    let config = fast_config();

    let client_config = config.clone();
    let client = thread::spawn(move || {
        let mut frontend = IdleFrontend::default();
        let session = GameSession::new(
            &client_config,
            Mode::Network {
                role: Role::Client,
                connection: client_conn,
                peer: "server".to_string(),
            },
        );
        (session.run(&mut frontend), frontend)
    });

    let mut frontend = IdleFrontend::default();
    let session = GameSession::with_seed(
        &config,
        Mode::Network {
            role: Role::Server,
            connection: server_conn,
            peer: "client".to_string(),
        },
        11,
    );
    let server_outcome = session.run(&mut frontend).unwrap();
    let (client_outcome, client_frontend) = client.join().unwrap();
    let client_outcome = client_outcome.unwrap();

    let SessionOutcome::Finished(server_score) = server_outcome else {
        panic!("server did not finish: {server_outcome:?}");
    };
    assert_eq!(client_outcome, SessionOutcome::Finished(server_score));

    // Each side sees the point from its own perspective.
    let expected_client = if server_score.left == 1 {
        ScoreScreen::Lose
    } else {
        ScoreScreen::Scored
    };
    let expected_server = if server_score.left == 1 {
        ScoreScreen::Scored
    } else {
        ScoreScreen::Lose
    };
    assert_eq!(client_frontend.screens, vec![expected_client]);
    assert_eq!(frontend.screens, vec![expected_server]);
    assert_eq!(client_frontend.sounds, frontend.sounds);
}

#[test]
fn test_peer_leaving_aborts_server() {
    let (server_conn, client_conn) = connected_pair();
    let config = fast_config();

    let client = thread::spawn(move || {
        let mut frontend = IdleFrontend {
            quit: true,
            ..Default::default()
        };
        GameSession::new(
            &config,
            Mode::Network {
                role: Role::Client,
                connection: client_conn,
                peer: "server".to_string(),
            },
        )
        .run(&mut frontend)
    });
    assert_eq!(client.join().unwrap().unwrap(), SessionOutcome::Quit);

    let mut frontend = IdleFrontend::default();
    let result = GameSession::new(
        &fast_config(),
        Mode::Network {
            role: Role::Server,
            connection: server_conn,
            peer: "client".to_string(),
        },
    )
    .run(&mut frontend);
    assert!(matches!(
        result,
        Err(SessionError::Transport(TransportError::Disconnected))
    ));
}

#[test]
fn test_lobby_lists_itself_and_accepts_invitation() {
    let tcp_port = next_port();
    let net = NetConfig {
        tcp_port,
        broadcast_port: tcp_port + 1,
        broadcast_addr: Ipv4Addr::LOCALHOST,
        broadcast_interval: Duration::from_millis(100),
        ..NetConfig::default()
    };

    let mut lobby = Lobby::open_with(&net, "alice", LocalAddresses::none()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut peers = Vec::new();
    while peers.is_empty() && Instant::now() < deadline {
        peers = lobby.peers();
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].username, "alice");

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, tcp_port));
    let inviter = thread::spawn(move || {
        invite(addr, "bob", Duration::from_secs(2), Duration::from_secs(5))
    });

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut inviting = None;
    while inviting.is_none() && Instant::now() < deadline {
        inviting = lobby.poll_invitation().map(|i| i.username.clone());
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(inviting.as_deref(), Some("bob"));

    let matched = lobby.accept_invitation().unwrap();
    assert_eq!(matched.peer, "bob");
    assert_eq!(matched.role, Role::Server);

    let (_connection, peer) = inviter.join().unwrap().unwrap();
    assert_eq!(peer, "alice");

    // The port is free again once the lobby has closed.
    drop(lobby);
    assert!(TcpListener::bind(addr).is_ok());
}
