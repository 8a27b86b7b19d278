pub mod config;
pub mod event;
pub mod lobby;
pub mod net;
pub mod physics;
pub mod session;

pub use config::{BoardConfig, ConfigError, Difficulty, GameConfig, NetConfig};
pub use event::{Directive, DirectiveQueue, ScoreScreen, Sound};
pub use lobby::{Lobby, Match};
pub use net::{
    ClientData, Connection, ConnectionListener, DiscoveryBroadcaster, DiscoveryListener,
    HandshakeError, InvitationAcceptedPacket, InvitationPacket, LocalAddresses, Packet,
    PeerRecord, ProtocolError, ServerData, TransportError,
};
pub use physics::{Ball, Paddle, PaddleMove, PhysicsEngine, Score, Side, StepEvents};
pub use session::{
    Controls, FrameState, Frontend, GameSession, InputState, KeySet, Mode, Role, SessionError,
    SessionOutcome,
};
