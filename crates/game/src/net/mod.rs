mod discovery;
mod invitation;
mod local;
mod protocol;
mod stats;
mod transport;

pub use discovery::{
    DiscoveryBroadcaster, DiscoveryListener, PeerCollector, PeerRecord, RECEIVE_POLL,
    SharedUsername, announcement, parse_announcement,
};
pub use invitation::{ACCEPT_POLL, ConnectionListener, HandshakeError, PendingInvitation, invite};
pub use local::{LocalAddresses, outbound_ipv4};
pub use protocol::{
    ClientData, InvitationAcceptedPacket, InvitationPacket, MAX_FRAME_SIZE, Packet, ProtocolError,
    ServerData, decode, encode,
};
pub use stats::NetworkStats;
pub use transport::{Connection, FrameReader, TransportError, read_frame, send_to, write_frame};
