use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{NetConfig, clamp_username};
use crate::net::{
    Connection, ConnectionListener, DiscoveryBroadcaster, DiscoveryListener, HandshakeError,
    LocalAddresses, PeerRecord, PendingInvitation, SharedUsername, TransportError, invite,
};
use crate::session::Role;

/// A connected opponent, ready to hand to a network session.
#[derive(Debug)]
pub struct Match {
    pub connection: Connection,
    pub peer: String,
    pub role: Role,
}

/// The LAN lobby: announces us, lists peers and waits for invitations
/// while it is open. Closing stops all three background tasks and
/// releases the listening port.
pub struct Lobby {
    config: NetConfig,
    username: SharedUsername,
    broadcaster: DiscoveryBroadcaster,
    discovery: DiscoveryListener,
    listener: ConnectionListener,
    closed: bool,
}

impl Lobby {
    pub fn open(config: &NetConfig, username: &str) -> io::Result<Self> {
        Self::open_with(config, username, LocalAddresses::detect())
    }

    pub fn open_with(config: &NetConfig, username: &str, local: LocalAddresses) -> io::Result<Self> {
        let username = Arc::new(RwLock::new(clamp_username(username)));

        let socket = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.tcp_port))?;
        let listener = ConnectionListener::spawn(socket, local.clone(), config.invitation_timeout)?;
        let discovery = DiscoveryListener::spawn(config, local)?;
        let broadcaster = DiscoveryBroadcaster::spawn(config, Arc::clone(&username))?;

        log::info!("lobby open on port {}", config.tcp_port);
        Ok(Self {
            config: config.clone(),
            username,
            broadcaster,
            discovery,
            listener,
            closed: false,
        })
    }

    pub fn username(&self) -> String {
        self.username
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renames us; the next announcement already carries the new name.
    pub fn set_username(&self, username: &str) {
        *self
            .username
            .write()
            .unwrap_or_else(PoisonError::into_inner) = clamp_username(username);
    }

    pub fn peers(&self) -> Vec<PeerRecord> {
        self.discovery.peers()
    }

    pub fn poll_invitation(&mut self) -> Option<&PendingInvitation> {
        self.listener.poll_invitation()
    }

    pub fn refuse_invitation(&mut self) {
        self.listener.refuse();
    }

    /// Accepts the pending invitation; we serve the match. The lobby is
    /// closed on success and stays open otherwise.
    pub fn accept_invitation(&mut self) -> Result<Match, TransportError> {
        let (connection, peer) = self
            .listener
            .accept(&self.username(), self.config.session_timeout)?;
        self.close();
        Ok(Match {
            connection,
            peer,
            role: Role::Server,
        })
    }

    /// Invites `peer` and blocks until they answer; we join as client.
    pub fn invite(&mut self, peer: &PeerRecord) -> Result<Match, HandshakeError> {
        let addr = SocketAddr::new(peer.addr, self.config.tcp_port);
        log::info!("inviting {} at {addr}", peer.username);

        let (connection, peer) = invite(
            addr,
            &self.username(),
            self.config.invitation_timeout,
            self.config.session_timeout,
        )?;
        self.close();
        Ok(Match {
            connection,
            peer,
            role: Role::Client,
        })
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.broadcaster.stop();
        self.discovery.stop();
        drop(self.listener.stop());
        log::info!("lobby closed");
    }
}

impl Drop for Lobby {
    fn drop(&mut self) {
        self.close();
    }
}
