use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::local::LocalAddresses;
use super::protocol::{InvitationAcceptedPacket, InvitationPacket, decode};
use super::transport::{Connection, FrameReader, TransportError};

/// How often the idle accept loop checks for a stop request.
pub const ACCEPT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("could not reach peer: {0}")]
    Connect(io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// An inbound connection that has introduced itself and awaits an answer.
#[derive(Debug)]
pub struct PendingInvitation {
    pub connection: Connection,
    pub username: String,
}

impl PendingInvitation {
    pub fn addr(&self) -> SocketAddr {
        self.connection.peer_addr()
    }

    /// Sends our acceptance and switches the stream to session timeouts.
    pub fn confirm(
        mut self,
        username: &str,
        session_timeout: Duration,
    ) -> Result<(Connection, String), TransportError> {
        self.connection.send(&InvitationAcceptedPacket {
            username: username.to_string(),
        })?;
        self.connection.set_timeout(session_timeout)?;
        Ok((self.connection, self.username))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Resume,
    Stop,
}

/// Background acceptor for invitations. Holds at most one pending
/// invitation; the thread idles until the owner refuses or accepts it.
pub struct ConnectionListener {
    local_addr: SocketAddr,
    invitations: Receiver<PendingInvitation>,
    control_tx: Sender<Control>,
    pending: Option<PendingInvitation>,
    handle: Option<JoinHandle<TcpListener>>,
    listener: Option<TcpListener>,
}

impl ConnectionListener {
    pub fn spawn(
        listener: TcpListener,
        local: LocalAddresses,
        invitation_timeout: Duration,
    ) -> io::Result<Self> {
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let (invitation_tx, invitations) = mpsc::channel();
        let (control_tx, control_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("invitation-listen".to_string())
            .spawn(move || {
                log::info!("waiting for invitations on {local_addr}");
                accept_loop(
                    &listener,
                    &local,
                    invitation_timeout,
                    &invitation_tx,
                    &control_rx,
                );
                log::info!("stopped waiting for invitations");
                listener
            })?;

        Ok(Self {
            local_addr,
            invitations,
            control_tx,
            pending: None,
            handle: Some(handle),
            listener: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The invitation currently waiting for an answer, if any.
    pub fn poll_invitation(&mut self) -> Option<&PendingInvitation> {
        if self.pending.is_none() {
            self.pending = self.invitations.try_recv().ok();
        }
        self.pending.as_ref()
    }

    /// Closes the pending connection and goes back to accepting.
    pub fn refuse(&mut self) {
        if let Some(invitation) = self.pending.take() {
            log::info!("refused invitation from {}", invitation.username);
            drop(invitation);
            let _ = self.control_tx.send(Control::Resume);
        }
    }

    /// Answers the pending invitation. On success the acceptor thread is
    /// stopped; if the reply cannot be delivered the invitation is refused.
    pub fn accept(
        &mut self,
        username: &str,
        session_timeout: Duration,
    ) -> Result<(Connection, String), TransportError> {
        let invitation = self.pending.take().ok_or(TransportError::NotConnected)?;
        let peer = invitation.username.clone();
        let addr = invitation.addr();

        match invitation.confirm(username, session_timeout) {
            Ok(accepted) => {
                log::info!("accepted invitation from {peer} at {addr}");
                self.shutdown_thread();
                Ok(accepted)
            }
            Err(e) => {
                log::warn!("could not answer invitation from {peer}: {e}");
                let _ = self.control_tx.send(Control::Resume);
                Err(e)
            }
        }
    }

    /// Stops and joins the acceptor, handing back the listening socket.
    pub fn stop(&mut self) -> Option<TcpListener> {
        self.pending = None;
        self.shutdown_thread();
        self.listener.take()
    }

    fn shutdown_thread(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.control_tx.send(Control::Stop);
        match handle.join() {
            Ok(listener) => self.listener = Some(listener),
            Err(_) => log::error!("invitation listener panicked"),
        }
    }
}

impl Drop for ConnectionListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: &TcpListener,
    local: &LocalAddresses,
    invitation_timeout: Duration,
    invitation_tx: &Sender<PendingInvitation>,
    control_rx: &Receiver<Control>,
) {
    loop {
        match control_rx.try_recv() {
            Ok(Control::Resume) | Err(TryRecvError::Empty) => {}
            Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return,
        }

        match listener.accept() {
            Ok((stream, addr)) => {
                if local.contains(&addr.ip()) {
                    log::debug!("ignoring connection from local address {addr}");
                    continue;
                }

                let invitation = match read_invitation(stream, invitation_timeout, control_rx) {
                    Ok(Some(invitation)) => invitation,
                    Ok(None) => return,
                    Err(e) => {
                        log::warn!("dropped connection from {addr}: {e}");
                        continue;
                    }
                };

                log::info!("invitation from {} at {addr}", invitation.username);
                if invitation_tx.send(invitation).is_err() {
                    return;
                }
                match control_rx.recv() {
                    Ok(Control::Resume) => {}
                    Ok(Control::Stop) | Err(_) => return,
                }
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::WouldBlock {
                    log::warn!("accept failed: {e}");
                }
                match control_rx.recv_timeout(ACCEPT_POLL) {
                    Ok(Control::Resume) | Err(RecvTimeoutError::Timeout) => {}
                    Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        }
    }
}

/// Reads the opening packet in `ACCEPT_POLL` slices so a stop request still
/// gets through while a silent peer holds the connection. Returns `None`
/// when told to stop.
fn read_invitation(
    mut stream: TcpStream,
    invitation_timeout: Duration,
    control_rx: &Receiver<Control>,
) -> Result<Option<PendingInvitation>, TransportError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(ACCEPT_POLL))?;
    let deadline = Instant::now() + invitation_timeout;
    let mut frames = FrameReader::new();

    let payload = loop {
        match control_rx.try_recv() {
            Ok(Control::Resume) | Err(TryRecvError::Empty) => {}
            Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return Ok(None),
        }
        if Instant::now() >= deadline {
            return Err(TransportError::TimedOut);
        }
        match frames.poll(&mut stream) {
            Ok(Some(payload)) => break payload,
            Ok(None) | Err(TransportError::TimedOut) => {}
            Err(e) => return Err(e),
        }
    };

    let packet: InvitationPacket = decode(&payload)?;
    let connection = Connection::new(stream)?;
    connection.set_timeout(invitation_timeout)?;
    Ok(Some(PendingInvitation {
        connection,
        username: packet.username,
    }))
}

/// Invites the player listening at `addr`. Returns the session connection and
/// the peer's username once they accept.
pub fn invite(
    addr: SocketAddr,
    username: &str,
    handshake_timeout: Duration,
    session_timeout: Duration,
) -> Result<(Connection, String), HandshakeError> {
    let mut connection =
        Connection::connect(addr, handshake_timeout).map_err(HandshakeError::Connect)?;
    connection
        .set_timeout(handshake_timeout)
        .map_err(TransportError::from)?;

    connection.send(&InvitationPacket {
        username: username.to_string(),
    })?;
    let reply: InvitationAcceptedPacket = connection.receive()?;

    connection
        .set_timeout(session_timeout)
        .map_err(TransportError::from)?;
    log::info!("{} accepted our invitation", reply.username);
    Ok((connection, reply.username))
}
