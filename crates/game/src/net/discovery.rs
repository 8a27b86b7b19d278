use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::mpsc::{self, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::local::LocalAddresses;
use crate::config::NetConfig;

/// Upper bound on how long the listener waits for a single datagram.
pub const RECEIVE_POLL: Duration = Duration::from_millis(250);

/// Username announced by the broadcaster, editable while it runs.
pub type SharedUsername = Arc<RwLock<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub username: String,
    pub addr: IpAddr,
}

pub fn announcement(identifier: &str, username: &str) -> Vec<u8> {
    format!("{identifier},{username}").into_bytes()
}

/// Username carried by an announcement, if `data` is one of ours.
pub fn parse_announcement(identifier: &str, data: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(data).ok()?;
    let rest = text.strip_prefix(identifier)?.strip_prefix(',')?;
    rest.split(',').next().map(str::to_string)
}

/// Gathers the peers heard during one listening window.
#[derive(Debug)]
pub struct PeerCollector {
    identifier: String,
    local: LocalAddresses,
    window: Vec<PeerRecord>,
    published: Vec<PeerRecord>,
}

impl PeerCollector {
    pub fn new(identifier: impl Into<String>, local: LocalAddresses) -> Self {
        Self {
            identifier: identifier.into(),
            local,
            window: Vec::new(),
            published: Vec::new(),
        }
    }

    /// Returns true when the datagram added a new peer to the window.
    pub fn observe(&mut self, data: &[u8], from: IpAddr) -> bool {
        let Some(username) = parse_announcement(&self.identifier, data) else {
            return false;
        };
        if self.local.contains(&from) || self.window.iter().any(|p| p.addr == from) {
            return false;
        }
        self.window.push(PeerRecord {
            username,
            addr: from,
        });
        true
    }

    /// Closes the window; yields the new peer list only if it changed.
    pub fn finish_window(&mut self) -> Option<Vec<PeerRecord>> {
        let current = std::mem::take(&mut self.window);
        if current == self.published {
            return None;
        }
        self.published = current.clone();
        Some(current)
    }
}

fn stop_thread(stop_tx: &mut Option<Sender<()>>, handle: &mut Option<JoinHandle<()>>) {
    if let Some(tx) = stop_tx.take() {
        let _ = tx.send(());
    }
    if let Some(handle) = handle.take() {
        if handle.join().is_err() {
            log::error!("discovery thread panicked");
        }
    }
}

pub struct DiscoveryBroadcaster {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryBroadcaster {
    pub fn spawn(config: &NetConfig, username: SharedUsername) -> io::Result<Self> {
        let target = SocketAddr::from((config.broadcast_addr, config.broadcast_port));
        Self::spawn_to(
            target,
            config.broadcast_identifier.clone(),
            config.broadcast_interval,
            username,
        )
    }

    pub fn spawn_to(
        target: SocketAddr,
        identifier: String,
        interval: Duration,
        username: SharedUsername,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_broadcast(true)?;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("discovery-broadcast".to_string())
            .spawn(move || {
                log::info!("announcing on {target} every {interval:?}");
                loop {
                    let name = username
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                    if let Err(e) = socket.send_to(&announcement(&identifier, &name), target) {
                        log::warn!("announcement to {target} failed: {e}");
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                log::info!("announcements stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        stop_thread(&mut self.stop_tx, &mut self.handle);
    }
}

impl Drop for DiscoveryBroadcaster {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct DiscoveryListener {
    peers: Arc<RwLock<Vec<PeerRecord>>>,
    local_addr: SocketAddr,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryListener {
    pub fn spawn(config: &NetConfig, local: LocalAddresses) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.broadcast_port))?;
        Self::spawn_on(
            socket,
            PeerCollector::new(config.broadcast_identifier.clone(), local),
            config.discovery_window(),
            config.broadcast_buffer_size,
        )
    }

    pub fn spawn_on(
        socket: UdpSocket,
        mut collector: PeerCollector,
        window: Duration,
        buffer_size: usize,
    ) -> io::Result<Self> {
        socket.set_read_timeout(Some(RECEIVE_POLL))?;
        let local_addr = socket.local_addr()?;

        let peers = Arc::new(RwLock::new(Vec::new()));
        let shared = Arc::clone(&peers);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("discovery-listen".to_string())
            .spawn(move || {
                log::info!("listening for announcements on {local_addr}");
                let mut buffer = vec![0u8; buffer_size];

                'windows: loop {
                    let started = Instant::now();
                    while started.elapsed() < window {
                        if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                            break 'windows;
                        }

                        match socket.recv_from(&mut buffer) {
                            Ok((len, from)) => {
                                collector.observe(&buffer[..len], from.ip());
                            }
                            Err(e)
                                if matches!(
                                    e.kind(),
                                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                                ) => {}
                            Err(e) => {
                                log::warn!("discovery receive failed: {e}");
                                if !matches!(
                                    stop_rx.recv_timeout(RECEIVE_POLL),
                                    Err(RecvTimeoutError::Timeout)
                                ) {
                                    break 'windows;
                                }
                            }
                        }
                    }

                    if let Some(snapshot) = collector.finish_window() {
                        log::debug!("discovered peers: {snapshot:?}");
                        *shared.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
                    }
                }
                log::info!("stopped listening for announcements");
            })?;

        Ok(Self {
            peers,
            local_addr,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Peers seen during the last completed window.
    pub fn peers(&self) -> Vec<PeerRecord> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&mut self) {
        stop_thread(&mut self.stop_tx, &mut self.handle);
    }
}

impl Drop for DiscoveryListener {
    fn drop(&mut self) {
        self.stop();
    }
}
