use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use puck::net::{ConnectionListener, HandshakeError, LocalAddresses, TransportError, invite};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

fn local_addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

#[test]
fn test_handshake_times_out_and_closes_socket() {
    let addr = local_addr(next_port());
    let silent = TcpListener::bind(addr).unwrap();

    let started = Instant::now();
    let result = invite(
        addr,
        "alice",
        Duration::from_millis(200),
        Duration::from_secs(5),
    );
    assert!(matches!(
        result,
        Err(HandshakeError::Transport(TransportError::TimedOut))
    ));
    assert!(started.elapsed() < Duration::from_secs(2));

    // The initiator's end is gone: the acceptor sees the invitation, then EOF.
    let (mut stream, _) = silent.accept().unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).unwrap();
    assert!(!received.is_empty());
}

#[test]
fn test_handshake_to_closed_port_fails_to_connect() {
    let addr = local_addr(next_port());
    let result = invite(
        addr,
        "alice",
        Duration::from_millis(200),
        Duration::from_secs(5),
    );
    assert!(matches!(result, Err(HandshakeError::Connect(_))));
}

#[test]
fn test_listener_stop_without_peer() {
    let addr = local_addr(next_port());
    let socket = TcpListener::bind(addr).unwrap();
    let mut listener =
        ConnectionListener::spawn(socket, LocalAddresses::none(), Duration::from_secs(1)).unwrap();

    // Let the thread settle into its accept loop.
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    let socket = listener.stop().expect("listening socket handed back");
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(socket.local_addr().unwrap(), addr);
}

#[test]
fn test_garbage_connection_is_dropped() {
    use std::io::Write;
    use std::net::TcpStream;

    let addr = local_addr(next_port());
    let socket = TcpListener::bind(addr).unwrap();
    let mut listener =
        ConnectionListener::spawn(socket, LocalAddresses::none(), Duration::from_secs(1)).unwrap();

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(&[0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest);
    assert!(listener.poll_invitation().is_none());

    // Still serving after the bad peer.
    let inviter = thread::spawn(move || {
        invite(addr, "carol", Duration::from_secs(2), Duration::from_secs(5))
    });
    let deadline = Instant::now() + Duration::from_secs(3);
    while listener.poll_invitation().is_none() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    let (_connection, peer) = listener.accept("dave", Duration::from_secs(5)).unwrap();
    assert_eq!(peer, "carol");
    let (_connection, peer) = inviter.join().unwrap().unwrap();
    assert_eq!(peer, "dave");
}

#[test]
fn test_listener_stop_while_peer_is_silent() {
    use std::net::TcpStream;

    let addr = local_addr(next_port());
    let socket = TcpListener::bind(addr).unwrap();
    let mut listener =
        ConnectionListener::spawn(socket, LocalAddresses::none(), Duration::from_secs(3)).unwrap();

    // Connected but never sends an invitation.
    let _silent = TcpStream::connect(addr).unwrap();
    thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    let socket = listener.stop().expect("listening socket handed back");
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(socket.local_addr().unwrap(), addr);
}
