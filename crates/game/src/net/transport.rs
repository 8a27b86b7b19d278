use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use super::protocol::{MAX_FRAME_SIZE, Packet, ProtocolError, decode, encode};
use super::stats::NetworkStats;

const HEADER_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer disconnected")]
    Disconnected,
    #[error("timed out waiting for peer")]
    TimedOut,
    #[error("frame of {0} bytes exceeds the frame size limit")]
    FrameTooLarge(usize),
    #[error("no connection")]
    NotConnected,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Disconnected,
            _ => Self::Io(err),
        }
    }
}

/// Writes `payload` behind a 4-byte big-endian length prefix in one call.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<usize, TransportError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(frame.len())
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, TransportError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Collects one frame across reads that may time out midway, so a caller
/// can look at other work between reads without losing a partial frame.
/// Never reads past the end of the current frame.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads what is available of the current frame. Returns the payload
    /// once the frame is complete. A read timeout is reported as
    /// `TransportError::TimedOut` and the bytes gathered so far are kept.
    pub fn poll<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>, TransportError> {
        let start = self.buffer.len();
        let wanted = self.frame_len()? - start;
        self.buffer.resize(start + wanted, 0);

        let read = match reader.read(&mut self.buffer[start..]) {
            Ok(read) => read,
            Err(e) => {
                self.buffer.truncate(start);
                if e.kind() == io::ErrorKind::Interrupted {
                    return Ok(None);
                }
                return Err(e.into());
            }
        };
        self.buffer.truncate(start + read);
        if read == 0 {
            return Err(TransportError::Disconnected);
        }

        if self.buffer.len() >= HEADER_LEN && self.buffer.len() == self.frame_len()? {
            let payload = self.buffer.split_off(HEADER_LEN);
            self.buffer.clear();
            return Ok(Some(payload));
        }
        Ok(None)
    }

    /// Header plus payload length of the current frame, or just the header
    /// length while the header is still incomplete.
    fn frame_len(&self) -> Result<usize, TransportError> {
        let Some(header) = self.buffer.first_chunk::<HEADER_LEN>() else {
            return Ok(HEADER_LEN);
        };
        let len = u32::from_be_bytes(*header) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge(len));
        }
        Ok(HEADER_LEN + len)
    }
}

/// A framed packet stream to the other player.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    stats: NetworkStats,
}

impl Connection {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        Ok(Self {
            stream,
            peer_addr,
            stats: NetworkStats::default(),
        })
    }

    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        Self::new(stream)
    }

    /// Applies `timeout` to both reads and writes.
    pub fn set_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.set_write_timeout(Some(timeout))
    }

    pub fn send<P: Packet>(&mut self, packet: &P) -> Result<usize, TransportError> {
        let payload = encode(packet)?;
        let written = write_frame(&mut self.stream, &payload)?;
        self.stats.record_sent(written);
        Ok(written)
    }

    pub fn receive<P: Packet>(&mut self) -> Result<P, TransportError> {
        let payload = read_frame(&mut self.stream)?;
        self.stats.record_received(payload.len() + HEADER_LEN);
        Ok(decode(&payload)?)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}

/// Sends over an optional connection; without one nothing is written.
pub fn send_to<P: Packet>(
    connection: Option<&mut Connection>,
    packet: &P,
) -> Result<usize, TransportError> {
    match connection {
        Some(connection) => connection.send(packet),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;

    use super::*;
    use crate::net::protocol::{ClientData, InvitationPacket};

    /// Hands out `chunk` bytes per read, with a timeout before each one.
    struct Stalling {
        data: Vec<u8>,
        chunk: usize,
        stall: bool,
    }

    impl Read for Stalling {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.stall = !self.stall;
            if self.stall {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data.drain(..n);
            Ok(n)
        }
    }

    fn pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = Connection::connect(addr, Duration::from_secs(1)).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let server = Connection::new(stream).unwrap();
        client.set_timeout(Duration::from_secs(2)).unwrap();
        server.set_timeout(Duration::from_secs(2)).unwrap();
        (client, server)
    }

    #[test]
    fn test_frame_layout() {
        let mut buffer = Vec::new();
        let written = write_frame(&mut buffer, b"{}").unwrap();
        assert_eq!(written, 6);
        assert_eq!(buffer, vec![0, 0, 0, 2, b'{', b'}']);

        let payload = read_frame(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(payload, b"{}");
    }

    #[test]
    fn test_oversized_frames_rejected() {
        let mut buffer = Vec::new();
        let big = vec![b' '; MAX_FRAME_SIZE + 1];
        assert!(matches!(
            write_frame(&mut buffer, &big),
            Err(TransportError::FrameTooLarge(_))
        ));
        assert!(buffer.is_empty());

        let header = ((MAX_FRAME_SIZE + 1) as u32).to_be_bytes().to_vec();
        assert!(matches!(
            read_frame(&mut Cursor::new(header)),
            Err(TransportError::FrameTooLarge(_))
        ));
    }

    #[test]
    fn test_eof_is_disconnect() {
        assert!(matches!(
            read_frame(&mut Cursor::new(Vec::new())),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(
            read_frame(&mut Cursor::new(vec![0, 0, 0, 9, b'{'])),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_frame_reader_survives_timeouts() {
        let mut data = Vec::new();
        write_frame(&mut data, br#"{"a":1}"#).unwrap();
        write_frame(&mut data, b"[]").unwrap();
        let mut reader = Stalling {
            data,
            chunk: 3,
            stall: false,
        };

        let mut frames = FrameReader::new();
        let mut timeouts = 0;
        let mut payloads = Vec::new();
        while payloads.len() < 2 {
            match frames.poll(&mut reader) {
                Ok(Some(payload)) => payloads.push(payload),
                Ok(None) => {}
                Err(TransportError::TimedOut) => timeouts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(payloads, vec![br#"{"a":1}"#.to_vec(), b"[]".to_vec()]);
        assert!(timeouts > 0);
        assert!(reader.data.is_empty());
    }

    #[test]
    fn test_frame_reader_empty_payload() {
        let mut frames = FrameReader::new();
        let mut reader = Cursor::new(vec![0, 0, 0, 0, 9]);
        assert_eq!(frames.poll(&mut reader).unwrap(), Some(Vec::new()));
        // The byte after the frame is left for the next read.
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_frame_reader_errors() {
        let header = ((MAX_FRAME_SIZE + 1) as u32).to_be_bytes().to_vec();
        let mut frames = FrameReader::new();
        let mut reader = Cursor::new(header);
        assert!(matches!(
            frames.poll(&mut reader),
            Err(TransportError::FrameTooLarge(_))
        ));

        let mut frames = FrameReader::new();
        let mut reader = Cursor::new(vec![0, 0, 0, 9, b'{']);
        assert_eq!(frames.poll(&mut reader).unwrap(), None);
        assert_eq!(frames.poll(&mut reader).unwrap(), None);
        assert!(matches!(
            frames.poll(&mut reader),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_send_to_without_connection() {
        let packet = ClientData {
            right_y: 1.0,
            right_x: 2.0,
        };
        assert_eq!(send_to(None, &packet).unwrap(), 0);
    }

    #[test]
    fn test_connection_exchange() {
        let (mut client, mut server) = pair();

        let sent = send_to(
            Some(&mut client),
            &InvitationPacket {
                username: "bob".to_string(),
            },
        )
        .unwrap();
        assert!(sent > HEADER_LEN);

        let received: InvitationPacket = server.receive().unwrap();
        assert_eq!(received.username, "bob");
        assert_eq!(client.stats().frames_sent, 1);
        assert_eq!(server.stats().frames_received, 1);
    }

    #[test]
    fn test_wrong_packet_is_protocol_error() {
        let (mut client, mut server) = pair();
        client
            .send(&InvitationPacket {
                username: "bob".to_string(),
            })
            .unwrap();

        assert!(matches!(
            server.receive::<ClientData>(),
            Err(TransportError::Protocol(ProtocolError::InvalidData { .. }))
        ));
    }

    #[test]
    fn test_receive_times_out() {
        let (_client, mut server) = pair();
        server.set_timeout(Duration::from_millis(50)).unwrap();
        assert!(matches!(
            server.receive::<ClientData>(),
            Err(TransportError::TimedOut)
        ));
    }

    #[test]
    fn test_peer_close_is_disconnect() {
        let (client, mut server) = pair();
        drop(client);
        assert!(matches!(
            server.receive::<ClientData>(),
            Err(TransportError::Disconnected)
        ));
    }
}
