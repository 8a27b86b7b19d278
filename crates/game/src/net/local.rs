use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, UdpSocket};

/// Addresses that identify this host; traffic from them is our own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalAddresses {
    addrs: HashSet<IpAddr>,
}

impl LocalAddresses {
    /// Loopback plus the address the host uses for outbound traffic.
    pub fn detect() -> Self {
        let mut addrs = HashSet::from([
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ]);
        match outbound_ipv4() {
            Some(ip) => {
                addrs.insert(IpAddr::V4(ip));
            }
            None => log::warn!("could not detect outbound address, only loopback is local"),
        }
        Self { addrs }
    }

    /// An empty set: every peer counts as remote.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addrs: addrs.into_iter().collect(),
        }
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addrs.contains(ip)
    }
}

/// Connecting a UDP socket sends nothing but makes the OS pick the
/// interface it would route through.
pub fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
