//! Source addresses of incoming handshake messages
//!
//! The transport layer hands the claimed source address of every message to the checker. Two
//! fixed byte layouts are derived from it: the input to the cookie hash (address and port) and
//! the rate limiter key (address only, IPv6 truncated to a configurable prefix).

use std::fmt;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};

use rampart_constant_time::memcmp;

/// The address a handshake message claims to come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceAddr {
    V4(SocketAddrV4),
    V6(SocketAddrV6),
    /// Any other address family; such sources never obtain a valid cookie and are always
    /// denied by the rate limiter
    Unsupported,
}

impl From<SocketAddr> for SourceAddr {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(a) => Self::V4(a),
            SocketAddr::V6(a) => Self::V6(a),
        }
    }
}

impl From<SocketAddrV4> for SourceAddr {
    fn from(addr: SocketAddrV4) -> Self {
        Self::V4(addr)
    }
}

impl From<SocketAddrV6> for SourceAddr {
    fn from(addr: SocketAddrV6) -> Self {
        Self::V6(addr)
    }
}

impl fmt::Display for SourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(a) => write!(f, "{a}"),
            Self::V6(a) => write!(f, "{a}"),
            Self::Unsupported => f.write_str("<unsupported address family>"),
        }
    }
}

/// Longest cookie input: an IPv6 address followed by a port
const MAX_COOKIE_INPUT_LEN: usize = 16 + 2;

/// Canonical byte layout of an address and port: `ip || port`, port in network byte order
#[derive(Clone, Copy, Debug)]
pub struct CookieInput {
    buf: [u8; MAX_COOKIE_INPUT_LEN],
    len: usize,
}

impl CookieInput {
    fn new(ip: &[u8], port: u16) -> Self {
        let mut buf = [0u8; MAX_COOKIE_INPUT_LEN];
        buf[..ip.len()].copy_from_slice(ip);
        buf[ip.len()..ip.len() + 2].copy_from_slice(&port.to_be_bytes());
        Self {
            buf,
            len: ip.len() + 2,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl SourceAddr {
    /// The bytes a cookie is derived from; `None` for unsupported address families
    ///
    /// ```
    /// use std::net::SocketAddr;
    /// use rampart::address::SourceAddr;
    ///
    /// let addr: SourceAddr = "192.0.2.7:4660".parse::<SocketAddr>()?.into();
    /// let input = addr.cookie_input().unwrap();
    /// assert_eq!(input.as_slice(), &[192, 0, 2, 7, 0x12, 0x34]);
    ///
    /// assert!(SourceAddr::Unsupported.cookie_input().is_none());
    /// # Ok::<(), std::net::AddrParseError>(())
    /// ```
    pub fn cookie_input(&self) -> Option<CookieInput> {
        match self {
            Self::V4(a) => Some(CookieInput::new(&a.ip().octets(), a.port())),
            Self::V6(a) => Some(CookieInput::new(&a.ip().octets(), a.port())),
            Self::Unsupported => None,
        }
    }
}

/// Address family tag mixed into the rate limiter slot hash
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrFamily {
    V4 = 4,
    V6 = 6,
}

/// Fixed width rate limiter key: the family and up to 16 address bytes, zero padded
///
/// Ports are ignored. IPv6 addresses keep only their first `ipv6_prefix_bytes` bytes so hosts
/// sharing a prefix share a token bucket.
#[derive(Clone, Copy, Debug)]
pub struct AddrKey {
    family: AddrFamily,
    bytes: [u8; 16],
}

impl AddrKey {
    pub fn new(addr: &SourceAddr, ipv6_prefix_bytes: usize) -> Option<Self> {
        let mut bytes = [0u8; 16];
        let family = match addr {
            SourceAddr::V4(a) => {
                bytes[..4].copy_from_slice(&a.ip().octets());
                AddrFamily::V4
            }
            SourceAddr::V6(a) => {
                let prefix = ipv6_prefix_bytes.min(16);
                bytes[..prefix].copy_from_slice(&a.ip().octets()[..prefix]);
                AddrFamily::V6
            }
            SourceAddr::Unsupported => return None,
        };
        Some(Self { family, bytes })
    }

    pub fn family(&self) -> AddrFamily {
        self.family
    }

    pub fn bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Compares two keys without leaking which address bytes differ
    pub fn ct_eq(&self, other: &Self) -> bool {
        (self.family == other.family) & memcmp(&self.bytes, &other.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn v6(s: &str, port: u16) -> SourceAddr {
        SocketAddrV6::new(s.parse::<Ipv6Addr>().unwrap(), port, 0, 0).into()
    }

    #[test]
    fn cookie_input_includes_port() {
        let a: SourceAddr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 1).into();
        let b: SourceAddr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 2).into();
        assert_ne!(
            a.cookie_input().unwrap().as_slice(),
            b.cookie_input().unwrap().as_slice()
        );

        let c = v6("2001:db8::1", 0xabcd);
        let input = c.cookie_input().unwrap();
        assert_eq!(input.as_slice().len(), 18);
        assert_eq!(&input.as_slice()[16..], &[0xab, 0xcd]);
    }

    #[test]
    fn rate_limiter_key_ignores_port_and_masks_ipv6() {
        let a = AddrKey::new(&v6("2001:db8:1:2::1", 1), 8).unwrap();
        let b = AddrKey::new(&v6("2001:db8:1:2:ffff::9", 2), 8).unwrap();
        let c = AddrKey::new(&v6("2001:db8:1:3::1", 1), 8).unwrap();
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
        assert_eq!(&a.bytes()[8..], &[0u8; 8]);

        // A full width prefix tells the hosts apart again
        let a = AddrKey::new(&v6("2001:db8:1:2::1", 1), 16).unwrap();
        let b = AddrKey::new(&v6("2001:db8:1:2:ffff::9", 2), 16).unwrap();
        assert!(!a.ct_eq(&b));
    }

    #[test]
    fn families_never_collide() {
        // 10.0.0.1 and a00:1:: share their bytes once padded
        let v4 = AddrKey::new(
            &SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 0).into(),
            16,
        )
        .unwrap();
        let mut octets = [0u8; 16];
        octets[..4].copy_from_slice(&[10, 0, 0, 1]);
        let v6 = AddrKey::new(
            &SocketAddrV6::new(Ipv6Addr::from(octets), 0, 0, 0).into(),
            16,
        )
        .unwrap();
        assert_eq!(v4.bytes(), v6.bytes());
        assert!(!v4.ct_eq(&v6));
    }

    #[test]
    fn unsupported_family_has_no_key() {
        assert!(AddrKey::new(&SourceAddr::Unsupported, 8).is_none());
        assert_eq!(
            SourceAddr::Unsupported.to_string(),
            "<unsupported address family>"
        );
    }
}
