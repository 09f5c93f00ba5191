//! Configuration for the resolver.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use if_addrs::Interface;

/// The mDNS IPv4 multicast group address (RFC 6762).
pub const MDNS_MULTICAST_IPV4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The mDNS IPv6 multicast group address (RFC 6762).
pub const MDNS_MULTICAST_IPV6: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

/// The standard mDNS port (5353).
pub const MDNS_PORT: u16 = 5353;

/// mDNS IPv4 multicast destination address (224.0.0.251:5353).
pub const MDNS_DEST_ADDR_IPV4: SocketAddr =
    SocketAddr::new(IpAddr::V4(MDNS_MULTICAST_IPV4), MDNS_PORT);

/// mDNS IPv6 multicast destination address ([FF02::FB]:5353).
pub const MDNS_DEST_ADDR_IPV6: SocketAddr =
    SocketAddr::new(IpAddr::V6(MDNS_MULTICAST_IPV6), MDNS_PORT);

/// The largest accepted mDNS datagram (RFC 6762 Section 17).
pub(crate) const MAX_DATAGRAM_SIZE: usize = 9000;

/// Interval between refresh ticks of the resolver loop.
pub(crate) const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of the shared raw-datagram channel between the socket
/// listeners and the wire pipeline. Datagrams arriving while the channel
/// is full are dropped; mDNS is best-effort by design.
pub(crate) const DATAGRAM_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the answer-batch channel between the wire pipeline and the
/// resolver loop.
pub(crate) const ANSWER_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the facade's command channel.
pub(crate) const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// The address families on which to browse for services.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddrFamily {
    Ipv4,
    Ipv6,
    #[default]
    All,
}

impl AddrFamily {
    pub(crate) fn includes_ipv4(&self) -> bool {
        matches!(self, AddrFamily::Ipv4 | AddrFamily::All)
    }

    pub(crate) fn includes_ipv6(&self) -> bool {
        matches!(self, AddrFamily::Ipv6 | AddrFamily::All)
    }
}

/// Configuration for a [`Resolver`](crate::Resolver).
///
/// Use the builder pattern to construct a configuration:
///
/// ```rust
/// use dnssd::{AddrFamily, ResolverConfig};
///
/// let config = ResolverConfig::new().with_addr_family(AddrFamily::Ipv4);
/// ```
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The address families to listen and browse on.
    ///
    /// Default: [`AddrFamily::All`].
    pub addr_family: AddrFamily,

    /// The network interfaces to join the mDNS multicast group on.
    ///
    /// Default: every non-loopback interface of the host.
    pub interfaces: Vec<Interface>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            addr_family: AddrFamily::default(),
            interfaces: default_interfaces(),
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address families to listen and browse on.
    pub fn with_addr_family(mut self, addr_family: AddrFamily) -> Self {
        self.addr_family = addr_family;
        self
    }

    /// Set the network interfaces to join the mDNS multicast group on.
    ///
    /// An empty list opens no multicast listeners; only the unicast query
    /// sockets are created.
    pub fn with_interfaces(mut self, interfaces: Vec<Interface>) -> Self {
        self.interfaces = interfaces;
        self
    }
}

// default_interfaces enumerates the host's non-loopback interfaces.
fn default_interfaces() -> Vec<Interface> {
    if_addrs::get_if_addrs()
        .unwrap_or_default()
        .into_iter()
        .filter(|interface| !interface.is_loopback())
        .collect()
}
