//! Socket utilities for mDNS.
//!
//! This module provides [`MulticastSocket`], a builder for creating
//! properly configured UDP sockets joined to the mDNS multicast group.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::{MDNS_MULTICAST_IPV4, MDNS_MULTICAST_IPV6, MDNS_PORT};

/// A builder for multicast UDP sockets suitable for mDNS.
///
/// The resulting socket is:
///
/// - Bound to the mDNS port with `SO_REUSEADDR` enabled (and `SO_REUSEPORT`
///   on supported platforms, so other mDNS stacks can coexist)
/// - Set to non-blocking mode for async compatibility
/// - Joined to the mDNS multicast group of its address family
#[derive(Debug, Clone)]
pub(crate) struct MulticastSocket {
    ipv6: bool,
    interface_v4: Option<Ipv4Addr>,
    interface_index: Option<u32>,
}

impl MulticastSocket {
    /// Creates a builder for an IPv4 multicast socket.
    pub(crate) fn v4() -> Self {
        Self {
            ipv6: false,
            interface_v4: None,
            interface_index: None,
        }
    }

    /// Creates a builder for an IPv6 multicast socket.
    pub(crate) fn v6() -> Self {
        Self {
            ipv6: true,
            interface_v4: None,
            interface_index: None,
        }
    }

    /// Sets the IPv4 network interface to join the multicast group on.
    ///
    /// If not set, the group is joined on all interfaces (`INADDR_ANY`).
    pub(crate) fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface_v4 = Some(interface);
        self
    }

    /// Sets the network interface index to join the IPv6 multicast group
    /// on. Index 0 lets the kernel pick an interface.
    pub(crate) fn with_interface_index(mut self, index: u32) -> Self {
        self.interface_index = Some(index);
        self
    }

    /// Converts this builder into a configured `std::net::UdpSocket`.
    ///
    /// # Errors
    ///
    /// Returns an error if socket creation, socket options, binding, or
    /// joining the multicast group fails.
    pub(crate) fn into_std(self) -> io::Result<UdpSocket> {
        let domain = if self.ipv6 { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

        // Allow sharing the mDNS port with other processes.
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket.set_reuse_port(true)?;

        // Set non-blocking mode for async compatibility.
        socket.set_nonblocking(true)?;

        if self.ipv6 {
            socket.set_only_v6(true)?;

            let local_addr = if cfg!(target_os = "linux") {
                IpAddr::V6(MDNS_MULTICAST_IPV6)
            } else {
                // Binding the group address only works on Linux; elsewhere
                // the wildcard address has to do.
                IpAddr::V6(Ipv6Addr::UNSPECIFIED)
            };
            socket.bind(&SocketAddr::new(local_addr, MDNS_PORT).into())?;

            socket.join_multicast_v6(&MDNS_MULTICAST_IPV6, self.interface_index.unwrap_or(0))?;
        } else {
            let local_addr = if cfg!(target_os = "linux") {
                IpAddr::V4(MDNS_MULTICAST_IPV4)
            } else {
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            };
            socket.bind(&SocketAddr::new(local_addr, MDNS_PORT).into())?;

            let interface = self.interface_v4.unwrap_or(Ipv4Addr::UNSPECIFIED);
            socket.join_multicast_v4(&MDNS_MULTICAST_IPV4, &interface)?;
        }

        Ok(socket.into())
    }
}
