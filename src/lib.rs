//! # dnssd
//!
//! A client-side implementation of DNS-SD (DNS-based Service Discovery,
//! [RFC 6763]) over multicast DNS ([RFC 6762]) for Rust.
//!
//! The resolver listens for mDNS traffic on a set of local network
//! interfaces, issues the queries needed to resolve browsed service
//! types, and maintains a TTL-aware cache of the received records. A
//! service instance becomes visible to the application once its PTR, SRV,
//! and TXT records plus at least one address record for the SRV target
//! are all cached at the same time.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dnssd::{Resolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> dnssd::Result<()> {
//!     // Listen on every non-loopback interface, both address families.
//!     let resolver = Resolver::new(ResolverConfig::default()).await?;
//!
//!     // Start browsing for a service type.
//!     resolver.browse("_http._tcp.local.").await?;
//!
//!     // Give the network a moment to answer, then read a snapshot.
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     for instance in resolver.resolved_instances().await? {
//!         println!(
//!             "{} at {}:{}",
//!             instance.instance_name, instance.address, instance.port
//!         );
//!     }
//!
//!     resolver.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//!
//! All resolver state is owned by a single event-loop task; the facade
//! only exchanges messages with it. Browse requests are fire-and-forget,
//! reads are request/response, and a read issued after a browse is
//! guaranteed to observe the browse's effect. Nothing in the steady state
//! is fatal: send failures, undecodable datagrams, and malformed records
//! are logged and dropped, and the affected questions are retried on the
//! next refresh tick.
//!
//! [RFC 6762]: https://datatracker.ietf.org/doc/html/rfc6762
//! [RFC 6763]: https://datatracker.ietf.org/doc/html/rfc6763

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod message;
pub(crate) mod net;
pub(crate) mod pipeline;
pub(crate) mod question;
pub(crate) mod record;
pub(crate) mod resolver;
pub(crate) mod socket;

use std::collections::HashMap;
use std::net::IpAddr;

use tokio::sync::{mpsc, oneshot};

pub use config::{
    AddrFamily, ResolverConfig, MDNS_DEST_ADDR_IPV4, MDNS_DEST_ADDR_IPV6, MDNS_MULTICAST_IPV4,
    MDNS_MULTICAST_IPV6, MDNS_PORT,
};
pub use error::{Error, Result};

use config::{ANSWER_CHANNEL_CAPACITY, COMMAND_CHANNEL_CAPACITY, DATAGRAM_CHANNEL_CAPACITY};
use net::NetClient;
use resolver::{Command, ResolverLoop};

/// A fully resolved service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    /// An address the instance is reachable at. An instance advertising
    /// several addresses resolves once per address.
    pub address: IpAddr,
    /// The full instance name, e.g. `printer._http._tcp.local.`.
    pub instance_name: String,
    /// The port the service listens on.
    pub port: u16,
    /// The service name, e.g. `_http._tcp.local.`.
    pub service_name: String,
    /// Key-value attributes from the instance's TXT record.
    pub text_records: HashMap<String, String>,
}

/// Browses for services advertised on the local network via mDNS.
///
/// Dropping the resolver shuts it down just like [`Resolver::close`].
pub struct Resolver {
    command_tx: mpsc::Sender<Command>,
    shutdown_tx: mpsc::Sender<()>,
}

impl Resolver {
    /// Creates a new resolver listening for mDNS messages on the
    /// interfaces and address families in `config`.
    ///
    /// This opens the multicast listeners and the unicast query sockets,
    /// and launches the wire pipeline and the resolver loop. Construction
    /// fails if any socket cannot be opened; nothing after construction
    /// surfaces errors to the caller.
    pub async fn new(config: ResolverConfig) -> Result<Resolver> {
        let (datagram_tx, datagram_rx) = mpsc::channel(DATAGRAM_CHANNEL_CAPACITY);
        let net = NetClient::new(config.addr_family, &config.interfaces, datagram_tx).await?;

        let (answer_tx, answer_rx) = mpsc::channel(ANSWER_CHANNEL_CAPACITY);
        pipeline::spawn(datagram_rx, answer_tx);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        tokio::spawn(ResolverLoop::new(net, answer_rx, command_rx, shutdown_rx).run());

        Ok(Resolver {
            command_tx,
            shutdown_tx,
        })
    }

    /// Starts browsing for instances of the given service, e.g.
    /// `_http._tcp.local.`. Browsing for a service already being browsed
    /// is a no-op.
    ///
    /// The request is queued for the resolver loop; instances appear in
    /// subsequent [`resolved_instances`](Resolver::resolved_instances)
    /// snapshots as advertisers answer.
    pub async fn browse(&self, service_name: &str) -> Result<()> {
        self.command_tx
            .send(Command::Browse(with_trailing_dot(service_name)))
            .await
            .map_err(|_| Error::ErrResolverClosed)
    }

    /// Returns a snapshot of every fully resolved service instance.
    ///
    /// The snapshot is consistent with the resolver loop's state at the
    /// moment it services the request; ordering is unspecified but stable
    /// within one snapshot.
    pub async fn resolved_instances(&self) -> Result<Vec<ServiceInstance>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Read(reply_tx))
            .await
            .map_err(|_| Error::ErrResolverClosed)?;
        reply_rx.await.map_err(|_| Error::ErrResolverClosed)
    }

    /// Returns a snapshot of the resolved instances of one service.
    pub async fn resolved_instances_for_service(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>> {
        let service_name = with_trailing_dot(service_name);
        Ok(self
            .resolved_instances()
            .await?
            .into_iter()
            .filter(|instance| instance.service_name == service_name)
            .collect())
    }

    /// Shuts the resolver down, closing its sockets and stopping its
    /// tasks. Idempotent; calls after the first are no-ops.
    pub fn close(&self) {
        let _ = self.shutdown_tx.try_send(());
    }
}

// with_trailing_dot canonicalizes a service name to the trailing-dot form
// carried by DNS records.
fn with_trailing_dot(name: &str) -> String {
    if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{name}.")
    }
}
