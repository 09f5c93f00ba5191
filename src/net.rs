//! The network client: multicast listeners, unicast query sockets, and
//! the listener tasks feeding the wire pipeline.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use bytes::BytesMut;
use if_addrs::Interface;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::config::{
    AddrFamily, MAX_DATAGRAM_SIZE, MDNS_DEST_ADDR_IPV4, MDNS_DEST_ADDR_IPV6,
};
use crate::error::Result;
use crate::message::header::Header;
use crate::message::name::Name;
use crate::message::{Message, Question as WireQuestion};
use crate::question::Question;
use crate::socket::MulticastSocket;

/// Access to sending and receiving mDNS messages.
///
/// A `NetClient` owns one multicast listener per interface and address
/// family, plus one unicast socket per address family used for sending
/// queries and receiving their replies. Every socket has a listener task
/// writing raw datagrams into the shared pipeline channel.
pub(crate) struct NetClient {
    unicast_v4: Vec<Arc<UdpSocket>>,
    unicast_v6: Vec<Arc<UdpSocket>>,
    shutdown_txs: Vec<mpsc::Sender<()>>,
    listener_tasks: Vec<JoinHandle<()>>,
}

impl NetClient {
    /// Creates a network client listening for mDNS messages on the given
    /// interfaces and address families. Fails if any socket cannot be
    /// opened; sockets opened so far are released through their dropped
    /// shutdown channels.
    pub(crate) async fn new(
        addr_family: AddrFamily,
        interfaces: &[Interface],
        datagram_tx: mpsc::Sender<BytesMut>,
    ) -> Result<Self> {
        let mut client = NetClient {
            unicast_v4: Vec::new(),
            unicast_v6: Vec::new(),
            shutdown_txs: Vec::new(),
            listener_tasks: Vec::new(),
        };

        if addr_family.includes_ipv4() {
            // One multicast membership per interface; if_addrs reports one
            // entry per address, so join on the first IPv4 address only.
            let mut joined = HashSet::new();
            for interface in interfaces {
                let addr = match interface.ip() {
                    IpAddr::V4(addr) => addr,
                    IpAddr::V6(_) => continue,
                };
                if !joined.insert(interface.name.clone()) {
                    continue;
                }

                let socket = MulticastSocket::v4().with_interface(addr).into_std()?;
                let socket = Arc::new(UdpSocket::from_std(socket)?);
                client.spawn_listener(socket, datagram_tx.clone());
            }

            let socket = Arc::new(UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?);
            client.spawn_listener(Arc::clone(&socket), datagram_tx.clone());
            client.unicast_v4.push(socket);
        }

        if addr_family.includes_ipv6() {
            let mut joined = HashSet::new();
            for interface in interfaces {
                if !matches!(interface.ip(), IpAddr::V6(_)) {
                    continue;
                }
                // IPv6 group membership is per interface index.
                let index = match interface.index {
                    Some(index) if index != 0 => index,
                    _ => continue,
                };
                if !joined.insert(index) {
                    continue;
                }

                let socket = MulticastSocket::v6().with_interface_index(index).into_std()?;
                let socket = Arc::new(UdpSocket::from_std(socket)?);
                client.spawn_listener(socket, datagram_tx.clone());
            }

            let socket = Arc::new(UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0)).await?);
            client.spawn_listener(Arc::clone(&socket), datagram_tx.clone());
            client.unicast_v6.push(socket);
        }

        Ok(client)
    }

    /// Packs the given questions into a single DNS query and multicasts it
    /// from every unicast socket of the matching address family.
    ///
    /// Per-socket send failures are logged; the transport is best-effort
    /// and unanswered questions are retried on the next refresh tick.
    pub(crate) async fn send_questions(&self, questions: &HashSet<Question>) -> Result<()> {
        let mut wire_questions = Vec::with_capacity(questions.len());
        for question in questions {
            wire_questions.push(WireQuestion {
                name: Name::new(&question.name)?,
                typ: question.kind.record_type(),
            });
        }

        let mut msg = Message {
            header: Header::default(),
            questions: wire_questions,
            ..Default::default()
        };
        let raw = msg.pack()?;

        log::trace!("sending mDNS query with {} question(s)", questions.len());
        for socket in &self.unicast_v4 {
            if let Err(err) = socket.send_to(&raw, MDNS_DEST_ADDR_IPV4).await {
                log::warn!("failed sending mDNS query over IPv4: {err}");
            }
        }
        for socket in &self.unicast_v6 {
            if let Err(err) = socket.send_to(&raw, MDNS_DEST_ADDR_IPV6).await {
                log::warn!("failed sending mDNS query over IPv6: {err}");
            }
        }

        Ok(())
    }

    /// Signals every listener task to exit and waits for them, then
    /// releases the sockets.
    pub(crate) async fn close(&mut self) {
        for shutdown_tx in self.shutdown_txs.drain(..) {
            let _ = shutdown_tx.send(()).await;
        }
        for task in self.listener_tasks.drain(..) {
            let _ = task.await;
        }
        self.unicast_v4.clear();
        self.unicast_v6.clear();
    }

    // spawn_listener starts a task reading datagrams from the socket into
    // the shared pipeline channel. The task checks its shutdown channel
    // after every read, so socket-close races just end the task.
    fn spawn_listener(&mut self, socket: Arc<UdpSocket>, datagram_tx: mpsc::Sender<BytesMut>) {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => return,
                    result = socket.recv_from(&mut buf) => {
                        let n = match result {
                            Ok((n, _src)) => n,
                            Err(err) => {
                                log::warn!("failed to read from UDP socket: {err}");
                                continue;
                            }
                        };
                        match datagram_tx.try_send(BytesMut::from(&buf[..n])) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                // Best-effort transport; shed load rather
                                // than block the socket.
                                log::debug!("dropping datagram: pipeline busy");
                            }
                            Err(TrySendError::Closed(_)) => return,
                        }
                    }
                }
            }
        });

        self.shutdown_txs.push(shutdown_tx);
        self.listener_tasks.push(task);
    }
}
