use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bytes::BytesMut;
use tokio::task::JoinHandle;

use super::*;
use crate::config::AddrFamily;
use crate::record::{AddressRecord, PointerRecord, RecordHeader, ServiceRecord, TextRecord};

const INSTANCE: &str = "test instance._test_service._tcp.local.";
const SERVICE: &str = "_test_service._tcp.local.";
const HOST: &str = "test_host.local.";
const IP: IpAddr = IpAddr::V4(Ipv4Addr::new(172, 16, 6, 0));

struct LoopHarness {
    answer_tx: mpsc::Sender<AnswerSet>,
    command_tx: mpsc::Sender<Command>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
    // Held so the listener tasks keep a live pipeline channel.
    _datagram_rx: mpsc::Receiver<BytesMut>,
}

async fn start_loop() -> LoopHarness {
    let (datagram_tx, datagram_rx) = mpsc::channel(8);
    let net = NetClient::new(AddrFamily::Ipv4, &[], datagram_tx)
        .await
        .expect("unicast socket should open");

    let (answer_tx, answer_rx) = mpsc::channel(8);
    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(ResolverLoop::new(net, answer_rx, command_rx, shutdown_rx).run());

    LoopHarness {
        answer_tx,
        command_tx,
        shutdown_tx,
        task,
        _datagram_rx: datagram_rx,
    }
}

async fn read_instances(command_tx: &mpsc::Sender<Command>) -> Vec<ServiceInstance> {
    let (reply_tx, reply_rx) = oneshot::channel();
    command_tx
        .send(Command::Read(reply_tx))
        .await
        .expect("loop should be running");
    reply_rx.await.expect("loop should reply")
}

// Answer batches and reads travel on different channels, so give the loop
// a few turns to apply a batch before asserting on the snapshot.
async fn read_instances_until(
    command_tx: &mpsc::Sender<Command>,
    count: usize,
) -> Vec<ServiceInstance> {
    for _ in 0..100 {
        let instances = read_instances(command_tx).await;
        if instances.len() == count {
            return instances;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("resolved instances never reached {count}");
}

fn header(ttl: u64) -> RecordHeader {
    RecordHeader {
        cache_flush: false,
        initial_ttl: Duration::from_secs(ttl),
        remaining_ttl: Duration::from_secs(ttl),
    }
}

fn resolvable_batch() -> AnswerSet {
    AnswerSet {
        addresses: vec![AddressRecord {
            address: IP,
            name: HOST.to_owned(),
            header: header(120),
        }],
        pointers: vec![PointerRecord {
            instance_name: INSTANCE.to_owned(),
            service_name: SERVICE.to_owned(),
            header: header(800),
        }],
        services: vec![ServiceRecord {
            instance_name: INSTANCE.to_owned(),
            port: 9871,
            service_name: SERVICE.to_owned(),
            target: HOST.to_owned(),
            header: header(120),
        }],
        texts: vec![TextRecord {
            instance_name: INSTANCE.to_owned(),
            service_name: SERVICE.to_owned(),
            values: [("hello".to_owned(), "world".to_owned())]
                .into_iter()
                .collect(),
            header: header(120),
        }],
    }
}

#[tokio::test]
async fn test_read_with_no_inputs_is_empty() {
    let harness = start_loop().await;

    let instances = read_instances(&harness.command_tx).await;
    assert!(instances.is_empty());

    harness.shutdown_tx.send(()).await.unwrap();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_answer_batch_resolves_instance() {
    let harness = start_loop().await;

    harness.answer_tx.send(resolvable_batch()).await.unwrap();

    let instances = read_instances_until(&harness.command_tx, 1).await;
    let instance = &instances[0];
    assert_eq!(instance.address, IP);
    assert_eq!(instance.instance_name, INSTANCE);
    assert_eq!(instance.port, 9871);
    assert_eq!(instance.service_name, SERVICE);
    assert_eq!(instance.text_records["hello"], "world");

    harness.shutdown_tx.send(()).await.unwrap();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_partial_batch_resolves_nothing() {
    let harness = start_loop().await;

    let mut batch = resolvable_batch();
    batch.texts.clear();
    harness.answer_tx.send(batch).await.unwrap();

    // Give the loop time to apply the batch, then confirm the partial
    // instance never surfaced.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(read_instances(&harness.command_tx).await.is_empty());

    // The missing family arriving later completes the join.
    let mut completion = AnswerSet::default();
    completion.texts = resolvable_batch().texts;
    harness.answer_tx.send(completion).await.unwrap();
    read_instances_until(&harness.command_tx, 1).await;

    harness.shutdown_tx.send(()).await.unwrap();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_read_after_browse_observes_browse() {
    let harness = start_loop().await;

    // Browse and read share a channel; the read is serviced strictly
    // after the browse and must not hang even though the browse triggers
    // a network send.
    harness
        .command_tx
        .send(Command::Browse(SERVICE.to_owned()))
        .await
        .unwrap();
    let instances = read_instances(&harness.command_tx).await;
    assert!(instances.is_empty());

    // Browsing the same service again is a no-op.
    harness
        .command_tx
        .send(Command::Browse(SERVICE.to_owned()))
        .await
        .unwrap();
    read_instances(&harness.command_tx).await;

    harness.shutdown_tx.send(()).await.unwrap();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_snapshot_order_is_stable() {
    let harness = start_loop().await;

    let mut batch = resolvable_batch();
    batch.addresses.push(AddressRecord {
        address: IpAddr::V4(Ipv4Addr::new(172, 16, 6, 197)),
        name: HOST.to_owned(),
        header: header(120),
    });
    harness.answer_tx.send(batch).await.unwrap();

    let first = read_instances_until(&harness.command_tx, 2).await;
    let second = read_instances(&harness.command_tx).await;
    assert_eq!(first, second);
    assert!(first[0].address < first[1].address);

    harness.shutdown_tx.send(()).await.unwrap();
    harness.task.await.unwrap();
}

#[tokio::test]
async fn test_dropping_channels_terminates_loop() {
    let harness = start_loop().await;

    drop(harness.answer_tx);
    drop(harness.command_tx);
    drop(harness.shutdown_tx);

    harness.task.await.unwrap();
}
