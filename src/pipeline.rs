//! The wire pipeline: filters and transforms received datagrams into
//! typed answer batches for the resolver loop.

use bytes::BytesMut;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::message::parser::Parser;
use crate::message::resource::a::AResource;
use crate::message::resource::aaaa::AaaaResource;
use crate::message::resource::ptr::PtrResource;
use crate::message::resource::srv::SrvResource;
use crate::message::resource::txt::TxtResource;
use crate::message::resource::Resource;
use crate::message::RecordType;
use crate::record::{AddressRecord, PointerRecord, ServiceRecord, TextRecord};

/// Every resource record of interest extracted from a single response
/// datagram. The resolver loop applies a batch to the cache as a unit.
#[derive(Debug, Default)]
pub(crate) struct AnswerSet {
    pub(crate) addresses: Vec<AddressRecord>,
    pub(crate) pointers: Vec<PointerRecord>,
    pub(crate) services: Vec<ServiceRecord>,
    pub(crate) texts: Vec<TextRecord>,
}

impl AnswerSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.addresses.is_empty()
            && self.pointers.is_empty()
            && self.services.is_empty()
            && self.texts.is_empty()
    }
}

/// Spawns the pipeline task. It exits when every datagram sender is gone.
pub(crate) fn spawn(
    datagram_rx: mpsc::Receiver<BytesMut>,
    answer_tx: mpsc::Sender<AnswerSet>,
) -> JoinHandle<()> {
    tokio::spawn(pipe_messages(datagram_rx, answer_tx))
}

async fn pipe_messages(mut datagram_rx: mpsc::Receiver<BytesMut>, answer_tx: mpsc::Sender<AnswerSet>) {
    while let Some(datagram) = datagram_rx.recv().await {
        let batch = match decode_answers(&datagram) {
            Ok(Some(batch)) => batch,
            // Not a response, or a response carrying nothing of interest.
            Ok(None) => continue,
            Err(err) => {
                log::debug!("dropping undecodable datagram: {err}");
                continue;
            }
        };

        if answer_tx.send(batch).await.is_err() {
            // The resolver loop is gone.
            return;
        }
    }
}

// decode_answers parses a datagram and extracts every record of interest
// from its answer and additional sections.
fn decode_answers(datagram: &[u8]) -> Result<Option<AnswerSet>> {
    let mut parser = Parser::default();
    let header = parser.start(datagram)?;
    if !header.response {
        return Ok(None);
    }
    parser.skip_all_questions()?;

    let mut batch = AnswerSet::default();
    for resource in parser.all_answers()? {
        collect_resource(&mut batch, &resource);
    }
    parser.skip_all_authorities()?;
    for resource in parser.all_additionals()? {
        collect_resource(&mut batch, &resource);
    }

    if batch.is_empty() {
        Ok(None)
    } else {
        Ok(Some(batch))
    }
}

fn collect_resource(batch: &mut AnswerSet, resource: &Resource) {
    let body = match &resource.body {
        Some(body) => body.as_any(),
        None => return,
    };
    let header = &resource.header;

    match header.typ {
        RecordType::A => {
            if let Some(a) = body.downcast_ref::<AResource>() {
                batch.addresses.push(AddressRecord::from_a(header, a));
            }
        }
        RecordType::Aaaa => {
            if let Some(aaaa) = body.downcast_ref::<AaaaResource>() {
                batch.addresses.push(AddressRecord::from_aaaa(header, aaaa));
            }
        }
        RecordType::Ptr => {
            if let Some(ptr) = body.downcast_ref::<PtrResource>() {
                batch.pointers.push(PointerRecord::from_ptr(header, ptr));
            }
        }
        RecordType::Srv => {
            if let Some(srv) = body.downcast_ref::<SrvResource>() {
                batch.services.push(ServiceRecord::from_srv(header, srv));
            }
        }
        RecordType::Txt => {
            if let Some(txt) = body.downcast_ref::<TxtResource>() {
                batch.texts.push(TextRecord::from_txt(header, txt));
            }
        }
        RecordType::Other => {}
    }
}
