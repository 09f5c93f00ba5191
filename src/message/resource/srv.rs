use std::any::Any;
use std::collections::HashMap;

use super::super::name::Name;
use super::super::packer::*;
use super::super::RecordType;
use super::ResourceBody;
use crate::error::Result;

/// The payload of an SRV record: where a service instance lives.
#[derive(Default, Debug)]
pub(crate) struct SrvResource {
    pub(crate) priority: u16,
    pub(crate) weight: u16,
    pub(crate) port: u16,
    pub(crate) target: Name,
}

impl ResourceBody for SrvResource {
    fn real_type(&self) -> RecordType {
        RecordType::Srv
    }

    fn pack(
        &self,
        msg: Vec<u8>,
        _compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        let msg = pack_uint16(msg, self.priority);
        let msg = pack_uint16(msg, self.weight);
        let msg = pack_uint16(msg, self.port);
        // The target must be packed uncompressed (RFC 2782).
        self.target.pack(msg, &mut None)
    }

    fn unpack(&mut self, msg: &[u8], mut off: usize, _length: usize) -> Result<usize> {
        (self.priority, off) = unpack_uint16(msg, off)?;
        (self.weight, off) = unpack_uint16(msg, off)?;
        (self.port, off) = unpack_uint16(msg, off)?;
        // Accept compressed targets anyway; real-world mDNS responders
        // compress them despite RFC 2782.
        self.target.unpack(msg, off)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
