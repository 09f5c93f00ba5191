use std::any::Any;
use std::collections::HashMap;

use super::super::packer::*;
use super::super::RecordType;
use super::ResourceBody;
use crate::error::Result;

/// The payload of an AAAA record: sixteen bytes of IPv6 address.
#[derive(Default, Debug)]
pub(crate) struct AaaaResource {
    pub(crate) aaaa: [u8; 16],
}

impl ResourceBody for AaaaResource {
    fn real_type(&self) -> RecordType {
        RecordType::Aaaa
    }

    fn pack(
        &self,
        msg: Vec<u8>,
        _compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        Ok(pack_bytes(msg, &self.aaaa))
    }

    fn unpack(&mut self, msg: &[u8], off: usize, _length: usize) -> Result<usize> {
        unpack_bytes(msg, off, &mut self.aaaa)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
