use std::any::Any;
use std::collections::HashMap;

use super::super::packer::*;
use super::super::RecordType;
use super::ResourceBody;
use crate::error::Result;

/// The payload of an A record: four bytes of IPv4 address.
#[derive(Default, Debug)]
pub(crate) struct AResource {
    pub(crate) a: [u8; 4],
}

impl ResourceBody for AResource {
    fn real_type(&self) -> RecordType {
        RecordType::A
    }

    fn pack(
        &self,
        msg: Vec<u8>,
        _compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        Ok(pack_bytes(msg, &self.a))
    }

    fn unpack(&mut self, msg: &[u8], off: usize, _length: usize) -> Result<usize> {
        unpack_bytes(msg, off, &mut self.a)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
