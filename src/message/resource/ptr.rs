use std::any::Any;
use std::collections::HashMap;

use super::super::name::Name;
use super::super::RecordType;
use super::ResourceBody;
use crate::error::Result;

/// The payload of a PTR record: the name pointed at. For DNS-SD that is
/// the instance name a service name maps to.
#[derive(Default, Debug)]
pub(crate) struct PtrResource {
    pub(crate) ptr: Name,
}

impl ResourceBody for PtrResource {
    fn real_type(&self) -> RecordType {
        RecordType::Ptr
    }

    fn pack(
        &self,
        msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        self.ptr.pack(msg, compression)
    }

    fn unpack(&mut self, msg: &[u8], off: usize, _length: usize) -> Result<usize> {
        self.ptr.unpack(msg, off)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
