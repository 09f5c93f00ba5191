use std::any::Any;
use std::collections::HashMap;

use super::super::packer::*;
use super::super::RecordType;
use super::ResourceBody;
use crate::error::*;

/// The payload of a TXT record: a sequence of length-prefixed character
/// strings, which DNS-SD uses for `key=value` attributes.
#[derive(Default, Debug)]
pub(crate) struct TxtResource {
    pub(crate) txt: Vec<String>,
}

impl ResourceBody for TxtResource {
    fn real_type(&self) -> RecordType {
        RecordType::Txt
    }

    fn pack(
        &self,
        mut msg: Vec<u8>,
        _compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        for s in &self.txt {
            msg = pack_str(msg, s)?;
        }
        Ok(msg)
    }

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize> {
        let end = off + length;
        let mut strings = vec![];
        let mut off = off;
        // The strings must consume the record data exactly.
        while off < end {
            let (s, next) = unpack_str(msg, off)?;
            if next > end {
                return Err(Error::ErrCalcLen);
            }
            strings.push(s);
            off = next;
        }
        self.txt = strings;
        Ok(off)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
