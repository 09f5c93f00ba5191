pub(crate) mod a;
pub(crate) mod aaaa;
pub(crate) mod ptr;
pub(crate) mod srv;
pub(crate) mod txt;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use a::AResource;
use aaaa::AaaaResource;
use ptr::PtrResource;
use srv::SrvResource;
use txt::TxtResource;

use super::name::Name;
use super::packer::*;
use super::RecordType;
use crate::error::*;

/// A DNS resource record. Records of types the resolver does not model
/// keep their header but carry no body.
#[derive(Default, Debug)]
pub(crate) struct Resource {
    pub(crate) header: ResourceHeader,
    pub(crate) body: Option<Box<dyn ResourceBody>>,
}

impl Resource {
    // pack appends the wire format of the record: header first, then the
    // body, then the header's length word patched to the body size.
    pub(crate) fn pack(
        &mut self,
        msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        let body = self.body.as_ref().ok_or(Error::ErrNilResourceBody)?;
        self.header.typ = body.real_type();

        let (mut msg, len_off) = self.header.pack(msg, compression)?;
        let pre_len = msg.len();
        msg = body.pack(msg, compression)?;
        self.header.fix_len(&mut msg, len_off, pre_len)?;
        Ok(msg)
    }

    // skip advances past one record without decoding its data.
    pub(crate) fn skip(msg: &[u8], off: usize) -> Result<usize> {
        let off = Name::skip(msg, off)?;
        let off = skip_uint16(msg, off)?; // type
        let off = skip_uint16(msg, off)?; // class
        let off = skip_uint32(msg, off)?; // ttl
        let (length, off) = unpack_uint16(msg, off)?;
        let end = off + length as usize;
        if end > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        Ok(end)
    }
}

/// The fields every resource record starts with, shared by all types.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(crate) struct ResourceHeader {
    /// The name the record belongs to.
    pub(crate) name: Name,

    /// The record type. Derived from the body while packing.
    pub(crate) typ: RecordType,

    /// The raw class word: class IN in the low bits, the cache-flush
    /// flag in the top bit.
    pub(crate) class: u16,

    /// Time to live, in seconds.
    pub(crate) ttl: u32,

    /// Byte length of the record data after this header. Computed while
    /// packing.
    pub(crate) length: u16,
}

impl ResourceHeader {
    // pack appends the header and returns the offset of its length word,
    // so the caller can patch it once the body size is known.
    pub(crate) fn pack(
        &self,
        msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<(Vec<u8>, usize)> {
        let msg = self.name.pack(msg, compression)?;
        let msg = pack_uint16(msg, self.typ.to_wire());
        let msg = pack_uint16(msg, self.class);
        let mut msg = pack_uint32(msg, self.ttl);
        let len_off = msg.len();
        msg = pack_uint16(msg, self.length);
        Ok((msg, len_off))
    }

    pub(crate) fn unpack(&mut self, msg: &[u8], off: usize) -> Result<usize> {
        let off = self.name.unpack(msg, off)?;
        let (typ, off) = unpack_uint16(msg, off)?;
        self.typ = RecordType::from_wire(typ);
        let (class, off) = unpack_uint16(msg, off)?;
        self.class = class;
        let (ttl, off) = unpack_uint32(msg, off)?;
        self.ttl = ttl;
        let (length, off) = unpack_uint16(msg, off)?;
        self.length = length;
        Ok(off)
    }

    // fix_len patches the length word at len_off with the size of the
    // body that was packed starting at pre_len.
    pub(crate) fn fix_len(&mut self, msg: &mut [u8], len_off: usize, pre_len: usize) -> Result<()> {
        let body_len = msg.len() - pre_len;
        if body_len > u16::MAX as usize {
            return Err(Error::ErrResTooLong);
        }
        msg[len_off..len_off + 2].copy_from_slice(&(body_len as u16).to_be_bytes());
        self.length = body_len as u16;
        Ok(())
    }
}

/// The typed payload of a resource record.
pub(crate) trait ResourceBody: fmt::Debug + Send + Sync {
    // real_type reports which record type the body encodes; it is filled
    // into the header while packing.
    fn real_type(&self) -> RecordType;

    fn pack(
        &self,
        msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>>;

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize>;

    fn as_any(&self) -> &dyn Any;
}

// unpack_resource_body parses record data of the given type. Types
// without a model here are skipped over by their length and yield no
// body.
pub(crate) fn unpack_resource_body(
    typ: RecordType,
    msg: &[u8],
    off: usize,
    length: usize,
) -> Result<(Option<Box<dyn ResourceBody>>, usize)> {
    let mut body: Box<dyn ResourceBody> = match typ {
        RecordType::A => Box::<AResource>::default(),
        RecordType::Aaaa => Box::<AaaaResource>::default(),
        RecordType::Ptr => Box::<PtrResource>::default(),
        RecordType::Srv => Box::<SrvResource>::default(),
        RecordType::Txt => Box::<TxtResource>::default(),
        RecordType::Other => {
            let end = off + length;
            if end > msg.len() {
                return Err(Error::ErrResourceLen);
            }
            return Ok((None, end));
        }
    };

    let off = body.unpack(msg, off, length)?;
    Ok((Some(body), off))
}
