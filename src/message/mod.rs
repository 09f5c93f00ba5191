#[cfg(test)]
mod message_test;

pub(crate) mod header;
pub(crate) mod name;
mod packer;
pub(crate) mod parser;
pub(crate) mod resource;

use std::collections::HashMap;

use header::{Header, WireHeader};
use name::Name;
use packer::*;
use parser::Parser;
use resource::Resource;

use crate::error::*;

// DNS wire constants, reduced to what DNS-SD resolution touches. mDNS
// traffic lives entirely in class IN, and a record's class field donates
// its top bit to the cache-flush flag (RFC 6762 Section 10.2).
pub(crate) const CLASS_IN: u16 = 1;
pub(crate) const CLASS_CACHE_FLUSH: u16 = 1 << 15;

// Packing starts from the classic 512-byte UDP DNS budget; the queries
// this resolver emits stay well under it.
const PACK_STARTING_CAP: usize = 512;

/// The resource record types service discovery is assembled from.
///
/// Anything else found on the wire decodes as `Other` and is parsed only
/// far enough to be skipped.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum RecordType {
    A,
    Aaaa,
    Ptr,
    Srv,
    Txt,
    #[default]
    Other,
}

impl RecordType {
    pub(crate) fn from_wire(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            12 => RecordType::Ptr,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            33 => RecordType::Srv,
            _ => RecordType::Other,
        }
    }

    // Other stands for every type this crate does not model. It is never
    // packed, so it maps to the reserved type code.
    pub(crate) fn to_wire(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ptr => 12,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Srv => 33,
            RecordType::Other => 0,
        }
    }
}

/// A single query: which name to ask about and which record type is
/// wanted. Everything this resolver sends or reads is class IN, so the
/// class exists only at the wire boundary.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub(crate) struct Question {
    pub(crate) name: Name,
    pub(crate) typ: RecordType,
}

impl Question {
    fn pack(
        &self,
        msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        let msg = self.name.pack(msg, compression)?;
        let msg = pack_uint16(msg, self.typ.to_wire());
        Ok(pack_uint16(msg, CLASS_IN))
    }
}

/// An entire DNS message: what this crate sends (queries carrying
/// questions) and what it receives (responses carrying records).
#[derive(Default, Debug)]
pub(crate) struct Message {
    pub(crate) header: Header,
    pub(crate) questions: Vec<Question>,
    pub(crate) answers: Vec<Resource>,
    pub(crate) authorities: Vec<Resource>,
    pub(crate) additionals: Vec<Resource>,
}

impl Message {
    /// Parses a whole message in one go.
    pub(crate) fn unpack(&mut self, msg: &[u8]) -> Result<()> {
        let mut parser = Parser::default();
        self.header = parser.start(msg)?;
        self.questions = parser.all_questions()?;
        self.answers = parser.all_answers()?;
        self.authorities = parser.all_authorities()?;
        self.additionals = parser.all_additionals()?;
        Ok(())
    }

    /// Serializes the message, name-compressing across every section.
    pub(crate) fn pack(&mut self) -> Result<Vec<u8>> {
        let wire_header = WireHeader {
            id: self.header.id,
            bits: self.header.wire_bits(),
            questions: section_count(self.questions.len(), Error::ErrTooManyQuestions)?,
            answers: section_count(self.answers.len(), Error::ErrTooManyAnswers)?,
            authorities: section_count(self.authorities.len(), Error::ErrTooManyAuthorities)?,
            additionals: section_count(self.additionals.len(), Error::ErrTooManyAdditionals)?,
        };
        let mut msg = wire_header.pack(Vec::with_capacity(PACK_STARTING_CAP));

        // Readers are required to understand compression (RFC 1035), and
        // DNS-SD names repeat their service suffix in every section, so
        // the map pays for itself immediately.
        let mut compression = Some(HashMap::new());

        for question in &self.questions {
            msg = question.pack(msg, &mut compression)?;
        }
        for record in &mut self.answers {
            msg = record.pack(msg, &mut compression)?;
        }
        for record in &mut self.authorities {
            msg = record.pack(msg, &mut compression)?;
        }
        for record in &mut self.additionals {
            msg = record.pack(msg, &mut compression)?;
        }

        Ok(msg)
    }
}

// section_count guards the u16 section counters in the wire header.
fn section_count(len: usize, too_many: Error) -> Result<u16> {
    u16::try_from(len).map_err(|_| too_many)
}
