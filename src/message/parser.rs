use super::header::{Header, WireHeader};
use super::name::Name;
use super::packer::*;
use super::resource::{unpack_resource_body, Resource, ResourceHeader};
use super::{Question, RecordType};
use crate::error::*;

// A parser section. Sections are parsed in order; requesting an entity
// from the wrong section is an error.
#[derive(Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Section {
    #[default]
    NotStarted = 0,
    Header = 1,
    Questions = 2,
    Answers = 3,
    Authorities = 4,
    Additionals = 5,
    Done = 6,
}

impl Section {
    fn next(self) -> Section {
        match self {
            Section::NotStarted => Section::Header,
            Section::Header => Section::Questions,
            Section::Questions => Section::Answers,
            Section::Answers => Section::Authorities,
            Section::Authorities => Section::Additionals,
            _ => Section::Done,
        }
    }
}

// A Parser allows incrementally parsing a DNS message.
//
// The entities in a message are parsed in this order: header, questions,
// answers, authorities, additionals. Each section may be skipped entirely,
// and individual resources may have their header parsed without their body.
#[derive(Default)]
pub(crate) struct Parser<'a> {
    msg: &'a [u8],
    header: WireHeader,

    section: Section,
    off: usize,
    index: usize,
    res_header_valid: bool,
    res_header: ResourceHeader,
}

impl<'a> Parser<'a> {
    // start parses the header and enables the parsing of questions.
    pub(crate) fn start(&mut self, msg: &'a [u8]) -> Result<Header> {
        *self = Parser {
            msg,
            ..Default::default()
        };
        self.off = self.header.unpack(msg, 0)?;
        self.section = Section::Questions;
        Ok(self.header.decoded())
    }

    fn count(&self, sec: Section) -> u16 {
        match sec {
            Section::Questions => self.header.questions,
            Section::Answers => self.header.answers,
            Section::Authorities => self.header.authorities,
            Section::Additionals => self.header.additionals,
            _ => 0,
        }
    }

    fn check_advance(&mut self, sec: Section) -> Result<()> {
        if self.section < sec {
            return Err(Error::ErrNotStarted);
        }
        if self.section > sec {
            return Err(Error::ErrSectionDone);
        }
        self.res_header_valid = false;
        if self.index == self.count(sec) as usize {
            self.index = 0;
            self.section = self.section.next();
            return Err(Error::ErrSectionDone);
        }
        Ok(())
    }

    fn resource(&mut self, sec: Section) -> Result<Resource> {
        let header = self.resource_header(sec)?;
        self.res_header_valid = false;
        let (body, off) =
            unpack_resource_body(header.typ, self.msg, self.off, header.length as usize)?;
        self.off = off;
        self.index += 1;
        Ok(Resource { header, body })
    }

    fn resource_header(&mut self, sec: Section) -> Result<ResourceHeader> {
        if self.res_header_valid {
            return Ok(self.res_header.clone());
        }
        self.check_advance(sec)?;
        let mut hdr = ResourceHeader::default();
        let off = hdr.unpack(self.msg, self.off)?;
        self.res_header = hdr.clone();
        self.res_header_valid = true;
        self.off = off;
        Ok(hdr)
    }

    fn skip_resource(&mut self, sec: Section) -> Result<()> {
        if self.res_header_valid {
            let new_off = self.off + self.res_header.length as usize;
            if new_off > self.msg.len() {
                return Err(Error::ErrResourceLen);
            }
            self.off = new_off;
            self.res_header_valid = false;
            self.index += 1;
            return Ok(());
        }
        self.check_advance(sec)?;
        self.off = Resource::skip(self.msg, self.off)?;
        self.index += 1;
        Ok(())
    }

    // question parses a single Question. The class word is read past but
    // not kept; mDNS questions are always class IN.
    pub(crate) fn question(&mut self) -> Result<Question> {
        self.check_advance(Section::Questions)?;
        let mut name = Name::default();
        let off = name.unpack(self.msg, self.off)?;
        let (typ, off) = unpack_uint16(self.msg, off)?;
        let off = skip_uint16(self.msg, off)?;
        self.off = off;
        self.index += 1;
        Ok(Question {
            name,
            typ: RecordType::from_wire(typ),
        })
    }

    // all_questions parses all Questions.
    pub(crate) fn all_questions(&mut self) -> Result<Vec<Question>> {
        let mut qs = Vec::with_capacity(self.header.questions as usize);
        loop {
            match self.question() {
                Ok(q) => qs.push(q),
                Err(Error::ErrSectionDone) => return Ok(qs),
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) fn skip_all_questions(&mut self) -> Result<()> {
        loop {
            match self.skip_question() {
                Err(Error::ErrSectionDone) => return Ok(()),
                Err(err) => return Err(err),
                Ok(_) => {}
            }
        }
    }

    fn skip_question(&mut self) -> Result<()> {
        self.check_advance(Section::Questions)?;
        let off = Name::skip(self.msg, self.off)?;
        let off = skip_uint16(self.msg, off)?; // type
        let off = skip_uint16(self.msg, off)?; // class
        self.off = off;
        self.index += 1;
        Ok(())
    }

    // answer_header parses a single answer ResourceHeader.
    pub(crate) fn answer_header(&mut self) -> Result<ResourceHeader> {
        self.resource_header(Section::Answers)
    }

    // answer parses a single answer Resource.
    pub(crate) fn answer(&mut self) -> Result<Resource> {
        self.resource(Section::Answers)
    }

    // all_answers parses all answer Resources.
    pub(crate) fn all_answers(&mut self) -> Result<Vec<Resource>> {
        let mut records = Vec::with_capacity(self.header.answers as usize);
        loop {
            match self.answer() {
                Ok(r) => records.push(r),
                Err(Error::ErrSectionDone) => return Ok(records),
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) fn skip_all_answers(&mut self) -> Result<()> {
        loop {
            match self.skip_resource(Section::Answers) {
                Err(Error::ErrSectionDone) => return Ok(()),
                Err(err) => return Err(err),
                Ok(_) => {}
            }
        }
    }

    // authority parses a single authority Resource.
    pub(crate) fn authority(&mut self) -> Result<Resource> {
        self.resource(Section::Authorities)
    }

    // all_authorities parses all authority Resources.
    pub(crate) fn all_authorities(&mut self) -> Result<Vec<Resource>> {
        let mut records = Vec::with_capacity(self.header.authorities as usize);
        loop {
            match self.authority() {
                Ok(r) => records.push(r),
                Err(Error::ErrSectionDone) => return Ok(records),
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) fn skip_all_authorities(&mut self) -> Result<()> {
        loop {
            match self.skip_resource(Section::Authorities) {
                Err(Error::ErrSectionDone) => return Ok(()),
                Err(err) => return Err(err),
                Ok(_) => {}
            }
        }
    }

    // additional parses a single additional Resource.
    pub(crate) fn additional(&mut self) -> Result<Resource> {
        self.resource(Section::Additionals)
    }

    // all_additionals parses all additional Resources.
    pub(crate) fn all_additionals(&mut self) -> Result<Vec<Resource>> {
        let mut records = Vec::with_capacity(self.header.additionals as usize);
        loop {
            match self.additional() {
                Ok(r) => records.push(r),
                Err(Error::ErrSectionDone) => return Ok(records),
                Err(err) => return Err(err),
            }
        }
    }
}
