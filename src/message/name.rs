use std::collections::HashMap;
use std::fmt;

use crate::error::*;

// The largest allowed size for a domain name in wire form.
const NAME_LEN: usize = 255;

// A compression pointer must fit in 14 bits.
const MAX_COMPRESSION_OFFSET: usize = 1 << 14;

// Maximum number of compression pointers that may be followed while
// unpacking a single name.
const MAX_COMPRESSION_POINTERS: usize = 10;

// A Name is a non-encoded domain name. It is guaranteed to be lowercase-
// agnostic raw data with a trailing dot when in canonical form, e.g.
// "printer._http._tcp.local.".
#[derive(Default, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Name {
    pub(crate) data: String,
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

impl Name {
    pub(crate) fn new(data: &str) -> Result<Self> {
        if data.len() > NAME_LEN {
            Err(Error::ErrNameTooLong)
        } else {
            Ok(Name {
                data: data.to_owned(),
            })
        }
    }

    // pack appends the wire format of the Name to msg.
    //
    // Domain names are a sequence of counted strings split at the dots,
    // ended by a zero-length string. The compression map, if present,
    // remembers at which message offset each not-yet-seen suffix was
    // packed, so a later name sharing that suffix packs as a pointer.
    pub(crate) fn pack(
        &self,
        mut msg: Vec<u8>,
        compression: &mut Option<HashMap<String, usize>>,
    ) -> Result<Vec<u8>> {
        let data = self.data.as_bytes();

        // Add a trailing dot to canonicalize name.
        if data.is_empty() || data[data.len() - 1] != b'.' {
            return Err(Error::ErrNonCanonicalName);
        }

        // Allow root domain.
        if data == b"." {
            msg.push(0);
            return Ok(msg);
        }

        // Emit sequence of counted strings, chopping at dots.
        let mut begin = 0;
        for i in 0..data.len() {
            if data[i] != b'.' {
                continue;
            }

            // The two most significant bits of a length byte signal a
            // compression pointer, so a label must fit in the remaining six.
            if i - begin >= 1 << 6 {
                return Err(Error::ErrSegTooLong);
            }
            if i == begin {
                return Err(Error::ErrZeroSegLen);
            }

            if let Some(compression) = compression {
                let suffix = &self.data[begin..];
                if let Some(&ptr) = compression.get(suffix) {
                    // Hit. Emit a pointer instead of the rest of the name.
                    msg.push(((ptr >> 8) | 0xC0) as u8);
                    msg.push((ptr & 0xFF) as u8);
                    return Ok(msg);
                }

                // Miss. Remember the current offset for any future suffix
                // match, as long as it fits in a 14-bit pointer.
                let off = msg.len();
                if off < MAX_COMPRESSION_OFFSET {
                    compression.insert(suffix.to_owned(), off);
                }
            }

            msg.push((i - begin) as u8);
            msg.extend_from_slice(&data[begin..i]);
            begin = i + 1;
        }

        msg.push(0);
        Ok(msg)
    }

    // unpack parses a wire-format Name beginning at msg[off], following
    // compression pointers, and returns the offset at which parsing of the
    // enclosing structure should resume.
    pub(crate) fn unpack(&mut self, msg: &[u8], off: usize) -> Result<usize> {
        // curr_off is the current working offset, which may jump backwards
        // through compression pointers. new_off is where parsing resumes.
        let mut curr_off = off;
        let mut new_off = off;
        let mut ptr = 0;
        let mut name = String::with_capacity(NAME_LEN);

        loop {
            if curr_off >= msg.len() {
                return Err(Error::ErrBaseLen);
            }
            let c = msg[curr_off] as usize;
            match c & 0xC0 {
                0x00 => {
                    // Literal string.
                    if c == 0 {
                        // A zero length signals the end of the name.
                        curr_off += 1;
                        break;
                    }
                    let end = curr_off + 1 + c;
                    if end > msg.len() {
                        return Err(Error::ErrCalcLen);
                    }
                    name.push_str(&String::from_utf8_lossy(&msg[curr_off + 1..end]));
                    name.push('.');
                    curr_off = end;
                }
                0xC0 => {
                    // Pointer.
                    if curr_off + 2 > msg.len() {
                        return Err(Error::ErrBaseLen);
                    }
                    let c1 = msg[curr_off + 1] as usize;
                    if ptr == 0 {
                        new_off = curr_off + 2;
                    }
                    ptr += 1;
                    if ptr > MAX_COMPRESSION_POINTERS {
                        return Err(Error::ErrTooManyPtr);
                    }
                    curr_off = ((c ^ 0xC0) << 8) | c1;
                }
                _ => {
                    // The top two bits are 10 or 01, which is reserved.
                    return Err(Error::ErrReserved);
                }
            }
        }

        if name.is_empty() {
            name.push('.');
        }
        if name.len() > NAME_LEN {
            return Err(Error::ErrCalcLen);
        }
        self.data = name;
        if ptr == 0 {
            new_off = curr_off;
        }
        Ok(new_off)
    }

    pub(crate) fn skip(msg: &[u8], off: usize) -> Result<usize> {
        // new_off is only tracked forwards; pointers terminate the name.
        let mut new_off = off;
        loop {
            if new_off >= msg.len() {
                return Err(Error::ErrBaseLen);
            }
            let c = msg[new_off] as usize;
            match c & 0xC0 {
                0x00 => {
                    if c == 0 {
                        return Ok(new_off + 1);
                    }
                    new_off += 1 + c;
                    if new_off > msg.len() {
                        return Err(Error::ErrCalcLen);
                    }
                }
                0xC0 => {
                    let end = new_off + 2;
                    if end > msg.len() {
                        return Err(Error::ErrBaseLen);
                    }
                    return Ok(end);
                }
                _ => return Err(Error::ErrReserved),
            }
        }
    }
}
