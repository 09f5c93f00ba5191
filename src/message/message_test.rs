use std::collections::HashMap;

use super::resource::a::AResource;
use super::resource::srv::SrvResource;
use super::resource::txt::TxtResource;
use super::resource::{Resource, ResourceHeader};
use super::*;

fn must_name(name: &str) -> Name {
    Name::new(name).unwrap()
}

fn record_header(name: &str, ttl: u32) -> ResourceHeader {
    ResourceHeader {
        name: must_name(name),
        class: CLASS_IN,
        ttl,
        ..Default::default()
    }
}

#[test]
fn test_name_pack_unpack() {
    let name = must_name("printer._http._tcp.local.");
    let msg = name.pack(vec![], &mut None).unwrap();

    let mut unpacked = Name::default();
    let off = unpacked.unpack(&msg, 0).unwrap();
    assert_eq!(off, msg.len());
    assert_eq!(unpacked, name);
}

#[test]
fn test_name_pack_rejects_non_canonical() {
    let name = must_name("no-trailing-dot.local");
    let result = name.pack(vec![], &mut None);
    assert_eq!(result.unwrap_err(), Error::ErrNonCanonicalName);
}

#[test]
fn test_name_unpack_truncated() {
    // A label claiming 10 bytes with only 3 present.
    let msg = [10u8, b'a', b'b', b'c'];
    let mut name = Name::default();
    assert_eq!(name.unpack(&msg, 0).unwrap_err(), Error::ErrCalcLen);
}

#[test]
fn test_name_unpack_pointer_loop() {
    // A pointer that points at itself.
    let msg = [0xC0u8, 0x00];
    let mut name = Name::default();
    assert_eq!(name.unpack(&msg, 0).unwrap_err(), Error::ErrTooManyPtr);
}

#[test]
fn test_name_compression_reuses_suffix() {
    let mut compression = Some(HashMap::new());

    let first = must_name("instance._test._tcp.local.");
    let msg = first.pack(vec![], &mut compression).unwrap();
    let first_len = msg.len();

    // The second name shares the "_test._tcp.local." suffix and must pack
    // as one label plus a two-byte pointer.
    let second = must_name("other._test._tcp.local.");
    let msg = second.pack(msg, &mut compression).unwrap();
    assert_eq!(msg.len() - first_len, 1 + "other".len() + 2);

    let mut unpacked = Name::default();
    unpacked.unpack(&msg, first_len).unwrap();
    assert_eq!(unpacked, second);
}

#[test]
fn test_record_type_wire_roundtrip() {
    for typ in [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Ptr,
        RecordType::Srv,
        RecordType::Txt,
    ] {
        assert_eq!(RecordType::from_wire(typ.to_wire()), typ);
    }

    // NSEC, CNAME, and friends all collapse to Other.
    assert_eq!(RecordType::from_wire(47), RecordType::Other);
    assert_eq!(RecordType::from_wire(5), RecordType::Other);
}

#[test]
fn test_message_query_roundtrip() {
    let mut msg = Message {
        header: Header::default(),
        questions: vec![
            Question {
                name: must_name("_http._tcp.local."),
                typ: RecordType::Ptr,
            },
            Question {
                name: must_name("host.local."),
                typ: RecordType::A,
            },
        ],
        ..Default::default()
    };

    let raw = msg.pack().unwrap();

    let mut parsed = Message::default();
    parsed.unpack(&raw).unwrap();
    assert!(!parsed.header.response);
    assert_eq!(parsed.questions, msg.questions);
    assert!(parsed.answers.is_empty());
}

#[test]
fn test_message_response_roundtrip() {
    let mut msg = Message {
        header: Header {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        answers: vec![
            Resource {
                header: record_header("instance._test._tcp.local.", 120),
                body: Some(Box::new(SrvResource {
                    priority: 0,
                    weight: 0,
                    port: 9871,
                    target: must_name("host.local."),
                })),
            },
            Resource {
                header: record_header("instance._test._tcp.local.", 120),
                body: Some(Box::new(TxtResource {
                    txt: vec!["hello=world".to_owned(), "malformed".to_owned()],
                })),
            },
        ],
        additionals: vec![Resource {
            header: record_header("host.local.", 120),
            body: Some(Box::new(AResource { a: [172, 16, 6, 0] })),
        }],
        ..Default::default()
    };

    let raw = msg.pack().unwrap();

    let mut parsed = Message::default();
    parsed.unpack(&raw).unwrap();
    assert!(parsed.header.response);
    assert!(parsed.header.authoritative);
    assert_eq!(parsed.answers.len(), 2);
    assert_eq!(parsed.additionals.len(), 1);

    let srv = parsed.answers[0]
        .body
        .as_ref()
        .unwrap()
        .as_any()
        .downcast_ref::<SrvResource>()
        .unwrap();
    assert_eq!(srv.port, 9871);
    assert_eq!(srv.target, must_name("host.local."));

    let txt = parsed.answers[1]
        .body
        .as_ref()
        .unwrap()
        .as_any()
        .downcast_ref::<TxtResource>()
        .unwrap();
    assert_eq!(txt.txt, vec!["hello=world", "malformed"]);

    let a = parsed.additionals[0]
        .body
        .as_ref()
        .unwrap()
        .as_any()
        .downcast_ref::<AResource>()
        .unwrap();
    assert_eq!(a.a, [172, 16, 6, 0]);
}

#[test]
fn test_parser_skips_unknown_rdata() {
    // One answer of a type this crate does not model (NSEC, 47) followed
    // by one A record; the unknown rdata must be skipped, not parsed.
    let mut msg = Message {
        header: Header {
            response: true,
            ..Default::default()
        },
        answers: vec![Resource {
            header: record_header("host.local.", 120),
            body: Some(Box::new(AResource { a: [192, 168, 1, 1] })),
        }],
        ..Default::default()
    };
    let mut raw = msg.pack().unwrap();

    // Append a hand-built NSEC-ish record and bump the answer count.
    let name = must_name("host.local.");
    raw = name.pack(raw, &mut None).unwrap();
    raw.extend_from_slice(&47u16.to_be_bytes()); // type
    raw.extend_from_slice(&CLASS_IN.to_be_bytes()); // class
    raw.extend_from_slice(&120u32.to_be_bytes()); // ttl
    raw.extend_from_slice(&4u16.to_be_bytes()); // rdata length
    raw.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    raw[7] = 2; // answer count (low byte)

    let mut parser = Parser::default();
    let header = parser.start(&raw).unwrap();
    assert!(header.response);
    parser.skip_all_questions().unwrap();

    let answers = parser.all_answers().unwrap();
    assert_eq!(answers.len(), 2);
    assert!(answers[0].body.is_some());
    assert_eq!(answers[0].header.typ, RecordType::A);
    assert!(answers[1].body.is_none());
    assert_eq!(answers[1].header.typ, RecordType::Other);
    assert_eq!(answers[1].header.length, 4);
}

#[test]
fn test_parser_answer_header_then_skip() {
    let mut msg = Message {
        header: Header {
            response: true,
            ..Default::default()
        },
        answers: vec![Resource {
            header: record_header("host.local.", 120),
            body: Some(Box::new(AResource { a: [10, 0, 0, 1] })),
        }],
        ..Default::default()
    };
    let raw = msg.pack().unwrap();

    let mut parser = Parser::default();
    parser.start(&raw).unwrap();
    parser.skip_all_questions().unwrap();

    let hdr = parser.answer_header().unwrap();
    assert_eq!(hdr.typ, RecordType::A);
    assert_eq!(hdr.ttl, 120);

    // Skipping after a header peek must consume exactly that resource.
    parser.skip_all_answers().unwrap();
    assert_eq!(parser.skip_all_authorities(), Ok(()));
}

#[test]
fn test_message_header_bits_roundtrip() {
    let mut msg = Message {
        header: Header {
            id: 0x1234,
            response: true,
            authoritative: true,
            truncated: false,
            recursion_desired: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let raw = msg.pack().unwrap();

    let mut parsed = Message::default();
    parsed.unpack(&raw).unwrap();
    assert_eq!(parsed.header.id, 0x1234);
    assert!(parsed.header.response);
    assert!(parsed.header.authoritative);
    assert!(!parsed.header.truncated);
    assert!(parsed.header.recursion_desired);
    assert!(!parsed.header.recursion_available);
}
