use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use super::*;
use crate::message::name::Name;
use crate::message::CLASS_IN;

fn resource_header(name: &str, class: u16, ttl: u32) -> ResourceHeader {
    ResourceHeader {
        name: Name::new(name).unwrap(),
        class,
        ttl,
        ..Default::default()
    }
}

#[test]
fn test_address_record_from_a() {
    let header = resource_header("test_host.local.", CLASS_IN, 120);
    let record = AddressRecord::from_a(&header, &AResource { a: [172, 16, 6, 0] });

    assert_eq!(record.address, IpAddr::V4(Ipv4Addr::new(172, 16, 6, 0)));
    assert_eq!(record.name, "test_host.local.");
    assert!(record.is_ipv4());
    assert!(!record.header.cache_flush);
    assert_eq!(record.header.initial_ttl, Duration::from_secs(120));
    assert_eq!(record.header.remaining_ttl, Duration::from_secs(120));
}

#[test]
fn test_address_record_from_aaaa() {
    let header = resource_header("test_host.local.", CLASS_IN, 120);
    let mut aaaa = [0u8; 16];
    aaaa[15] = 1;
    let record = AddressRecord::from_aaaa(&header, &AaaaResource { aaaa });

    assert_eq!(record.address, IpAddr::V6(Ipv6Addr::LOCALHOST));
    assert!(!record.is_ipv4());
}

#[test]
fn test_cache_flush_bit() {
    // Class IN with the cache flush bit set (RFC 6762 Section 10.2).
    let header = resource_header("test_host.local.", CLASS_IN | CLASS_CACHE_FLUSH, 60);
    let record = AddressRecord::from_a(&header, &AResource { a: [172, 16, 6, 0] });
    assert!(record.header.cache_flush);
}

#[test]
fn test_pointer_record_from_ptr() {
    let header = resource_header("_test_service._tcp.local.", CLASS_IN, 800);
    let body = PtrResource {
        ptr: Name::new("test instance._test_service._tcp.local.").unwrap(),
    };
    let record = PointerRecord::from_ptr(&header, &body);

    assert_eq!(record.instance_name, "test instance._test_service._tcp.local.");
    assert_eq!(record.service_name, "_test_service._tcp.local.");
}

#[test]
fn test_service_record_from_srv() {
    let header = resource_header("test instance._test_service._tcp.local.", CLASS_IN, 120);
    let body = SrvResource {
        priority: 0,
        weight: 0,
        port: 9871,
        target: Name::new("test_host.local.").unwrap(),
    };
    let record = ServiceRecord::from_srv(&header, &body);

    assert_eq!(record.instance_name, "test instance._test_service._tcp.local.");
    assert_eq!(record.service_name, "_test_service._tcp.local.");
    assert_eq!(record.port, 9871);
    assert_eq!(record.target, "test_host.local.");
}

#[test]
fn test_text_record_drops_malformed_entries() {
    let header = resource_header("test instance._test_service._tcp.local.", CLASS_IN, 120);
    let body = TxtResource {
        txt: vec![
            "hello=world".to_owned(),
            "noequals".to_owned(),
            "too=many=equals".to_owned(),
            "key=".to_owned(),
        ],
    };
    let record = TextRecord::from_txt(&header, &body);

    assert_eq!(record.values.len(), 2);
    assert_eq!(record.values["hello"], "world");
    assert_eq!(record.values["key"], "");
}

#[test]
fn test_service_name_from_instance_name() {
    assert_eq!(
        service_name_from_instance_name("printer._http._tcp.local."),
        "_http._tcp.local."
    );
    assert_eq!(service_name_from_instance_name("nodot"), "");
}

#[test]
fn test_header_aging() {
    let mut header = RecordHeader {
        cache_flush: false,
        initial_ttl: Duration::from_secs(120),
        remaining_ttl: Duration::from_secs(120),
    };

    header.on_time_elapsed(Duration::from_secs(30));
    assert_eq!(header.remaining_ttl, Duration::from_secs(90));
    assert!(!header.is_expired());
    assert!(!header.is_close_to_expiring());

    // Past 80% of the initial TTL the record wants reconfirmation.
    header.on_time_elapsed(Duration::from_secs(70));
    assert_eq!(header.remaining_ttl, Duration::from_secs(20));
    assert!(header.is_close_to_expiring());

    // Aging saturates at zero and the record reads as expired.
    header.on_time_elapsed(Duration::from_secs(500));
    assert!(header.remaining_ttl.is_zero());
    assert!(header.is_expired());
}

#[test]
fn test_refresh_threshold_boundary() {
    // Exactly 80% elapsed is not yet close to expiring; the threshold is
    // strictly greater.
    let header = RecordHeader {
        cache_flush: false,
        initial_ttl: Duration::from_secs(100),
        remaining_ttl: Duration::from_secs(20),
    };
    assert!(!header.is_close_to_expiring());

    let header = RecordHeader {
        cache_flush: false,
        initial_ttl: Duration::from_secs(100),
        remaining_ttl: Duration::from_secs(19),
    };
    assert!(header.is_close_to_expiring());
}
