#[cfg(test)]
mod record_test;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use crate::message::resource::a::AResource;
use crate::message::resource::aaaa::AaaaResource;
use crate::message::resource::ptr::PtrResource;
use crate::message::resource::srv::SrvResource;
use crate::message::resource::txt::TxtResource;
use crate::message::resource::ResourceHeader;
use crate::message::CLASS_CACHE_FLUSH;

// Fraction of the initial TTL after which a record should be actively
// reconfirmed (RFC 6762 Section 10: queries should be issued between 80%
// and 95% of record lifetime).
const REFRESH_FRACTION: f64 = 0.8;

/// Fields common to all resource records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    /// Set when the sender asserts this record supersedes cached peers
    /// with the same type and name.
    pub(crate) cache_flush: bool,

    /// The time to live as originally received.
    pub(crate) initial_ttl: Duration,

    /// What is left of the time to live; decreases as time elapses.
    pub(crate) remaining_ttl: Duration,
}

impl RecordHeader {
    fn from_wire(header: &ResourceHeader) -> Self {
        let ttl = Duration::from_secs(u64::from(header.ttl));
        RecordHeader {
            cache_flush: cache_flush_is_set(header),
            initial_ttl: ttl,
            remaining_ttl: ttl,
        }
    }

    /// Ages the record by the given duration.
    pub(crate) fn on_time_elapsed(&mut self, duration: Duration) {
        self.remaining_ttl = self.remaining_ttl.saturating_sub(duration);
    }

    /// Returns true once the record's remaining time to live has run out.
    pub(crate) fn is_expired(&self) -> bool {
        self.remaining_ttl.is_zero()
    }

    /// Returns true once more than the refresh fraction of the record's
    /// initial time to live has elapsed.
    pub(crate) fn is_close_to_expiring(&self) -> bool {
        if self.initial_ttl.is_zero() {
            return true;
        }

        let elapsed = self.initial_ttl.as_secs_f64() - self.remaining_ttl.as_secs_f64();
        elapsed / self.initial_ttl.as_secs_f64() > REFRESH_FRACTION
    }
}

// cache_flush_is_set returns true if the top bit of the record's class
// word, the cache flush flag (RFC 6762 Section 10.2), is set.
fn cache_flush_is_set(header: &ResourceHeader) -> bool {
    header.class & CLASS_CACHE_FLUSH != 0
}

/// Received address information (an A or AAAA record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddressRecord {
    pub(crate) address: IpAddr,
    pub(crate) name: String,
    pub(crate) header: RecordHeader,
}

impl AddressRecord {
    /// Builds an address record from an A record.
    pub(crate) fn from_a(header: &ResourceHeader, body: &AResource) -> Self {
        AddressRecord {
            address: IpAddr::V4(Ipv4Addr::from(body.a)),
            name: header.name.data.clone(),
            header: RecordHeader::from_wire(header),
        }
    }

    /// Builds an address record from an AAAA record.
    pub(crate) fn from_aaaa(header: &ResourceHeader, body: &AaaaResource) -> Self {
        AddressRecord {
            address: IpAddr::V6(Ipv6Addr::from(body.aaaa)),
            name: header.name.data.clone(),
            header: RecordHeader::from_wire(header),
        }
    }

    /// Returns true if this record carries an IPv4 address.
    pub(crate) fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }
}

/// Information received for an instance's PTR record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PointerRecord {
    pub(crate) instance_name: String,
    pub(crate) service_name: String,
    pub(crate) header: RecordHeader,
}

impl PointerRecord {
    pub(crate) fn from_ptr(header: &ResourceHeader, body: &PtrResource) -> Self {
        PointerRecord {
            instance_name: body.ptr.data.clone(),
            service_name: header.name.data.clone(),
            header: RecordHeader::from_wire(header),
        }
    }
}

/// Information received for an instance's SRV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServiceRecord {
    pub(crate) instance_name: String,
    pub(crate) port: u16,
    pub(crate) service_name: String,
    pub(crate) target: String,
    pub(crate) header: RecordHeader,
}

impl ServiceRecord {
    pub(crate) fn from_srv(header: &ResourceHeader, body: &SrvResource) -> Self {
        let instance_name = header.name.data.clone();
        let service_name = service_name_from_instance_name(&instance_name);

        ServiceRecord {
            instance_name,
            port: body.port,
            service_name,
            target: body.target.data.clone(),
            header: RecordHeader::from_wire(header),
        }
    }
}

/// Information received for an instance's TXT record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextRecord {
    pub(crate) instance_name: String,
    pub(crate) service_name: String,
    pub(crate) values: HashMap<String, String>,
    pub(crate) header: RecordHeader,
}

impl TextRecord {
    pub(crate) fn from_txt(header: &ResourceHeader, body: &TxtResource) -> Self {
        let instance_name = header.name.data.clone();
        let service_name = service_name_from_instance_name(&instance_name);

        TextRecord {
            instance_name,
            service_name,
            values: txt_to_map(&body.txt),
            header: RecordHeader::from_wire(header),
        }
    }
}

// service_name_from_instance_name extracts the service name from the given
// instance name by stripping everything up to and including the first dot.
pub(crate) fn service_name_from_instance_name(instance_name: &str) -> String {
    match instance_name.split_once('.') {
        Some((_, service_name)) => service_name.to_owned(),
        None => String::new(),
    }
}

// txt_to_map converts raw TXT strings to a key-value map. Strings that are
// not exactly `key=value` are malformed and dropped.
fn txt_to_map(txt: &[String]) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for value in txt {
        let kv_pair: Vec<&str> = value.split('=').collect();
        if kv_pair.len() != 2 {
            continue;
        }
        values.insert(kv_pair[0].to_owned(), kv_pair[1].to_owned());
    }

    values
}
