
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::net::IpAddr;
use std::time::Duration;

use crate::question::{Question, QuestionKind};
use crate::record::{AddressRecord, PointerRecord, RecordHeader, ServiceRecord, TextRecord};
use crate::ServiceInstance;

/// A unique identifier for an address record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AddressRecordId {
    pub(crate) address: IpAddr,
    pub(crate) name: String,
}

/// A unique identifier for a fully resolved service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ServiceInstanceId {
    pub(crate) address: IpAddr,
    pub(crate) name: String,
}

/// A cache of received resource records.
///
/// The cache stores at most one record per identity in each record family,
/// ages all records together, and derives the set of fully resolved
/// service instances from the joined families.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    address_records: HashMap<AddressRecordId, AddressRecord>,

    // Maps from instance name to pointer record.
    pointer_records: HashMap<String, PointerRecord>,

    // Maps from instance name to service record.
    service_records: HashMap<String, ServiceRecord>,

    // Maps from instance name to text record.
    text_records: HashMap<String, TextRecord>,
}

// merge_record updates a record family with a newly received record.
//
// An incoming record replaces the cached one when no record with the same
// identity exists, when its cache flush bit is set, or when it carries a
// strictly greater remaining TTL (the standard mDNS reconfirmation
// signal). Equal or lower TTLs are duplicate copies and are ignored so a
// secondary announcement cannot roll a record's TTL back.
fn merge_record<K, V>(
    records: &mut HashMap<K, V>,
    id: K,
    record: V,
    header_of: impl Fn(&V) -> &RecordHeader,
) -> bool
where
    K: Eq + Hash,
{
    match records.entry(id) {
        Entry::Vacant(entry) => {
            entry.insert(record);
            true
        }
        Entry::Occupied(mut entry) => {
            let received = header_of(&record);
            let existing = header_of(entry.get());
            if received.cache_flush || received.remaining_ttl > existing.remaining_ttl {
                entry.insert(record);
                true
            } else {
                false
            }
        }
    }
}

// age_family ages every record in one family, evicting records whose
// remaining TTL has run out. Returns true if anything was evicted.
fn age_family<K, V>(
    records: &mut HashMap<K, V>,
    duration: Duration,
    header_of: impl Fn(&mut V) -> &mut RecordHeader,
) -> bool
where
    K: Eq + Hash,
{
    let mut any_evicted = false;
    records.retain(|_, record| {
        let header = header_of(record);
        header.on_time_elapsed(duration);
        if header.is_expired() {
            any_evicted = true;
            false
        } else {
            true
        }
    });
    any_evicted
}

impl Cache {
    pub(crate) fn new() -> Self {
        Cache::default()
    }

    /// Updates the cache with the given address record. Returns true if
    /// the cache was actually updated with the new record.
    pub(crate) fn on_address_record_received(&mut self, record: AddressRecord) -> bool {
        let id = AddressRecordId {
            address: record.address,
            name: record.name.clone(),
        };
        merge_record(&mut self.address_records, id, record, |r| &r.header)
    }

    /// Updates the cache with the given pointer record. Returns true if
    /// the cache was actually updated with the new record.
    pub(crate) fn on_pointer_record_received(&mut self, record: PointerRecord) -> bool {
        let id = record.instance_name.clone();
        merge_record(&mut self.pointer_records, id, record, |r| &r.header)
    }

    /// Updates the cache with the given service record. Returns true if
    /// the cache was actually updated with the new record.
    pub(crate) fn on_service_record_received(&mut self, record: ServiceRecord) -> bool {
        let id = record.instance_name.clone();
        merge_record(&mut self.service_records, id, record, |r| &r.header)
    }

    /// Updates the cache with the given text record. Returns true if the
    /// cache was actually updated with the new record.
    pub(crate) fn on_text_record_received(&mut self, record: TextRecord) -> bool {
        let id = record.instance_name.clone();
        merge_record(&mut self.text_records, id, record, |r| &r.header)
    }

    /// Ages every cached record by the given duration, evicting records
    /// whose remaining TTL has run out. Returns true if any record was
    /// evicted.
    pub(crate) fn on_time_elapsed(&mut self, duration: Duration) -> bool {
        let mut any_evicted = age_family(&mut self.address_records, duration, |r| &mut r.header);
        any_evicted |= age_family(&mut self.pointer_records, duration, |r| &mut r.header);
        any_evicted |= age_family(&mut self.service_records, duration, |r| &mut r.header);
        any_evicted |= age_family(&mut self.text_records, duration, |r| &mut r.header);
        any_evicted
    }

    /// Returns the set of fully resolved service instances in the cache.
    ///
    /// An instance resolves when its pointer, service, and text records
    /// are all present and at least one address record matches the
    /// service record's target; one instance is produced per matching
    /// address. The reported service name comes from the service record.
    pub(crate) fn to_resolved_instances(&self) -> HashMap<ServiceInstanceId, ServiceInstance> {
        let mut instances = HashMap::new();
        let address_records = self.address_records_by_name();

        for instance_name in self.pointer_records.keys() {
            let service_record = match self.service_records.get(instance_name) {
                Some(record) => record,
                None => continue,
            };

            let text_record = match self.text_records.get(instance_name) {
                Some(record) => record,
                None => continue,
            };

            let addresses = match address_records.get(service_record.target.as_str()) {
                Some(addresses) => addresses,
                None => continue,
            };

            for address_record in addresses {
                let instance = ServiceInstance {
                    address: address_record.address,
                    instance_name: instance_name.clone(),
                    port: service_record.port,
                    service_name: service_record.service_name.clone(),
                    text_records: text_record.values.clone(),
                };

                instances.insert(
                    ServiceInstanceId {
                        address: instance.address,
                        name: instance.instance_name.clone(),
                    },
                    instance,
                );
            }
        }

        instances
    }

    /// Inserts the questions needed to complete partially resolved
    /// instances of the browsed services.
    ///
    /// Pointer questions are not re-asked here: they are issued once on
    /// subscription, and new advertisers announce themselves unsolicited
    /// (RFC 6762 Section 8.3).
    pub(crate) fn questions_for_missing_records(
        &self,
        browse_set: &HashSet<String>,
        questions: &mut HashSet<Question>,
    ) {
        for service_name in browse_set {
            for pointer_record in self
                .pointer_records
                .values()
                .filter(|record| &record.service_name == service_name)
            {
                let instance_name = &pointer_record.instance_name;

                match self.service_records.get(instance_name) {
                    None => {
                        questions.insert(Question::new(instance_name.clone(), QuestionKind::Srv));
                    }
                    Some(service_record) => {
                        let has_address = self
                            .address_records
                            .values()
                            .any(|record| record.name == service_record.target);
                        if !has_address {
                            questions
                                .insert(Question::new(service_record.target.clone(), QuestionKind::A));
                            questions.insert(Question::new(
                                service_record.target.clone(),
                                QuestionKind::Aaaa,
                            ));
                        }
                    }
                }

                if !self.text_records.contains_key(instance_name) {
                    questions.insert(Question::new(instance_name.clone(), QuestionKind::Txt));
                }
            }
        }
    }

    /// Inserts refresh questions for browsed records past their refresh
    /// threshold.
    pub(crate) fn questions_for_expiring_records(
        &self,
        browse_set: &HashSet<String>,
        questions: &mut HashSet<Question>,
    ) {
        for record in self.pointer_records.values() {
            if browse_set.contains(&record.service_name) && record.header.is_close_to_expiring() {
                questions.insert(Question::new(record.service_name.clone(), QuestionKind::Ptr));
            }
        }

        for record in self.service_records.values() {
            if browse_set.contains(&record.service_name) && record.header.is_close_to_expiring() {
                questions.insert(Question::new(record.instance_name.clone(), QuestionKind::Srv));

                // The instance's addresses expire independently of the
                // service record that points at them.
                for address_record in self
                    .address_records
                    .values()
                    .filter(|r| r.name == record.target && r.header.is_close_to_expiring())
                {
                    let kind = if address_record.is_ipv4() {
                        QuestionKind::A
                    } else {
                        QuestionKind::Aaaa
                    };
                    questions.insert(Question::new(address_record.name.clone(), kind));
                }
            }
        }

        for record in self.text_records.values() {
            if browse_set.contains(&record.service_name) && record.header.is_close_to_expiring() {
                questions.insert(Question::new(record.instance_name.clone(), QuestionKind::Txt));
            }
        }
    }

    // address_records_by_name groups the cached address records by host
    // name.
    fn address_records_by_name(&self) -> HashMap<&str, Vec<&AddressRecord>> {
        let mut by_name: HashMap<&str, Vec<&AddressRecord>> = HashMap::new();
        for record in self.address_records.values() {
            by_name.entry(record.name.as_str()).or_default().push(record);
        }
        by_name
    }

    #[cfg(test)]
    pub(crate) fn address_records(&self) -> &HashMap<AddressRecordId, AddressRecord> {
        &self.address_records
    }

    #[cfg(test)]
    pub(crate) fn pointer_records(&self) -> &HashMap<String, PointerRecord> {
        &self.pointer_records
    }
}
