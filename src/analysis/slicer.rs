//! Per-entity slicing of the walking table.
//!
//! Sub-tables are borrowed views into the loaded table. Keys iterate in the
//! order they are first seen, rows keep file order.

use crate::models::{WalkingRecord, WalkingTable};

/// A categorical key value to filter on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SliceKey {
    Subject(String),
    Age(u32),
}

impl SliceKey {
    /// Whether the record's key column equals this value.
    pub fn matches(&self, record: &WalkingRecord) -> bool {
        match self {
            SliceKey::Subject(subject) => record.subject == *subject,
            SliceKey::Age(age) => record.age == *age,
        }
    }
}

/// Rows whose key column equals `key`, in original order.
pub fn slice_by<'a>(table: &'a WalkingTable, key: &SliceKey) -> Vec<&'a WalkingRecord> {
    table.records.iter().filter(|r| key.matches(r)).collect()
}

/// Ordered mapping from key value to its sub-table.
#[derive(Debug, Clone)]
pub struct Partition<'a, K> {
    entries: Vec<(K, Vec<&'a WalkingRecord>)>,
}

impl<'a, K> Partition<'a, K> {
    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[&'a WalkingRecord])> {
        self.entries.iter().map(|(k, rows)| (k, rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
impl<'a, K: PartialEq> Partition<'a, K> {
    pub fn get(&self, key: &K) -> Option<&[&'a WalkingRecord]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, rows)| rows.as_slice())
    }
}

/// Slice the table once per distinct key, keys in the given order.
fn partition<'a, K>(
    table: &'a WalkingTable,
    keys: Vec<K>,
    to_slice_key: impl Fn(&K) -> SliceKey,
) -> Partition<'a, K> {
    let entries = keys
        .into_iter()
        .map(|key| {
            let rows = slice_by(table, &to_slice_key(&key));
            (key, rows)
        })
        .collect();

    Partition { entries }
}

/// Partition by subject identity.
pub fn by_subject(table: &WalkingTable) -> Partition<'_, String> {
    partition(table, table.subjects(), |s| SliceKey::Subject(s.clone()))
}

/// Partition by age bracket.
pub fn by_age(table: &WalkingTable) -> Partition<'_, u32> {
    partition(table, table.ages(), |age| SliceKey::Age(*age))
}
