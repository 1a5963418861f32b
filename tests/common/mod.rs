// ABOUTME: In-memory source and destination stores for migration loop tests
// ABOUTME: Deterministic scan order, per-key fault injection, and batch recording

use redis_keys_migrator::error::StoreError;
use redis_keys_migrator::store::{DestinationOps, KeyType, SourceOps, StreamEntry, WriteOp};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Shorthand for building binary values from string literals.
pub fn bytes(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// A value held by one of the in-memory stores, one variant per payload
/// shape the migration copies. Sorted-set members are (member, score) so
/// source seeds and destination contents compare directly.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeValue {
    Str(Vec<u8>),
    List(Vec<Vec<u8>>),
    Set(Vec<Vec<u8>>),
    Hash(Vec<(Vec<u8>, Vec<u8>)>),
    SortedSet(Vec<(Vec<u8>, f64)>),
    Stream(Vec<StreamEntry>),
    /// A type the migration cannot copy; carries the TYPE tag.
    Unsupported(String),
}

impl FakeValue {
    fn key_type(&self) -> KeyType {
        match self {
            FakeValue::Str(_) => KeyType::String,
            FakeValue::List(_) => KeyType::List,
            FakeValue::Set(_) => KeyType::Set,
            FakeValue::Hash(_) => KeyType::Hash,
            FakeValue::SortedSet(_) => KeyType::SortedSet,
            FakeValue::Stream(_) => KeyType::Stream,
            FakeValue::Unsupported(tag) => KeyType::Unsupported(tag.clone()),
        }
    }
}

/// `*` matches everything, a trailing `*` matches a prefix, anything else
/// must match exactly. Enough glob for tests.
fn key_matches(pattern: &str, key: &[u8]) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix.as_bytes()),
        None => key == pattern.as_bytes(),
    }
}

/// In-memory source store.
///
/// Keys scan in `BTreeMap` order, so tests control processing order by
/// choosing key names. Fault sets make individual keys fail their type
/// lookup or value read; `type_lookups` records which keys the loop
/// actually touched beyond the scan.
#[derive(Default)]
pub struct FakeSource {
    pub keys: BTreeMap<Vec<u8>, FakeValue>,
    /// Keys whose TYPE lookup fails.
    pub fail_type: HashSet<String>,
    /// Keys whose value read fails.
    pub fail_read: HashSet<String>,
    /// Every key that had its type looked up, in order. Skipped keys must
    /// never show up here.
    pub type_lookups: Vec<String>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: FakeValue) {
        self.keys.insert(key.into(), value);
    }

    fn value(&self, key: &str) -> Option<&FakeValue> {
        self.keys.get(key.as_bytes())
    }

    fn read_guard(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_read.contains(key) {
            return Err(StoreError::Fault(format!(
                "injected read failure for {key}"
            )));
        }
        Ok(())
    }
}

impl SourceOps for FakeSource {
    async fn ping(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn scan_page(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<Vec<u8>>), StoreError> {
        let matching: Vec<Vec<u8>> = self
            .keys
            .keys()
            .filter(|key| key_matches(pattern, key))
            .cloned()
            .collect();
        // The cursor is an index into the ordered key list, paged in exact
        // chunks of `count`.
        let start = (cursor as usize).min(matching.len());
        let end = (start + count).min(matching.len());
        let next = if end >= matching.len() { 0 } else { end as u64 };
        Ok((next, matching[start..end].to_vec()))
    }

    async fn type_of(&mut self, key: &str) -> Result<KeyType, StoreError> {
        self.type_lookups.push(key.to_string());
        if self.fail_type.contains(key) {
            return Err(StoreError::Fault(format!(
                "injected type failure for {key}"
            )));
        }
        Ok(match self.value(key) {
            Some(value) => value.key_type(),
            None => KeyType::Unsupported("none".to_string()),
        })
    }

    async fn get_string(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::Str(value)) => Some(value.clone()),
            _ => None,
        })
    }

    async fn list_range(
        &mut self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        assert_eq!((start, stop), (0, -1), "the loop reads whole lists");
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::List(items)) => items.clone(),
            _ => Vec::new(),
        })
    }

    async fn set_members(&mut self, key: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::Set(members)) => members.clone(),
            _ => Vec::new(),
        })
    }

    async fn hash_fields(&mut self, key: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::Hash(fields)) => fields.clone(),
            _ => Vec::new(),
        })
    }

    async fn sorted_set_with_scores(
        &mut self,
        key: &str,
    ) -> Result<Vec<(Vec<u8>, f64)>, StoreError> {
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::SortedSet(members)) => members.clone(),
            _ => Vec::new(),
        })
    }

    async fn stream_entries(&mut self, key: &str) -> Result<Vec<StreamEntry>, StoreError> {
        self.read_guard(key)?;
        Ok(match self.value(key) {
            Some(FakeValue::Stream(entries)) => entries.clone(),
            _ => Vec::new(),
        })
    }

    async fn key_count(&mut self) -> Result<u64, StoreError> {
        Ok(self.keys.len() as u64)
    }
}

/// In-memory destination store.
///
/// Applies executed batches to its key map with Redis write semantics
/// (RPUSH appends, SADD dedupes, HSET and ZADD replace per field/member,
/// XADD appends) and records the size of every successfully executed
/// batch.
#[derive(Default)]
pub struct FakeDestination {
    pub keys: HashMap<String, FakeValue>,
    /// Sizes of successfully executed batches, in order.
    pub executed: Vec<usize>,
    /// When set, the Nth `execute_batch` call (zero-based) fails without
    /// applying anything.
    pub fail_on_call: Option<usize>,
    /// When true, every `exists` check fails.
    pub fail_exists: bool,
    calls: usize,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key that already exists at the destination.
    pub fn preload(&mut self, key: &str, value: FakeValue) {
        self.keys.insert(key.to_string(), value);
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::Set { key, value } => {
                self.keys.insert(key.clone(), FakeValue::Str(value.clone()));
            }
            WriteOp::ListAppendAll { key, values } => {
                match self
                    .keys
                    .entry(key.clone())
                    .or_insert_with(|| FakeValue::List(Vec::new()))
                {
                    FakeValue::List(items) => items.extend(values.iter().cloned()),
                    other => panic!("RPUSH against {other:?}"),
                }
            }
            WriteOp::SetAddAll { key, members } => {
                match self
                    .keys
                    .entry(key.clone())
                    .or_insert_with(|| FakeValue::Set(Vec::new()))
                {
                    FakeValue::Set(existing) => {
                        for member in members {
                            if !existing.contains(member) {
                                existing.push(member.clone());
                            }
                        }
                    }
                    other => panic!("SADD against {other:?}"),
                }
            }
            WriteOp::HashSetAll { key, fields } => {
                match self
                    .keys
                    .entry(key.clone())
                    .or_insert_with(|| FakeValue::Hash(Vec::new()))
                {
                    FakeValue::Hash(existing) => {
                        for (field, value) in fields {
                            match existing.iter_mut().find(|(f, _)| f == field) {
                                Some(slot) => slot.1 = value.clone(),
                                None => existing.push((field.clone(), value.clone())),
                            }
                        }
                    }
                    other => panic!("HSET against {other:?}"),
                }
            }
            WriteOp::SortedSetAddAll { key, members } => {
                match self
                    .keys
                    .entry(key.clone())
                    .or_insert_with(|| FakeValue::SortedSet(Vec::new()))
                {
                    FakeValue::SortedSet(existing) => {
                        for (score, member) in members {
                            match existing.iter_mut().find(|(m, _)| m == member) {
                                Some(slot) => slot.1 = *score,
                                None => existing.push((member.clone(), *score)),
                            }
                        }
                    }
                    other => panic!("ZADD against {other:?}"),
                }
            }
            WriteOp::StreamAppend { key, id, fields } => {
                match self
                    .keys
                    .entry(key.clone())
                    .or_insert_with(|| FakeValue::Stream(Vec::new()))
                {
                    FakeValue::Stream(entries) => entries.push(StreamEntry {
                        id: id.clone(),
                        fields: fields.clone(),
                    }),
                    other => panic!("XADD against {other:?}"),
                }
            }
        }
    }
}

impl DestinationOps for FakeDestination {
    async fn ping(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        if self.fail_exists {
            return Err(StoreError::Fault("injected exists failure".to_string()));
        }
        Ok(self.keys.contains_key(key))
    }

    async fn execute_batch(&mut self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(StoreError::Fault("injected batch failure".to_string()));
        }
        for op in ops {
            self.apply(op);
        }
        self.executed.push(ops.len());
        Ok(())
    }

    async fn key_count(&mut self) -> Result<u64, StoreError> {
        Ok(self.keys.len() as u64)
    }
}
