//! Per-session reference tables.
//!
//! Encoders hand out indices in write order and remember keys only while the
//! table is below its bound; indices keep counting past the bound so that
//! they stay aligned with the decoder, which records every value.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::config::ReferenceMode;
use crate::errors::{AmfReadError, ReferenceTable};
use crate::value::AmfValue;

/// Address of a shared value. Byte arrays also carry their length because
/// slices of one allocation can start at the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Identity {
    Shared(usize),
    Bytes(usize, usize),
}

fn identity(value: &AmfValue) -> Option<Identity> {
    match value {
        AmfValue::Array(values) => Some(Identity::Shared(Arc::as_ptr(values) as *const () as usize)),
        AmfValue::EcmaArray(entries) => {
            Some(Identity::Shared(Arc::as_ptr(entries) as *const () as usize))
        }
        AmfValue::Object(object) => Some(Identity::Shared(Arc::as_ptr(object) as *const () as usize)),
        AmfValue::Dictionary(dictionary) => {
            Some(Identity::Shared(Arc::as_ptr(dictionary) as *const () as usize))
        }
        AmfValue::ByteArray(bytes) if !bytes.is_empty() => {
            Some(Identity::Bytes(bytes.as_ptr() as usize, bytes.len()))
        }
        _ => None,
    }
}

/// Write side index table keyed by `K`.
#[derive(Debug)]
pub(crate) struct IndexTable<K> {
    table: ReferenceTable,
    capacity: usize,
    len: usize,
    indices: FxHashMap<K, usize>,
}

impl<K: Hash + Eq> IndexTable<K> {
    pub(crate) fn new(table: ReferenceTable, capacity: usize) -> Self {
        Self {
            table,
            capacity,
            len: 0,
            indices: FxHashMap::default(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
        self.indices.clear();
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.indices.get(key).copied();
        if let Some(index) = index {
            trace!(table = %self.table, index, "writing back-reference");
        }
        index
    }

    /// Assign the next index, remembering `key` while there is room.
    pub(crate) fn insert(&mut self, key: Option<K>) -> usize {
        let index = self.len;
        self.len += 1;

        if index < self.capacity {
            if let Some(key) = key {
                self.indices.entry(key).or_insert(index);
            }
        } else if index == self.capacity {
            warn!(
                table = %self.table,
                capacity = self.capacity,
                "reference table full, later values are written inline"
            );
        }

        index
    }

    pub(crate) fn has_room(&self, index: usize) -> bool {
        index < self.capacity
    }
}

/// Write side table of complex values.
#[derive(Debug)]
pub(crate) struct ObjectTable {
    mode: ReferenceMode,
    identities: IndexTable<Identity>,
    values: Vec<AmfValue>,
}

impl ObjectTable {
    pub(crate) fn new(mode: ReferenceMode, capacity: usize) -> Self {
        Self {
            mode,
            identities: IndexTable::new(ReferenceTable::Objects, capacity),
            values: Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.identities.clear();
        self.values.clear();
    }

    /// Index of a previously written value equal to `value` under the mode.
    pub(crate) fn find(&self, value: &AmfValue) -> Option<usize> {
        match self.mode {
            ReferenceMode::Identity => identity(value).and_then(|id| self.identities.get(&id)),
            ReferenceMode::Structural => {
                let index = self.values.iter().position(|seen| seen == value);
                if let Some(index) = index {
                    trace!(table = %ReferenceTable::Objects, index, "writing back-reference");
                }
                index
            }
        }
    }

    pub(crate) fn insert(&mut self, value: &AmfValue) -> usize {
        let index = self.identities.insert(identity(value));
        if self.mode == ReferenceMode::Structural && self.identities.has_room(index) {
            self.values.push(value.clone());
        }
        index
    }
}

/// Read side table. Slots are reserved before a container's children are
/// read so that indices match the write order.
#[derive(Debug)]
pub(crate) struct DecodeTable<T> {
    table: ReferenceTable,
    entries: Vec<Option<T>>,
}

impl<T: Clone> DecodeTable<T> {
    pub(crate) const fn new(table: ReferenceTable) -> Self {
        Self {
            table,
            entries: Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn reserve(&mut self) -> usize {
        self.entries.push(None);
        self.entries.len() - 1
    }

    pub(crate) fn fill(&mut self, index: usize, value: T) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = Some(value);
        }
    }

    pub(crate) fn push(&mut self, value: T) -> usize {
        self.entries.push(Some(value));
        self.entries.len() - 1
    }

    pub(crate) fn get(&self, index: usize) -> Result<T, AmfReadError> {
        match self.entries.get(index) {
            Some(Some(value)) => {
                trace!(table = %self.table, index, "resolved back-reference");
                Ok(value.clone())
            }
            Some(None) => Err(AmfReadError::CircularReference(index)),
            None => Err(AmfReadError::InvalidReference {
                table: self.table,
                index,
            }),
        }
    }
}
