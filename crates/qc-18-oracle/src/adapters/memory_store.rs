//! Ordered in-memory key-value store
//!
//! Backed by a `BTreeMap`, so prefix scans come back in key order and
//! reverse pagination is a cheap `rev()`.

use crate::domain::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore, Page, PageRequest};
use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Default, Debug, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn range<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl DoubleEndedIterator<Item = (&'a Vec<u8>, &'a Vec<u8>)> + 'a {
        self.data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(self
            .range(prefix)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn paged_scan(&self, prefix: &[u8], page: PageRequest) -> Result<Page, KVStoreError> {
        let total = self.range(prefix).count();
        let limit = if page.limit == 0 { usize::MAX } else { page.limit };
        let clone = |(k, v): (&Vec<u8>, &Vec<u8>)| (k.clone(), v.clone());
        let entries = if page.reverse {
            self.range(prefix)
                .rev()
                .skip(page.offset)
                .take(limit)
                .map(clone)
                .collect()
        } else {
            self.range(prefix)
                .skip(page.offset)
                .take(limit)
                .map(clone)
                .collect()
        };
        Ok(Page { entries, total })
    }
}
