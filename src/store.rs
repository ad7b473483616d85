//! Keyed storage of fit results.
//!
//! Records are kept in insertion order. Storing a result for a key that is
//! already present replaces the old record and moves it to the end, so the
//! last record for a wire is always the most recent fit.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::fit::FitResult;
use crate::profile::{Direction, ProfileKey};

/// Insertion-ordered fit results, at most one per key.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: Vec<FitResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a result under its profile key.
    ///
    /// # Returns
    ///
    /// * The result previously stored under the same key, if any
    pub fn store(&mut self, result: FitResult) -> Option<FitResult> {
        let replaced = self.remove(result.key());
        if replaced.is_some() {
            log::debug!("{}: replacing stored fit", result.key());
        }
        self.records.push(result);
        replaced
    }

    pub fn get(&self, key: &ProfileKey) -> Option<&FitResult> {
        self.records.iter().find(|record| record.key() == key)
    }

    /// All records with their keys, oldest first.
    pub fn all(&self) -> impl Iterator<Item = (&ProfileKey, &FitResult)> + '_ {
        self.records.iter().map(|record| (record.key(), record))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn remove(&mut self, key: &ProfileKey) -> Option<FitResult> {
        let index = self.records.iter().position(|record| record.key() == key)?;
        Some(self.records.remove(index))
    }

    /// Most recently stored result for a wire and direction, across files.
    pub fn find_latest(&self, wire: &str, direction: Direction) -> Option<&FitResult> {
        self.records
            .iter()
            .rev()
            .find(|record| record.key().wire == wire && record.key().direction == direction)
    }

    /// Distinct wire names in first-seen order.
    pub fn wires(&self) -> Vec<String> {
        let mut wires: Vec<String> = Vec::new();
        for record in &self.records {
            if !wires.iter().any(|wire| *wire == record.key().wire) {
                wires.push(record.key().wire.clone());
            }
        }
        wires
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A [`ResultStore`] shared between threads.
///
/// Writers are serialized by the lock; readers receive clones so no guard
/// outlives a call. A poisoned lock is recovered, since every mutation leaves
/// the store consistent.
#[derive(Debug, Clone, Default)]
pub struct SharedResultStore {
    inner: Arc<RwLock<ResultStore>>,
}

impl SharedResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ResultStore> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResultStore> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn store(&self, result: FitResult) -> Option<FitResult> {
        self.write().store(result)
    }

    pub fn get(&self, key: &ProfileKey) -> Option<FitResult> {
        self.read().get(key).cloned()
    }

    pub fn all(&self) -> Vec<(ProfileKey, FitResult)> {
        self.read()
            .all()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn remove(&self, key: &ProfileKey) -> Option<FitResult> {
        self.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> ResultStore {
        self.read().clone()
    }
}
