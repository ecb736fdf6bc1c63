//! Quota counter stores.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::debug;

use formpilot_protocols::{QuotaDecision, QuotaError, QuotaStore};

/// In-memory quota counter; the single lock makes the read-then-increment
/// atomic across concurrent plans.
#[derive(Default)]
pub struct MemoryQuotaStore {
    counts: Mutex<BTreeMap<NaiveDate, u32>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a day's count (test setup and migration).
    pub fn seed(&self, date: NaiveDate, count: u32) {
        self.counts.lock().insert(date, count);
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn count(&self, date: NaiveDate) -> Result<u32, QuotaError> {
        Ok(*self.counts.lock().get(&date).unwrap_or(&0))
    }

    fn increment_if_below(&self, date: NaiveDate, max: u32) -> Result<QuotaDecision, QuotaError> {
        let mut counts = self.counts.lock();
        let count = counts.entry(date).or_insert(0);
        if *count >= max {
            return Ok(QuotaDecision::Deny { count: *count });
        }
        *count += 1;
        Ok(QuotaDecision::Allow { new_count: *count })
    }
}

/// Quota counter persisted as a JSON map of date -> count.
///
/// The file is rewritten atomically (temp file + rename) under one lock,
/// which keeps the counter single-writer across plans in this process.
pub struct JsonFileQuotaStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileQuotaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<BTreeMap<NaiveDate, u32>, QuotaError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| QuotaError::Storage(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| QuotaError::Storage(e.to_string()))
    }

    fn write(&self, counts: &BTreeMap<NaiveDate, u32>) -> Result<(), QuotaError> {
        let content =
            serde_json::to_string_pretty(counts).map_err(|e| QuotaError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).map_err(|e| QuotaError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| QuotaError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl QuotaStore for JsonFileQuotaStore {
    fn count(&self, date: NaiveDate) -> Result<u32, QuotaError> {
        let _guard = self.lock.lock();
        Ok(*self.read()?.get(&date).unwrap_or(&0))
    }

    fn increment_if_below(&self, date: NaiveDate, max: u32) -> Result<QuotaDecision, QuotaError> {
        let _guard = self.lock.lock();
        let mut counts = self.read()?;
        let count = *counts.get(&date).unwrap_or(&0);
        if count >= max {
            return Ok(QuotaDecision::Deny { count });
        }
        counts.insert(date, count + 1);
        self.write(&counts)?;
        debug!("quota for {} now {}/{}", date, count + 1, max);
        Ok(QuotaDecision::Allow { new_count: count + 1 })
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;
