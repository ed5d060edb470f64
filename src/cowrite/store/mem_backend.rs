use super::backend::StorageBackend;
use crate::error::{CowriteError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct MemState {
    entries: HashMap<String, String>,
    writes: usize,
    simulate_write_error: bool,
    simulate_read_error: bool,
}

/// In-memory storage backend for testing.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the store (or a session running on another task) owns the other one.
#[derive(Clone, Default)]
pub struct MemBackend {
    state: Arc<Mutex<MemState>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.state.lock().simulate_write_error = simulate;
    }

    /// Enable read error simulation for testing error handling.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.state.lock().simulate_read_error = simulate;
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Test helper to plant a raw value, bypassing the write counter.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.state
            .lock()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    /// Test helper to inspect the raw stored value.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let state = self.state.lock();
        if state.simulate_read_error {
            return Err(CowriteError::PersistenceUnavailable(
                "Simulated read error".to_string(),
            ));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.simulate_write_error {
            return Err(CowriteError::PersistenceUnavailable(
                "Simulated write error".to_string(),
            ));
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}
