use super::SecureStore;
use crate::descriptor::Descriptor;
use crate::error::{PendingError, Result};
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory store for tests.
///
/// Uses `RefCell` since the transaction log is driven from a single thread.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<Descriptor, Vec<u8>>>,
    simulate_write_error: RefCell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Test helper to plant raw bytes, e.g. a corrupt record.
    pub fn insert_raw(&self, key: &Descriptor, data: &[u8]) {
        self.records.borrow_mut().insert(key.clone(), data.to_vec());
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &Descriptor) -> Result<Option<Vec<u8>>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn set(&self, key: &Descriptor, data: &[u8]) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(PendingError::Store("Simulated write error".to_string()));
        }
        self.records.borrow_mut().insert(key.clone(), data.to_vec());
        Ok(())
    }

    fn erase(&self, key: &Descriptor) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(PendingError::Store("Simulated write error".to_string()));
        }
        self.records.borrow_mut().remove(key);
        Ok(())
    }
}
