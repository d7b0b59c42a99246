//! # Storage Layer
//!
//! Pending transactions are persisted in a secure keyed store shared by every process
//! that opens the same database file (the AutoFill extension and the main app). The
//! store is a plain byte container keyed by [`Descriptor`]; encoding and decoding
//! happen in the [`manager`](crate::manager).
//!
//! ## Contract
//!
//! - `get` returns `Ok(None)` when nothing is stored for the key
//! - `set` replaces the whole record
//! - `erase` is idempotent
//!
//! Methods take `&self`; implementations handle their own interior mutability.
//! Nothing here provides cross-process locking.
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: for tests, with write-error simulation
//! - [`fs::DirStore`]: one JSON file per descriptor inside a directory
//!
//! ## Storage Layout
//!
//! ```text
//! pending/
//! └── pending-{uuid-v5(descriptor)}.json
//! ```

use crate::descriptor::Descriptor;
use crate::error::Result;

pub mod fs;
pub mod memory;

pub trait SecureStore {
    /// Load the record stored under `key`, if any.
    fn get(&self, key: &Descriptor) -> Result<Option<Vec<u8>>>;

    /// Store `data` under `key`, replacing any previous record.
    fn set(&self, key: &Descriptor, data: &[u8]) -> Result<()>;

    /// Remove the record under `key`. Removing a missing record is not an error.
    fn erase(&self, key: &Descriptor) -> Result<()>;
}
