//! Offline — local storage, the last-updated cursor and the network queue.
//!
//! DESIGN
//! ======
//! Photos live in two places: binaries in a `LocalFilesystem`, metadata in a
//! namespaced `KeyValueStore`. Both are traits so the sync logic runs against
//! disk + `SQLite` in production and in-memory fakes in tests.

pub mod cursor;
pub mod disk;
pub mod image_store;
pub mod memory;
pub mod network;
pub mod sqlite;
pub mod types;

pub use cursor::LastUpdatedCursor;
pub use disk::TokioFilesystem;
pub use image_store::ImageStore;
pub use memory::{MemoryFilesystem, MemoryKeyValueStore};
pub use network::{Connectivity, NetworkQueue, spawn_online_listener, spawn_reconnect_timer};
pub use sqlite::SqliteKeyValueStore;
pub use types::{FileEntry, KeyValueStore, LocalFilesystem, StoreError};
