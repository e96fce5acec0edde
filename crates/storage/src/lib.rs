//! Storage of the files published by the central server.
//!
//! This crate provides a trait-based store for distributed configuration
//! files. Every backend replaces rows atomically and keeps at most one row per
//! file name and per content identifier.

pub mod backends;
pub mod error;
pub mod traits;

// Re-export the main interface and types for easy access
pub use backends::{FilesystemStorage, MemoryStorage};
#[cfg(feature = "postgres")]
pub use backends::PostgresStorage;
pub use error::{Result, StorageError};
pub use traits::DistributedFilesStore;
