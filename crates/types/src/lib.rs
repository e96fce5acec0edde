//! Shared data model for configuration part distribution.
//!
//! These types are used by the storage backends, the validator runner and the
//! registry that builds configuration manifests.

pub mod files;
pub mod identifier;
pub mod manifest;

pub use files::{DistributedFile, DistributedFileInfo, OptionalPartDescriptor};
pub use identifier::{ContentIdentifier, SourceType, UnknownSourceType};
pub use manifest::{ConfigurationPartEntry, UPDATED_AT_FORMAT, format_local_time};
