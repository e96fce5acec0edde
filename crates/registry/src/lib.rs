//! Registry of the configuration parts distributed by the central server.
//!
//! The registry knows which parts every source must publish (the catalog),
//! which optional parts are installed (an [`OptionalPartsSource`]) and what is
//! currently stored (a [`confparts_storage::DistributedFilesStore`]).
//!
//! ```rust
//! use std::sync::Arc;
//! use confparts_registry::{DistributedFilesRegistry, StaticOptionalParts};
//! use confparts_storage::MemoryStorage;
//! use confparts_types::SourceType;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = DistributedFilesRegistry::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(StaticOptionalParts::empty()),
//! );
//!
//! registry
//!     .save_configuration_part("shared-params.xml", b"<conf/>".to_vec())
//!     .await?;
//!
//! let manifest = registry.configuration_parts_json(SourceType::External).await?;
//! println!("{manifest}");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod optional_parts;
pub mod registry;
pub mod upload;

pub use catalog::{FILE_NAME_PRIVATE_PARAMETERS, FILE_NAME_SHARED_PARAMETERS, RequiredPart};
pub use error::{RegistryError, Result};
pub use optional_parts::{
    DirectoryOptionalParts, OptionalPartsScan, OptionalPartsSource, RegistrationError,
    StaticOptionalParts,
};
pub use registry::DistributedFilesRegistry;
pub use upload::{OptionalPartUploader, UploadOutcome};
