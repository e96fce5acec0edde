//! Validation of uploaded configuration parts by external programs.
//!
//! Operators install validation programs next to optional configuration
//! parts. [`ExternalValidator`] runs such a program against an upload and
//! turns its exit status and output streams into either a [`ValidatedPart`]
//! or a [`ValidationError`].
//!
//! ```rust,no_run
//! use std::path::Path;
//! use confparts_types::ContentIdentifier;
//! use confparts_validator::{ExternalValidator, ValidatorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = ExternalValidator::new(ValidatorConfig::default());
//! let part = validator
//!     .run(
//!         Path::new("/usr/share/confparts/validate-monitoring.sh"),
//!         b"<monitoring/>",
//!         &ContentIdentifier::new("MONITORING"),
//!     )
//!     .await?;
//!
//! for warning in &part.warnings {
//!     println!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod runner;

pub use error::{Result, ValidationError};
pub use runner::{ExternalValidator, ValidatedPart, ValidatorConfig};
