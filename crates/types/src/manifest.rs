//! Manifest entries describing which configuration parts a source publishes.

use chrono::{DateTime, Local, Utc};
use serde::{Serialize, Serializer};

use crate::identifier::ContentIdentifier;

/// Format used for `updated_at` when a manifest is rendered.
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One configuration part as seen by manifest consumers.
///
/// Entries are a read-only projection built on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationPartEntry {
    pub content_identifier: ContentIdentifier,
    pub file_name: String,
    /// `None` when the part is expected but was never published.
    #[serde(serialize_with = "serialize_local_time")]
    pub updated_at: Option<DateTime<Utc>>,
    pub optional: bool,
}

impl ConfigurationPartEntry {
    pub fn required(
        content_identifier: ContentIdentifier,
        file_name: impl Into<String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            content_identifier,
            file_name: file_name.into(),
            updated_at,
            optional: false,
        }
    }

    pub fn optional(
        content_identifier: ContentIdentifier,
        file_name: impl Into<String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            content_identifier,
            file_name: file_name.into(),
            updated_at,
            optional: true,
        }
    }
}

/// Render a timestamp in the server's local time zone.
pub fn format_local_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format(UPDATED_AT_FORMAT)
        .to_string()
}

fn serialize_local_time<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(time) => serializer.serialize_some(&format_local_time(time)),
        None => serializer.serialize_none(),
    }
}
