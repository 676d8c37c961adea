//! Resumable upload sessions.
//!
//! A session is created with a declared total length and grows by appending
//! chunks at its current offset until `upload_offset == upload_length`.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

use crate::ids::{UploadId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Upload {
    pub id: UploadId,
    pub owner_id: UserId,
    pub filename: Option<String>,
    pub filetype: Option<String>,
    /// Declared total size in bytes
    pub upload_length: i64,
    /// Bytes received so far
    pub upload_offset: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Upload {
    pub fn is_complete(&self) -> bool {
        self.upload_offset >= self.upload_length
    }

    pub fn remaining(&self) -> i64 {
        (self.upload_length - self.upload_offset).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Upload-Metadata entry has an empty key")]
    EmptyKey,
    #[error("Upload-Metadata value for '{0}' is not valid base64")]
    InvalidBase64(String),
    #[error("Upload-Metadata value for '{0}' is not valid UTF-8")]
    InvalidUtf8(String),
    #[error("Upload-Metadata value for '{0}' exceeds {max} characters", max = MAX_STORED_VALUE_CHARS)]
    TooLong(String),
}

/// Column width of the stored `filename` and `filetype`.
pub const MAX_STORED_VALUE_CHARS: usize = 255;

const STORED_KEYS: [&str; 2] = ["filename", "filetype"];

/// Decoded `Upload-Metadata` header.
///
/// The header is a comma-separated list of `key base64value` pairs; a key may
/// appear without a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    pub entries: HashMap<String, String>,
}

impl UploadMetadata {
    pub fn parse(header: &str) -> Result<Self, MetadataError> {
        let mut entries = HashMap::new();

        for pair in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut parts = pair.splitn(2, ' ');
            let key = parts.next().unwrap_or_default().trim();
            if key.is_empty() {
                return Err(MetadataError::EmptyKey);
            }

            let value = match parts.next().map(str::trim) {
                Some(encoded) if !encoded.is_empty() => {
                    let bytes = STANDARD
                        .decode(encoded)
                        .map_err(|_| MetadataError::InvalidBase64(key.to_string()))?;
                    String::from_utf8(bytes)
                        .map_err(|_| MetadataError::InvalidUtf8(key.to_string()))?
                }
                _ => String::new(),
            };

            if STORED_KEYS.contains(&key) && value.chars().count() > MAX_STORED_VALUE_CHARS {
                return Err(MetadataError::TooLong(key.to_string()));
            }

            entries.insert(key.to_string(), value);
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn filename(&self) -> Option<&str> {
        self.get("filename")
    }

    pub fn filetype(&self) -> Option<&str> {
        self.get("filetype")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filename_and_type() {
        // "world.txt" and "text/plain"
        let meta = UploadMetadata::parse("filename d29ybGQudHh0,filetype dGV4dC9wbGFpbg==").unwrap();
        assert_eq!(meta.filename(), Some("world.txt"));
        assert_eq!(meta.filetype(), Some("text/plain"));
    }

    #[test]
    fn test_parse_key_without_value() {
        let meta = UploadMetadata::parse("is_confidential, filename d29ybGQudHh0").unwrap();
        assert!(meta.entries.contains_key("is_confidential"));
        assert_eq!(meta.get("is_confidential"), None);
        assert_eq!(meta.filename(), Some("world.txt"));
    }

    #[test]
    fn test_parse_empty_header() {
        assert_eq!(UploadMetadata::parse("").unwrap(), UploadMetadata::default());
    }

    #[test]
    fn test_parse_invalid_base64() {
        assert_eq!(
            UploadMetadata::parse("filename !!!"),
            Err(MetadataError::InvalidBase64("filename".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_overlong_stored_values() {
        let long = STANDARD.encode("a".repeat(MAX_STORED_VALUE_CHARS + 1));
        assert_eq!(
            UploadMetadata::parse(&format!("filename {long}")),
            Err(MetadataError::TooLong("filename".to_string()))
        );
        assert_eq!(
            UploadMetadata::parse(&format!("filetype {long}")),
            Err(MetadataError::TooLong("filetype".to_string()))
        );

        // Multi-byte characters count once each, like the column does.
        let exact = STANDARD.encode("é".repeat(MAX_STORED_VALUE_CHARS));
        let meta = UploadMetadata::parse(&format!("filename {exact}")).unwrap();
        assert_eq!(meta.filename().map(|f| f.chars().count()), Some(MAX_STORED_VALUE_CHARS));

        // Keys that are not stored are not limited.
        assert!(UploadMetadata::parse(&format!("note {long}")).is_ok());
    }

    #[test]
    fn test_upload_progress() {
        let now = Utc::now();
        let mut upload = Upload {
            id: UploadId::new(),
            owner_id: UserId::new(),
            filename: None,
            filetype: None,
            upload_length: 10,
            upload_offset: 4,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!upload.is_complete());
        assert_eq!(upload.remaining(), 6);

        upload.upload_offset = 10;
        assert!(upload.is_complete());
        assert_eq!(upload.remaining(), 0);
    }
}
