//! Asset value type.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::Result;

/// One theme file's identity and content.
///
/// Text files carry their content in `value`; binary files carry it
/// base64-encoded in `attachment`. An empty string means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Project-relative path, always `/`-separated.
    pub key: String,
    /// Text payload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Base64 payload for binary content.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attachment: String,
}

impl Asset {
    /// Create a text asset.
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            attachment: String::new(),
        }
    }

    /// Create a binary asset, encoding `bytes` as base64.
    pub fn binary(key: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            attachment: STANDARD.encode(bytes),
        }
    }

    /// Create an asset that carries only its key, as reported for removals.
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// An asset is valid when it has a key and some payload.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty() && (!self.value.is_empty() || !self.attachment.is_empty())
    }

    /// Length of the populated payload as stored, not decoded.
    #[must_use]
    pub fn size(&self) -> usize {
        if self.value.is_empty() {
            self.attachment.len()
        } else {
            self.value.len()
        }
    }

    /// Whether the asset is a JSON document and gets canonicalised.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.key.ends_with(".json")
    }

    /// The bytes this asset represents on disk.
    ///
    /// Attachments are base64-decoded. JSON values are parsed and
    /// re-serialized with two-space indentation. Anything else is the
    /// value's raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Encoding` for an attachment that is not valid
    /// base64 and `AssetError::MalformedContent` for a `.json` value that
    /// does not parse.
    pub fn contents(&self) -> Result<Vec<u8>> {
        if !self.attachment.is_empty() {
            return STANDARD
                .decode(self.attachment.as_bytes())
                .map_err(|e| AssetError::Encoding(e).into());
        }

        if self.is_json() {
            let parsed: serde_json::Value =
                serde_json::from_str(&self.value).map_err(|source| {
                    AssetError::MalformedContent {
                        key: self.key.clone(),
                        source,
                    }
                })?;
            return serde_json::to_vec_pretty(&parsed).map_err(|source| {
                AssetError::MalformedContent {
                    key: self.key.clone(),
                    source,
                }
                .into()
            });
        }

        Ok(self.value.as_bytes().to_vec())
    }

    /// Write the asset's contents to `base/key`.
    ///
    /// `base` must already exist; directories named by the key below it
    /// are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is missing, the contents cannot be
    /// decoded, or the file cannot be written.
    pub fn write(&self, base: impl AsRef<Path>) -> Result<()> {
        let base = base.as_ref();
        if !fs::metadata(base)?.is_dir() {
            return Err(AssetError::not_a_directory(base).into());
        }

        let contents = self.contents()?;
        let target = base.join(&self.key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;

        tracing::debug!(key = %self.key, path = %target.display(), "Wrote asset");
        Ok(())
    }
}
