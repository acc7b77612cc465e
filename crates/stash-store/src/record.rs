use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// On-disk form of a store: the cache paired with the hash it had when
/// written.
///
/// ```text
/// { "_hash": "<hex digest>", "data": { "<key>": <value>, ... } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord<T> {
    #[serde(rename = "_hash")]
    pub hash: String,
    pub data: BTreeMap<String, T>,
}

/// Borrowed view used for encoding so the cache is not cloned on write.
#[derive(Serialize)]
struct RecordView<'a, T> {
    #[serde(rename = "_hash")]
    hash: &'a str,
    data: &'a BTreeMap<String, T>,
}

impl<T: DeserializeOwned> PersistedRecord<T> {
    /// Decode raw file bytes. Both `_hash` and `data` must be present.
    pub fn decode(bytes: &[u8], path: &Path) -> StoreResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            reason: format!("invalid UTF-8: {e}"),
        })?;
        serde_json::from_str(text).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Encode a record from borrowed parts.
pub(crate) fn encode_record<T: Serialize>(
    hash: &str,
    data: &BTreeMap<String, T>,
) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(&RecordView { hash, data })
        .map_err(|e| StoreError::Serialization(e.to_string()))
}
