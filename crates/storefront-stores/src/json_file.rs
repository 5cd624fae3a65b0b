//! OverlayStore backed by one JSON document on disk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use storefront_core::overlay::{OverlayRecord, OverlayStore, StoreError};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct OverlayDocument {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<OverlayRecord>,
}

impl Default for OverlayDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            saved_at: None,
            records: Vec::new(),
        }
    }
}

/// Whole-file JSON store. Every save rewrites the document through a
/// temporary sibling file and a rename; saves are serialized in-process.
pub struct JsonFileOverlayStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileOverlayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<OverlayDocument, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(OverlayDocument::default())
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OverlayDocument::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_document(&self, document: &OverlayDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl OverlayStore for JsonFileOverlayStore {
    async fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        Ok(self.read_document().await?.records)
    }

    async fn save(
        &self,
        parent_id: Option<&str>,
        ordered_ids: &[String],
        hidden_ids: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        let record = OverlayRecord::new(
            parent_id.map(str::to_string),
            ordered_ids.to_vec(),
            hidden_ids.clone(),
        );
        match document
            .records
            .iter_mut()
            .find(|existing| existing.parent_id.as_deref() == parent_id)
        {
            Some(existing) => *existing = record,
            None => document.records.push(record),
        }
        document.version = DOCUMENT_VERSION;
        document.saved_at = Some(Utc::now());
        self.write_document(&document).await?;
        debug!(
            path = %self.path.display(),
            parent_id = ?parent_id,
            records = document.records.len(),
            "overlay saved"
        );
        Ok(())
    }
}
