use super::{MediaStore, StoreError, StoreResult, UploadOptions};
use crate::models::{AssetKey, AssetRecord, DeleteOutcome, Folder, MediaPayload, ResourceType};
use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

struct StoredAsset {
    record: AssetRecord,
    seq: u64,
    data: Vec<u8>,
}

/// In-process store with the same conflict and lookup semantics as the
/// remote backend. Keys are full ids (`folder/public_id`).
pub struct MemoryStore {
    base_url: String,
    assets: RwLock<BTreeMap<String, StoredAsset>>,
    folders: RwLock<BTreeSet<String>>,
    seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory://mediadesk")
    }
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            assets: RwLock::new(BTreeMap::new()),
            folders: RwLock::new(BTreeSet::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Register `path` and its ancestors as folders.
    pub fn create_folder(&self, path: &str) {
        let mut folders = self.folders.write().unwrap_or_else(PoisonError::into_inner);
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            folders.insert(current.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored bytes of the asset at `key`, if any.
    pub fn contents(&self, key: &AssetKey) -> Option<Vec<u8>> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key.full_id())
            .map(|stored| stored.data.clone())
    }

    fn secure_url(&self, resource_type: ResourceType, full_id: &str, format: &str) -> String {
        format!(
            "{}/{}/upload/{}.{}",
            self.base_url, resource_type, full_id, format
        )
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn resource(&self, key: &AssetKey) -> StoreResult<AssetRecord> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key.full_id())
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StoreError::NotFound(key.full_id()))
    }

    async fn upload(
        &self,
        key: &AssetKey,
        payload: &MediaPayload,
        resource_type: ResourceType,
        options: UploadOptions,
    ) -> StoreResult<AssetRecord> {
        if payload.is_empty() {
            return Err(StoreError::Backend("Empty file".to_string()));
        }

        let mut full_id = key.full_id();
        let mut assets = self.assets.write().unwrap_or_else(PoisonError::into_inner);
        if assets.contains_key(&full_id) {
            if options.unique_filename {
                let suffix: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(6)
                    .map(char::from)
                    .collect();
                full_id = format!("{}_{}", full_id, suffix.to_lowercase());
            } else if !options.overwrite {
                return Err(StoreError::Conflict(full_id));
            }
        }

        let format = payload.format();
        let record = AssetRecord {
            secure_url: self.secure_url(resource_type, &full_id, &format),
            public_id: full_id.clone(),
            folder: key.folder().to_string(),
            resource_type,
            format,
            bytes: payload.len() as u64,
            width: None,
            height: None,
            created_at: Utc::now(),
        };
        assets.insert(
            full_id,
            StoredAsset {
                record: record.clone(),
                seq: self.seq.fetch_add(1, Ordering::Relaxed),
                data: payload.data.clone(),
            },
        );
        drop(assets);

        self.create_folder(key.folder());
        Ok(record)
    }

    async fn search_folder(
        &self,
        folder: &str,
        max_results: usize,
    ) -> StoreResult<Vec<AssetRecord>> {
        let prefix = format!("{}/", folder);
        let assets = self.assets.read().unwrap_or_else(PoisonError::into_inner);
        let mut matches: Vec<&StoredAsset> = assets
            .values()
            .filter(|stored| {
                stored.record.folder == folder || stored.record.folder.starts_with(&prefix)
            })
            .collect();
        matches.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(matches
            .into_iter()
            .take(max_results)
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn destroy(
        &self,
        key: &AssetKey,
        resource_type: ResourceType,
    ) -> StoreResult<DeleteOutcome> {
        let mut assets = self.assets.write().unwrap_or_else(PoisonError::into_inner);
        let full_id = key.full_id();
        match assets.get(&full_id) {
            Some(stored) if stored.record.resource_type == resource_type => {
                assets.remove(&full_id);
                Ok(DeleteOutcome::Deleted)
            }
            _ => Ok(DeleteOutcome::NotFound),
        }
    }

    async fn root_folders(&self) -> StoreResult<Vec<Folder>> {
        let folders = self.folders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(folders
            .iter()
            .filter(|path| !path.contains('/'))
            .map(|path| Folder {
                name: path.clone(),
                path: path.clone(),
            })
            .collect())
    }

    async fn sub_folders(&self, path: &str) -> StoreResult<Vec<Folder>> {
        let folders = self.folders.read().unwrap_or_else(PoisonError::into_inner);
        if !folders.contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let prefix = format!("{}/", path);
        Ok(folders
            .iter()
            .filter_map(|candidate| {
                let name = candidate.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| Folder {
                    name: name.to_string(),
                    path: candidate.clone(),
                })
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
