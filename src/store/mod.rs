//! Remote media store abstraction.
//!
//! The store owns asset bytes, folders and the asset read model. Everything
//! in this crate reaches it through [`MediaStore`]; backends are chosen from
//! configuration by [`connect`].

#[cfg(feature = "cloudinary")]
mod cloudinary;
mod memory;

#[cfg(feature = "cloudinary")]
pub use cloudinary::CloudinaryStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::models::{AssetKey, AssetRecord, DeleteOutcome, Folder, MediaPayload, ResourceType};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Request to media store failed: {0}")]
    Request(String),

    #[error("Media store error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Options forwarded with every store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub overwrite: bool,
    pub unique_filename: bool,
}

impl UploadOptions {
    /// Write exactly at the requested key, failing rather than replacing or renaming.
    pub const fn create_only() -> Self {
        Self {
            overwrite: false,
            unique_filename: false,
        }
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch the asset stored at `key`, whatever its resource type.
    async fn resource(&self, key: &AssetKey) -> StoreResult<AssetRecord>;

    async fn upload(
        &self,
        key: &AssetKey,
        payload: &MediaPayload,
        resource_type: ResourceType,
        options: UploadOptions,
    ) -> StoreResult<AssetRecord>;

    /// Assets in `folder` and below, newest first, at most `max_results`.
    async fn search_folder(&self, folder: &str, max_results: usize)
        -> StoreResult<Vec<AssetRecord>>;

    async fn destroy(&self, key: &AssetKey, resource_type: ResourceType)
        -> StoreResult<DeleteOutcome>;

    async fn root_folders(&self) -> StoreResult<Vec<Folder>>;

    async fn sub_folders(&self, path: &str) -> StoreResult<Vec<Folder>>;

    fn backend_name(&self) -> &'static str;
}

/// Build the store backend selected in configuration.
pub fn connect(config: &StoreConfig) -> anyhow::Result<Arc<dyn MediaStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory media store; assets are lost on restart");
            Ok(Arc::new(MemoryStore::new(config.memory_base_url())))
        }
        #[cfg(feature = "cloudinary")]
        StoreBackend::Cloudinary => Ok(Arc::new(CloudinaryStore::new(config)?)),
        #[cfg(not(feature = "cloudinary"))]
        StoreBackend::Cloudinary => {
            anyhow::bail!("mediadesk was built without the `cloudinary` feature")
        }
    }
}
