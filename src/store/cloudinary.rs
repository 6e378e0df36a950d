//! Cloudinary backend over its REST upload and admin APIs.
//!
//! Writes (upload, destroy) are signed: the sorted `key=value` parameters
//! joined with `&`, followed by the API secret, hashed with SHA-1. Reads
//! (resource lookup, search, folders) use HTTP basic auth.

use super::{MediaStore, StoreError, StoreResult, UploadOptions};
use crate::config::StoreConfig;
use crate::models::{AssetKey, AssetRecord, DeleteOutcome, Folder, MediaPayload, ResourceType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Request(err.to_string())
    }
}

pub struct CloudinaryStore {
    client: Client,
    base_url: Url,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct ResourceBody {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    resource_type: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    asset_folder: Option<String>,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    existing: bool,
}

impl ResourceBody {
    fn into_record(self) -> AssetRecord {
        let folder = self
            .folder
            .filter(|f| !f.is_empty())
            .or(self.asset_folder.filter(|f| !f.is_empty()))
            .or_else(|| {
                self.public_id
                    .rsplit_once('/')
                    .map(|(folder, _)| folder.to_string())
            })
            .unwrap_or_default();
        AssetRecord {
            resource_type: self
                .resource_type
                .and_then(|rt| rt.parse().ok())
                .unwrap_or_default(),
            format: self.format.unwrap_or_default(),
            public_id: self.public_id,
            folder,
            secure_url: self.secure_url,
            bytes: self.bytes,
            width: self.width,
            height: self.height,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    resources: Vec<ResourceBody>,
}

#[derive(Debug, Deserialize)]
struct FoldersBody {
    #[serde(default)]
    folders: Vec<FolderBody>,
}

#[derive(Debug, Deserialize)]
struct FolderBody {
    name: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct DestroyBody {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| StoreError::Config(format!("store.{} is required", name)))
        };

        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| StoreError::Config(format!("store.api_base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(
                "store.api_base_url must be an http(s) URL".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            cloud_name: required(&config.cloud_name, "cloud_name")?,
            api_key: required(&config.api_key, "api_key")?,
            api_secret: required(&config.api_secret, "api_secret")?,
        })
    }

    /// `<base>/v1_1/<cloud>/<segments...>`; segments containing `/` are split.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::Config("store.api_base_url cannot be a base".to_string()))?;
            path.pop_if_empty().push("v1_1").push(&self.cloud_name);
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    fn sign(&self, params: &BTreeMap<&'static str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> Vec<(&'static str, String)> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);
        let mut form: Vec<(&'static str, String)> = params.into_iter().collect();
        form.push(("api_key", self.api_key.clone()));
        form.push(("signature", signature));
        form
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> StoreResult<T> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;
        read_json(response).await
    }

    async fn resource_of_type(
        &self,
        key: &AssetKey,
        resource_type: ResourceType,
    ) -> StoreResult<AssetRecord> {
        let full_id = key.full_id();
        let url = self.endpoint(&["resources", resource_type.as_str(), "upload", &full_id])?;
        let body: ResourceBody = self.get_json(url).await?;
        Ok(body.into_record())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("Unexpected response: {}", e)));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Backend(format!("{}: {}", status.as_u16(), message)),
    })
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn resource(&self, key: &AssetKey) -> StoreResult<AssetRecord> {
        match self.resource_of_type(key, ResourceType::Image).await {
            Err(e) if e.is_not_found() => self.resource_of_type(key, ResourceType::Video).await,
            other => other,
        }
    }

    async fn upload(
        &self,
        key: &AssetKey,
        payload: &MediaPayload,
        resource_type: ResourceType,
        options: UploadOptions,
    ) -> StoreResult<AssetRecord> {
        let mut params = BTreeMap::new();
        params.insert("folder", key.folder().to_string());
        params.insert("public_id", key.public_id().to_string());
        params.insert("overwrite", options.overwrite.to_string());
        params.insert("unique_filename", options.unique_filename.to_string());

        let mut form = self.signed_form(params);
        form.push(("file", payload.to_data_url()));

        let url = self.endpoint(&[resource_type.as_str(), "upload"])?;
        let response = self.client.post(url).form(&form).send().await?;
        let body: ResourceBody = read_json(response).await?;

        // With overwrite disabled an occupied key answers 200 with `existing: true`
        // and the old asset; nothing was written.
        if body.existing && !options.overwrite {
            return Err(StoreError::Conflict(key.full_id()));
        }
        Ok(body.into_record())
    }

    async fn search_folder(
        &self,
        folder: &str,
        max_results: usize,
    ) -> StoreResult<Vec<AssetRecord>> {
        let url = self.endpoint(&["resources", "search"])?;
        let query = serde_json::json!({
            "expression": format!("folder:{}/*", escape_search_term(folder)),
            "sort_by": [{ "created_at": "desc" }],
            "max_results": max_results,
        });
        let response = self
            .client
            .post(url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&query)
            .send()
            .await?;
        let body: SearchBody = read_json(response).await?;
        Ok(body
            .resources
            .into_iter()
            .map(ResourceBody::into_record)
            .collect())
    }

    async fn destroy(
        &self,
        key: &AssetKey,
        resource_type: ResourceType,
    ) -> StoreResult<DeleteOutcome> {
        let mut params = BTreeMap::new();
        params.insert("public_id", key.full_id());
        let form = self.signed_form(params);

        let url = self.endpoint(&[resource_type.as_str(), "destroy"])?;
        let response = self.client.post(url).form(&form).send().await?;
        let body: DestroyBody = read_json(response).await?;
        match body.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::NotFound),
            other => Err(StoreError::Backend(format!("Unexpected destroy result: {}", other))),
        }
    }

    async fn root_folders(&self) -> StoreResult<Vec<Folder>> {
        let body: FoldersBody = self.get_json(self.endpoint(&["folders"])?).await?;
        Ok(body.folders.into_iter().map(into_folder).collect())
    }

    async fn sub_folders(&self, path: &str) -> StoreResult<Vec<Folder>> {
        let body: FoldersBody = self.get_json(self.endpoint(&["folders", path])?).await?;
        Ok(body.folders.into_iter().map(into_folder).collect())
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}

fn into_folder(body: FolderBody) -> Folder {
    Folder {
        name: body.name,
        path: body.path,
    }
}

/// Backslash-escapes the characters the search expression grammar reserves.
fn escape_search_term(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_whitespace() || "!(){}[]*^~?:\\=&><\"".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
