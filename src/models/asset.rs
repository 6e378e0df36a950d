use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const MAX_FOLDER_LENGTH: usize = 255;
const MAX_PUBLIC_ID_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Image,
    Video,
}

impl ResourceType {
    /// Infers the resource category from a declared media type. Only the
    /// declared type is consulted: `video/*` is a video, everything else an image.
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("video/")
        {
            Self::Video
        } else {
            Self::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl FromStr for ResourceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Folder is required")]
    EmptyFolder,
    #[error("Invalid folder '{0}'")]
    InvalidFolder(String),
    #[error("Public ID is required")]
    EmptyPublicId,
    #[error("Invalid public ID '{0}': must not contain path separators")]
    InvalidPublicId(String),
}

/// Checks that `folder` is a relative path of non-empty segments.
pub fn validate_folder(folder: &str) -> Result<(), KeyError> {
    if folder.is_empty() {
        return Err(KeyError::EmptyFolder);
    }
    if folder.len() > MAX_FOLDER_LENGTH
        || folder.contains('\\')
        || folder
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == ".." || segment.trim() != segment)
    {
        return Err(KeyError::InvalidFolder(folder.to_string()));
    }
    Ok(())
}

pub fn validate_public_id(public_id: &str) -> Result<(), KeyError> {
    if public_id.is_empty() {
        return Err(KeyError::EmptyPublicId);
    }
    if public_id.len() > MAX_PUBLIC_ID_LENGTH
        || public_id.contains('/')
        || public_id.contains('\\')
        || public_id == "."
        || public_id == ".."
    {
        return Err(KeyError::InvalidPublicId(public_id.to_string()));
    }
    Ok(())
}

/// Composite identifier of one asset in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    folder: String,
    public_id: String,
}

impl AssetKey {
    pub fn new(folder: &str, public_id: &str) -> Result<Self, KeyError> {
        validate_folder(folder)?;
        validate_public_id(public_id)?;
        Ok(Self {
            folder: folder.to_string(),
            public_id: public_id.to_string(),
        })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    pub fn full_id(&self) -> String {
        format!("{}/{}", self.folder, self.public_id)
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.folder, self.public_id)
    }
}

/// Read model of an asset as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    pub public_id: String,
    pub folder: String,
    pub secure_url: String,
    pub resource_type: ResourceType,
    pub format: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

impl DeleteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "ok",
            Self::NotFound => "not found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub name: String,
    pub path: String,
}
