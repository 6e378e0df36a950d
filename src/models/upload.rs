use super::ResourceType;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// One item of an upload batch as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub public_id: String,
}

impl UploadRequest {
    pub fn new(public_id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            public_id: public_id.into(),
        }
    }

    /// Items missing either the payload or the identifier take no part in a batch.
    pub fn is_well_formed(&self) -> bool {
        !self.file.trim().is_empty() && !self.public_id.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload must be a data URL")]
    NotDataUrl,
    #[error("Malformed data URL")]
    Malformed,
    #[error("Only base64 data URLs are supported")]
    UnsupportedEncoding,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Payload is empty")]
    Empty,
}

/// Decoded upload payload together with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl MediaPayload {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Parses `data:<media-type>[;param]*;base64,<data>`.
    pub fn from_data_url(input: &str) -> Result<Self, PayloadError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(PayloadError::NotDataUrl)?;
        let (meta, encoded) = rest.split_once(',').ok_or(PayloadError::Malformed)?;

        let mut params = meta.split(';');
        let media_type = params.next().unwrap_or_default().trim();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(PayloadError::UnsupportedEncoding);
        }

        let data = STANDARD.decode(encoded.trim())?;
        if data.is_empty() {
            return Err(PayloadError::Empty);
        }

        let media_type = if media_type.is_empty() {
            DEFAULT_MEDIA_TYPE.to_string()
        } else {
            media_type.to_ascii_lowercase()
        };

        Ok(Self { media_type, data })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.data))
    }

    pub fn resource_type(&self) -> ResourceType {
        ResourceType::from_media_type(&self.media_type)
    }

    /// Short format name derived from the media subtype (`image/jpeg` -> `jpg`).
    pub fn format(&self) -> String {
        let subtype = self
            .media_type
            .split_once('/')
            .map(|(_, s)| s)
            .unwrap_or(&self.media_type);
        let subtype = subtype.split('+').next().unwrap_or(subtype);
        match subtype {
            "jpeg" | "pjpeg" => "jpg".to_string(),
            "quicktime" => "mov".to_string(),
            "x-msvideo" => "avi".to_string(),
            "x-matroska" => "mkv".to_string(),
            "octet-stream" => "bin".to_string(),
            other => other.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyExists,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already-exists",
        }
    }
}

/// Classification of a single batch item. Every well-formed item gets exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded {
        public_id: String,
        url: String,
        format: String,
        resource_type: ResourceType,
    },
    Skipped {
        public_id: String,
        reason: SkipReason,
    },
    Failed {
        public_id: String,
        reason: String,
    },
}

impl UploadOutcome {
    pub fn failed(public_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            public_id: public_id.into(),
            reason: reason.into(),
        }
    }

    pub fn public_id(&self) -> &str {
        match self {
            Self::Uploaded { public_id, .. }
            | Self::Skipped { public_id, .. }
            | Self::Failed { public_id, .. } => public_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedItem {
    pub url: String,
    pub public_id: String,
    pub format: String,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub public_id: String,
    pub error: String,
}

/// Partition of one batch's outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub uploaded: Vec<UploadedItem>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedItem>,
}

impl BatchResult {
    pub fn record(&mut self, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded {
                public_id,
                url,
                format,
                resource_type,
            } => self.uploaded.push(UploadedItem {
                url,
                public_id,
                format,
                resource_type,
            }),
            UploadOutcome::Skipped { public_id, .. } => self.skipped.push(public_id),
            UploadOutcome::Failed { public_id, reason } => self.failed.push(FailedItem {
                public_id,
                error: reason,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.uploaded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<UploadOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = UploadOutcome>>(iter: I) -> Self {
        let mut result = Self::default();
        for outcome in iter {
            result.record(outcome);
        }
        result
    }
}
