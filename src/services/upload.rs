//! Batch upload orchestration.
//!
//! Each well-formed item is classified as uploaded, skipped or failed,
//! independently of the others; the batch itself never fails. Items are
//! processed concurrently, except that items sharing a composite key run
//! one after another so a duplicate inside a batch sees its predecessor.

use super::existence;
use crate::models::{
    AssetKey, BatchResult, MediaPayload, SkipReason, UploadOutcome, UploadRequest,
};
use crate::store::{MediaStore, UploadOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_file_size: usize,
    pub concurrency: usize,
    pub item_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            concurrency: 4,
            item_timeout: Duration::from_secs(60),
        }
    }
}

/// Well-formed items of one batch grouped by composite id, in order of first
/// appearance. Scoped to a single `submit` call.
#[derive(Default)]
struct KeyQueues {
    order: Vec<String>,
    queues: HashMap<String, Vec<(usize, UploadRequest)>>,
}

impl KeyQueues {
    fn push(&mut self, folder: &str, index: usize, request: UploadRequest) {
        let id = format!("{}/{}", folder, request.public_id);
        let queue = self.queues.entry(id.clone()).or_insert_with(|| {
            self.order.push(id);
            Vec::new()
        });
        queue.push((index, request));
    }

    fn into_queues(mut self) -> impl Iterator<Item = Vec<(usize, UploadRequest)>> {
        self.order
            .into_iter()
            .filter_map(move |id| self.queues.remove(&id))
    }
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    store: Arc<dyn MediaStore>,
    settings: UploadSettings,
}

impl UploadOrchestrator {
    pub fn new(store: Arc<dyn MediaStore>, settings: UploadSettings) -> Self {
        Self { store, settings }
    }

    pub async fn submit(&self, batch: Vec<UploadRequest>, folder: &str) -> BatchResult {
        let mut queues = KeyQueues::default();
        let mut public_ids = Vec::new();

        for request in batch {
            if !request.is_well_formed() {
                tracing::debug!(public_id = %request.public_id, "Dropping malformed batch item");
                continue;
            }
            let index = public_ids.len();
            public_ids.push(request.public_id.clone());
            queues.push(folder, index, request);
        }

        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for queue in queues.into_queues() {
            let store = self.store.clone();
            let settings = self.settings.clone();
            let permits = permits.clone();
            let folder = folder.to_string();

            tasks.spawn(async move {
                let mut outcomes = Vec::with_capacity(queue.len());
                for (index, request) in queue {
                    // The semaphore is never closed.
                    let _permit = permits.acquire().await.ok();
                    let public_id = request.public_id.clone();
                    // Own task per item, so a panic costs only this item's outcome.
                    let item = tokio::spawn(run_item(
                        store.clone(),
                        settings.clone(),
                        folder.clone(),
                        request,
                    ));
                    let outcome = match item.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(public_id = %public_id, "Upload item aborted: {}", e);
                            UploadOutcome::failed(public_id, "internal error")
                        }
                    };
                    outcomes.push((index, outcome));
                }
                outcomes
            });
        }

        let mut slots: Vec<Option<UploadOutcome>> = public_ids.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcomes) => {
                    for (index, outcome) in outcomes {
                        tracing::debug!(public_id = %outcome.public_id(), "Upload item classified");
                        slots[index] = Some(outcome);
                    }
                }
                Err(e) => tracing::error!("Upload task aborted: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(public_ids)
            .map(|(slot, public_id)| {
                slot.unwrap_or_else(|| UploadOutcome::failed(public_id, "internal error"))
            })
            .collect()
    }
}

async fn run_item(
    store: Arc<dyn MediaStore>,
    settings: UploadSettings,
    folder: String,
    request: UploadRequest,
) -> UploadOutcome {
    let public_id = request.public_id.clone();
    match tokio::time::timeout(
        settings.item_timeout,
        process_item(store.as_ref(), &settings, &folder, request),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(public_id = %public_id, "Upload item timed out");
            UploadOutcome::failed(public_id, "timeout")
        }
    }
}

async fn process_item(
    store: &dyn MediaStore,
    settings: &UploadSettings,
    folder: &str,
    request: UploadRequest,
) -> UploadOutcome {
    let UploadRequest { file, public_id } = request;

    let key = match AssetKey::new(folder, &public_id) {
        Ok(key) => key,
        Err(e) => return UploadOutcome::failed(public_id, e.to_string()),
    };

    let payload = match MediaPayload::from_data_url(&file) {
        Ok(payload) => payload,
        Err(e) => return UploadOutcome::failed(public_id, e.to_string()),
    };
    if payload.len() > settings.max_file_size {
        return UploadOutcome::failed(
            public_id,
            format!(
                "File too large: {} bytes (max {} bytes)",
                payload.len(),
                settings.max_file_size
            ),
        );
    }

    let resource_type = payload.resource_type();

    if existence::exists(store, &key).await {
        tracing::info!(key = %key, "Asset already exists, skipping");
        return UploadOutcome::Skipped {
            public_id,
            reason: SkipReason::AlreadyExists,
        };
    }

    match store
        .upload(&key, &payload, resource_type, UploadOptions::create_only())
        .await
    {
        Ok(record) => {
            tracing::debug!(key = %key, url = %record.secure_url, "Asset uploaded");
            UploadOutcome::Uploaded {
                public_id,
                url: record.secure_url,
                format: if record.format.is_empty() {
                    payload.format()
                } else {
                    record.format
                },
                resource_type,
            }
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Upload failed");
            UploadOutcome::failed(public_id, e.to_string())
        }
    }
}
