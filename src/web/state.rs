use crate::services::session::SessionStore;
use crate::services::upload::{UploadOrchestrator, UploadSettings};
use crate::store::MediaStore;
use crate::web::security::RateLimiter;
use crate::Config;
use anyhow::Result;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn MediaStore>,
    pub sessions: SessionStore,
    pub uploads: UploadOrchestrator,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MediaStore>) -> Result<Self> {
        let ttl = chrono::Duration::from_std(config.auth.session_ttl()?)?;
        let sessions = SessionStore::new(config.auth.session_secret.as_bytes(), ttl);

        let settings = UploadSettings {
            max_file_size: config.upload.max_file_size_bytes()?,
            concurrency: config.upload.concurrency,
            item_timeout: config.upload.item_timeout(),
        };
        let uploads = UploadOrchestrator::new(store.clone(), settings);

        Ok(Self {
            config,
            store,
            sessions,
            uploads,
            login_limiter: Arc::new(RateLimiter::default()),
        })
    }
}
