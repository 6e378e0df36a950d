use crate::models::AssetKey;
use crate::store::MediaStore;

/// Whether an asset already occupies `key`.
///
/// Lookup failures other than "not found" also answer `false`: the upload
/// that follows runs with overwrite disabled, so the store still rejects a
/// write to an occupied key.
pub async fn exists(store: &dyn MediaStore, key: &AssetKey) -> bool {
    match store.resource(key).await {
        Ok(_) => true,
        Err(e) if e.is_not_found() => false,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Existence check failed, assuming absent");
            false
        }
    }
}
