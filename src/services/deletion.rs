use crate::models::{AssetKey, DeleteOutcome, ResourceType};
use crate::store::{MediaStore, StoreResult};

/// Remove the asset at `key`. Whether a missing key counts as success is up
/// to the store; both backends report it as `DeleteOutcome::NotFound`.
pub async fn delete(
    store: &dyn MediaStore,
    key: &AssetKey,
    resource_type: ResourceType,
) -> StoreResult<DeleteOutcome> {
    let outcome = store.destroy(key, resource_type).await?;
    match outcome {
        DeleteOutcome::Deleted => tracing::info!(key = %key, %resource_type, "Asset deleted"),
        DeleteOutcome::NotFound => {
            tracing::info!(key = %key, %resource_type, "Delete requested for missing asset")
        }
    }
    Ok(outcome)
}
