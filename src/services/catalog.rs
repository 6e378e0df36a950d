use crate::models::AssetRecord;
use crate::store::{MediaStore, StoreResult};

/// Assets under `folder`, newest first, capped at `page_size`.
pub async fn list(
    store: &dyn MediaStore,
    folder: &str,
    page_size: usize,
) -> StoreResult<Vec<AssetRecord>> {
    let mut resources = store.search_folder(folder, page_size).await?;
    resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    resources.truncate(page_size);
    Ok(resources)
}
