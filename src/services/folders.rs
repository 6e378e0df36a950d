use crate::store::{MediaStore, StoreResult};

/// Root folders followed by their direct subfolders as `root/sub`.
pub async fn list_folders(store: &dyn MediaStore) -> StoreResult<Vec<String>> {
    let roots = store.root_folders().await?;
    let mut folders: Vec<String> = roots.iter().map(|f| f.name.clone()).collect();

    for root in &roots {
        match store.sub_folders(&root.path).await {
            Ok(subs) => {
                folders.extend(subs.into_iter().map(|sub| format!("{}/{}", root.name, sub.name)))
            }
            Err(e) => tracing::warn!(folder = %root.name, error = %e, "No subfolders"),
        }
    }

    Ok(folders)
}
