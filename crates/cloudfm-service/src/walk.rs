//! Recursive blob-tree walks shared by the folder, recycle and bin services.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};

use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::BlobStore;

/// Every object key beneath `prefix`, placeholders included.
///
/// Sibling folders are walked concurrently.
pub(crate) fn collect_object_keys<'a>(
    store: &'a dyn BlobStore,
    prefix: &'a str,
) -> BoxFuture<'a, AppResult<Vec<String>>> {
    async move {
        let listing = store.list(prefix).await?;
        let mut keys = Vec::new();
        let mut folders = Vec::new();
        for entry in listing {
            let key = path::join(prefix, &entry.name);
            if entry.is_folder() {
                folders.push(key);
            } else {
                keys.push(key);
            }
        }
        let nested = join_all(folders.iter().map(|f| collect_object_keys(store, f))).await;
        for result in nested {
            keys.extend(result?);
        }
        Ok(keys)
    }
    .boxed()
}
