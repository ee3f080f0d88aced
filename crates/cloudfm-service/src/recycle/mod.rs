//! Recycle bin: backups of deleted files and the collapsed bin view.

pub mod resolver;
pub mod service;

pub use resolver::RecycleResolver;
pub use service::BinService;

use tracing::debug;

use cloudfm_core::result::AppResult;
use cloudfm_core::traits::BlobStore;

/// Copy one live object into the recycle bucket at the same key.
///
/// Zero-byte placeholders carry nothing worth keeping and are skipped;
/// returns whether a copy was written.
pub(crate) async fn back_up(
    files: &dyn BlobStore,
    recycle: &dyn BlobStore,
    key: &str,
) -> AppResult<bool> {
    if cloudfm_core::path::is_placeholder(key) {
        return Ok(false);
    }
    let data = files.download(key).await?;
    recycle.upload(key, data, true).await?;
    debug!(key, bucket = %recycle.bucket(), "Backed up object");
    Ok(true)
}
