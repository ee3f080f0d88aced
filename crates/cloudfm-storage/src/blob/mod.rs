//! Blob store backends.

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use std::collections::BTreeMap;

use cloudfm_core::traits::BlobListing;

/// Normalise a listing prefix to `""` or `"a/b/"`.
pub(crate) fn listing_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Collapse full keys under `prefix` into a single-level listing.
///
/// Keys with further segments become folder entries (no id); the rest are
/// objects. The result is sorted by name.
pub(crate) fn single_level<'a, I>(prefix: &str, objects: I) -> Vec<BlobListing>
where
    I: IntoIterator<Item = (&'a str, &'a str, u64)>,
{
    let mut entries: BTreeMap<String, BlobListing> = BTreeMap::new();
    for (key, id, size) in objects {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((folder, _)) if !folder.is_empty() => {
                entries
                    .entry(folder.to_string())
                    .or_insert_with(|| BlobListing {
                        name: folder.to_string(),
                        id: None,
                        size_bytes: 0,
                    });
            }
            Some(_) => {}
            None if rest.is_empty() => {}
            None => {
                entries.insert(
                    rest.to_string(),
                    BlobListing {
                        name: rest.to_string(),
                        id: Some(id.to_string()),
                        size_bytes: size,
                    },
                );
            }
        }
    }
    entries.into_values().collect()
}
