//! On-disk layout and primitive file operations.
//!
//! Every user owns one subdirectory under the cache root:
//!
//! ```text
//! <root>/<user_id>/index.json
//! <root>/<user_id>/lists/<list_id>.json
//! <root>/<user_id>/<list_id>_img<1..3>.jpg
//! ```
//!
//! Snapshots live in their own subdirectory so no list id can alias the
//! index file. Removing the subdirectory is a full eviction for that user.

use std::path::{Path, PathBuf};

use crate::Error;

/// File name of the per-user reconciliation index.
pub const INDEX_FILE: &str = "index.json";

/// Subdirectory holding per-list snapshots.
pub const LISTS_DIR: &str = "lists";

/// Handle on the local featured-list mirror.
///
/// Cheap to clone; holds only the root path.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-user cache directory.
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf, Error> {
        validate_component("user id", user_id)?;
        Ok(self.root.join(user_id))
    }

    pub fn index_path(&self, user_id: &str) -> Result<PathBuf, Error> {
        Ok(self.user_dir(user_id)?.join(INDEX_FILE))
    }

    pub fn snapshot_path(&self, user_id: &str, list_id: &str) -> Result<PathBuf, Error> {
        validate_component("list id", list_id)?;
        Ok(self.user_dir(user_id)?.join(LISTS_DIR).join(format!("{list_id}.json")))
    }

    /// Path of the thumbnail for the item at 1-based `position` in rank order.
    pub fn thumbnail_path(&self, user_id: &str, list_id: &str, position: usize) -> Result<PathBuf, Error> {
        validate_component("list id", list_id)?;
        Ok(self.user_dir(user_id)?.join(format!("{list_id}_img{position}.jpg")))
    }

    /// Write `bytes` to `path` so that readers only ever observe the old or the new content.
    ///
    /// Parent directories are created on demand. Data goes to a sibling temp
    /// file first and is renamed over the destination.
    pub async fn write(&self, bytes: &[u8], path: &Path) -> Result<(), Error> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no parent directory", path.display())))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::storage(parent, e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no file name", path.display())))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = parent.join(tmp_name);

        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::storage(&tmp_path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::storage(path, e));
        }
        Ok(())
    }

    /// Remove the whole per-user cache subtree. Succeeds if it is already gone.
    pub async fn delete_all(&self, user_id: &str) -> Result<(), Error> {
        let dir = self.user_dir(user_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(user_id, "evicted featured cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(&dir, e)),
        }
    }

    /// Read a file, mapping "does not exist" to `None`.
    pub(crate) async fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, Error> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(path, e)),
        }
    }
}

/// Reject ids that would escape or alias the cache layout when used as a path component.
fn validate_component(what: &str, value: &str) -> Result<(), Error> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0'])
        || value.ends_with(".tmp");
    if bad {
        return Err(Error::InvalidInput(format!("{what} {value:?} is not usable as a cache path")));
    }
    Ok(())
}
