//! Cached thumbnails for the top-ranked items of each featured list.
//!
//! A missing thumbnail is never an error: callers fall back to the item's
//! remote image URL.

use super::store::LocalStore;
use crate::Error;

/// How many leading items of a list may have a cached thumbnail.
pub const MAX_THUMBNAILS_PER_LIST: usize = 3;

impl LocalStore {
    /// Atomically write the thumbnail for the item at 1-based `position`.
    pub async fn write_thumbnail(
        &self, user_id: &str, list_id: &str, position: usize, bytes: &[u8],
    ) -> Result<(), Error> {
        check_position(position)?;
        let path = self.thumbnail_path(user_id, list_id, position)?;
        self.write(bytes, &path).await
    }

    /// Read the cached thumbnail for the item at 1-based `position`, if any.
    pub async fn load_thumbnail(&self, user_id: &str, list_id: &str, position: usize) -> Option<Vec<u8>> {
        check_position(position).ok()?;
        let path = self.thumbnail_path(user_id, list_id, position).ok()?;
        match self.read_optional(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(user_id, list_id, position, error = %e, "thumbnail unreadable");
                None
            }
        }
    }
}

fn check_position(position: usize) -> Result<(), Error> {
    if position == 0 || position > MAX_THUMBNAILS_PER_LIST {
        return Err(Error::InvalidInput(format!(
            "thumbnail position {position} outside 1..={MAX_THUMBNAILS_PER_LIST}"
        )));
    }
    Ok(())
}
