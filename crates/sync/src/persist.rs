//! Writing a rebuilt mirror to disk.
//!
//! Steps run in a fixed order: purge the user's directory, write snapshots,
//! write thumbnails, then commit the index. The index is the commit marker,
//! so an interrupted run leaves either no index or one whose snapshots all
//! exist.

use std::sync::Arc;

use tokio::task::JoinSet;

use podium_client::ThumbnailSource;
use podium_core::{CacheIndex, LocalStore};

/// Thumbnail to download for one item of a featured list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailJob {
    pub list_id: String,
    /// 1-based rank position within the list.
    pub position: usize,
    pub url: String,
}

/// Everything a rebuild needs to write for one user.
#[derive(Debug, Clone)]
pub struct PersistPlan {
    pub user_id: String,
    /// List id and raw document bytes.
    pub snapshots: Vec<(String, Vec<u8>)>,
    pub thumbnails: Vec<ThumbnailJob>,
    pub index: CacheIndex,
}

/// What a persistence run managed to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub snapshots_written: usize,
    pub thumbnails_written: usize,
    pub thumbnails_failed: usize,
    /// Whether the index was written.
    pub committed: bool,
}

/// Persist `plan` under `local`.
///
/// Thumbnail failures are logged and skipped. A failed purge or snapshot
/// write leaves the index unwritten, so the next refresh sees a cold cache
/// and rebuilds.
pub async fn persist(local: &LocalStore, thumbnails: Arc<dyn ThumbnailSource>, plan: PersistPlan) -> PersistReport {
    let user_id = plan.user_id.as_str();
    let mut report = PersistReport::default();

    if let Err(e) = local.delete_all(user_id).await {
        tracing::warn!(user_id, error = %e, "failed to purge featured cache, not committing");
        return report;
    }

    let mut complete = true;
    for (list_id, bytes) in &plan.snapshots {
        match local.write_snapshot(user_id, list_id, bytes).await {
            Ok(()) => report.snapshots_written += 1,
            Err(e) => {
                tracing::warn!(user_id, list_id = %list_id, error = %e, "failed to write snapshot");
                complete = false;
            }
        }
    }

    let mut join_set = JoinSet::new();
    for job in plan.thumbnails {
        let source = thumbnails.clone();
        join_set.spawn(async move {
            let result = source.fetch(&job.url).await;
            (job, result)
        });
    }
    while let Some(joined) = join_set.join_next().await {
        let (job, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "thumbnail task failed");
                report.thumbnails_failed += 1;
                continue;
            }
        };
        let written = match result {
            Ok(bytes) => local.write_thumbnail(user_id, &job.list_id, job.position, &bytes).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => report.thumbnails_written += 1,
            Err(e) => {
                let (list_id, position) = (job.list_id.as_str(), job.position);
                tracing::debug!(user_id, list_id, position, error = %e, "thumbnail skipped");
                report.thumbnails_failed += 1;
            }
        }
    }

    if !complete {
        tracing::warn!(user_id, "featured cache incomplete, index not written");
        return report;
    }

    match local.write_index(user_id, &plan.index).await {
        Ok(()) => report.committed = true,
        Err(e) => tracing::warn!(user_id, error = %e, "failed to write featured index"),
    }

    tracing::info!(
        user_id,
        snapshots = report.snapshots_written,
        thumbnails = report.thumbnails_written,
        thumbnails_failed = report.thumbnails_failed,
        committed = report.committed,
        "persisted featured cache"
    );

    report
}
