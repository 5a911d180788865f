//! Concurrent list fetches.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tokio::task::JoinSet;

use podium_client::FeaturedRemote;
use podium_core::{Error, SlotMap};

/// Result of fetching one list document.
pub type ListFetch = Result<Option<Value>, Error>;

/// Distinct list ids referenced by `slots`, in id order.
pub fn distinct_lists(slots: &SlotMap) -> BTreeSet<String> {
    slots.values().cloned().collect()
}

/// Fetch every list in `list_ids` concurrently.
///
/// Each id is fetched once. A task that panics or is cancelled is reported
/// as an unreachable remote for its list.
pub async fn fetch_lists(remote: &FeaturedRemote, list_ids: BTreeSet<String>) -> BTreeMap<String, ListFetch> {
    let mut join_set = JoinSet::new();
    let mut pending = list_ids.clone();

    for list_id in list_ids {
        let remote = remote.clone();
        join_set.spawn(async move {
            let result = remote.fetch_list_record(&list_id).await;
            (list_id, result)
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((list_id, result)) => {
                pending.remove(&list_id);
                results.insert(list_id, result);
            }
            Err(e) => tracing::warn!(error = %e, "list fetch task failed"),
        }
    }

    for list_id in pending {
        results.insert(list_id, Err(Error::Unreachable("list fetch task aborted".into())));
    }

    results
}
