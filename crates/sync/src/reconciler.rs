//! Featured-list reconciliation.
//!
//! ### Flow
//!
//! 1. **Check**: load the local index and the remote slot map. A slot-set
//!    change or a cold cache goes straight to a rebuild; otherwise every
//!    pinned list is fetched and its content signature compared.
//! 2. **Serve**: when nothing changed, the local mirror is returned as is.
//! 3. **Rebuild**: all pinned lists are fetched concurrently, parsed, and
//!    handed to [`persist`](crate::persist::persist), inline or on a
//!    background task that keeps the user's guard until it finishes.
//!
//! When the remote cannot be reached and a mirror exists, it is served with
//! [`Origin::Stale`] instead of failing.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;

use crate::decision::{Decision, SlotCheck, decide};
use crate::fetch::{distinct_lists, fetch_lists};
use crate::guard::UserLocks;
use crate::persist::{PersistPlan, ThumbnailJob, persist};
use crate::retry::RetryPolicy;
use podium_client::{
    FeaturedRemote, HttpThumbnailSource, RestConfig, RestDocumentStore, ThumbnailConfig, ThumbnailSource,
};
use podium_core::cache::MAX_THUMBNAILS_PER_LIST;
use podium_core::model::parse_list_record;
use podium_core::{AppConfig, CacheIndex, Error, ListRecord, LocalStore, SlotMap, content_signature, featured_hash};

/// Where a [`Featured`] result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The local mirror matched the remote state.
    Cache,
    /// The mirror was rebuilt from the remote store.
    Remote,
    /// The remote store was unreachable; the last mirror was served.
    Stale,
}

/// A user's featured lists keyed by slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Featured {
    pub lists: BTreeMap<u8, ListRecord>,
    pub origin: Origin,
}

impl Featured {
    fn new(lists: BTreeMap<u8, ListRecord>, origin: Origin) -> Self {
        Self { lists, origin }
    }
}

/// Reconciler behaviour knobs.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Thumbnails cached per list (default: 3, capped at 3)
    pub thumbnails_per_list: usize,

    /// Persist rebuilds on a background task (default: true)
    pub background_persist: bool,

    /// Retry policy for [`Reconciler::load_featured`]
    pub retry: RetryPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { thumbnails_per_list: MAX_THUMBNAILS_PER_LIST, background_persist: true, retry: RetryPolicy::default() }
    }
}

impl From<&AppConfig> for ReconcileOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            thumbnails_per_list: config.thumbnails_per_list,
            background_persist: config.background_persist,
            retry: RetryPolicy::from(config),
        }
    }
}

/// Keeps each user's local featured mirror consistent with the remote store.
pub struct Reconciler {
    remote: FeaturedRemote,
    local: LocalStore,
    thumbnails: Arc<dyn ThumbnailSource>,
    options: ReconcileOptions,
    locks: UserLocks,
}

impl Reconciler {
    pub fn new(
        remote: FeaturedRemote, local: LocalStore, thumbnails: Arc<dyn ThumbnailSource>, options: ReconcileOptions,
    ) -> Self {
        Self { remote, local, thumbnails, options, locks: UserLocks::new() }
    }

    /// Build a reconciler backed by the REST document store and HTTP thumbnails.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let rest = RestConfig::from_app_config(config).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let store = RestDocumentStore::new(rest)?;
        let thumbnails = HttpThumbnailSource::new(ThumbnailConfig::from(config))?;

        tracing::info!(cache_dir = %config.cache_dir.display(), "featured reconciler configured");

        Ok(Self::new(
            FeaturedRemote::new(Arc::new(store)),
            LocalStore::new(config.cache_dir.clone()),
            Arc::new(thumbnails),
            ReconcileOptions::from(config),
        ))
    }

    pub fn remote(&self) -> &FeaturedRemote {
        &self.remote
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Return the user's featured lists, rebuilding the mirror only if the
    /// remote state differs from what the local index records.
    pub async fn refresh_if_changed(&self, user_id: &str) -> Result<Featured, Error> {
        self.local.user_dir(user_id)?;
        let guard = self.locks.acquire(user_id).await;

        let index = match self.local.load_index(user_id).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "featured index unreadable, treating as cold");
                None
            }
        };

        let slots = match self.remote.fetch_slot_map(user_id).await {
            Ok(slots) => slots,
            Err(e) if index.is_some() => {
                tracing::warn!(user_id, error = %e, "slot map unavailable, serving stale featured cache");
                return Ok(self.serve(user_id, Origin::Stale).await);
            }
            Err(e) => return Err(e),
        };

        let remote_hash = featured_hash(&slots);
        let checks = match &index {
            Some(index) if index.featured_hash == remote_hash => self.check_signatures(&slots).await,
            _ => Vec::new(),
        };

        match decide(index.as_ref(), &remote_hash, &checks) {
            Decision::ServeCache => {
                tracing::debug!(user_id, "featured cache up to date");
                Ok(self.serve(user_id, Origin::Cache).await)
            }
            Decision::Rebuild(reason) => {
                tracing::info!(user_id, ?reason, "rebuilding featured cache");
                match self.fetch_all(&slots).await {
                    Ok(fetched) => Ok(self.commit(guard, user_id, slots, fetched).await),
                    Err(e) if index.is_some() => {
                        tracing::warn!(user_id, error = %e, "rebuild failed, serving stale featured cache");
                        Ok(self.serve(user_id, Origin::Stale).await)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Unconditionally rebuild the user's mirror from the remote store.
    ///
    /// Remote failures are returned rather than masked with stale data.
    pub async fn rebuild_from_remote(&self, user_id: &str) -> Result<Featured, Error> {
        self.local.user_dir(user_id)?;
        let guard = self.locks.acquire(user_id).await;
        let slots = self.remote.fetch_slot_map(user_id).await?;
        let fetched = self.fetch_all(&slots).await?;
        Ok(self.commit(guard, user_id, slots, fetched).await)
    }

    /// Wait for any in-flight reconciliation or persistence for `user_id`.
    pub async fn flush(&self, user_id: &str) {
        let _guard = self.locks.acquire(user_id).await;
    }

    /// Read the local mirror without contacting the remote store.
    pub async fn cached_lists(&self, user_id: &str) -> BTreeMap<u8, ListRecord> {
        let _guard = self.locks.acquire(user_id).await;
        self.local.load_cached_lists(user_id).await
    }

    /// Slot numbers recorded by the last committed index, in order.
    pub async fn expected_slots(&self, user_id: &str) -> Vec<u8> {
        let _guard = self.locks.acquire(user_id).await;
        match self.local.load_index(user_id).await {
            Ok(Some(index)) => index.slots.keys().copied().collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "featured index unreadable");
                Vec::new()
            }
        }
    }

    /// Cached thumbnail for the item at 1-based `position` of `list_id`.
    pub async fn thumbnail(&self, user_id: &str, list_id: &str, position: usize) -> Option<Vec<u8>> {
        self.local.load_thumbnail(user_id, list_id, position).await
    }

    /// Drop the user's local mirror.
    pub async fn evict(&self, user_id: &str) -> Result<(), Error> {
        let _guard = self.locks.acquire(user_id).await;
        self.local.delete_all(user_id).await
    }

    async fn serve(&self, user_id: &str, origin: Origin) -> Featured {
        Featured::new(self.local.load_cached_lists(user_id).await, origin)
    }

    async fn check_signatures(&self, slots: &SlotMap) -> Vec<SlotCheck> {
        fetch_lists(&self.remote, distinct_lists(slots))
            .await
            .into_iter()
            .map(|(list_id, result)| match result {
                Ok(Some(raw)) => SlotCheck::Found { signature: content_signature(&raw), list_id },
                Ok(None) => SlotCheck::Missing { list_id },
                Err(e) => SlotCheck::Failed { list_id, error: e.to_string() },
            })
            .collect()
    }

    /// Fetch every pinned list. Fails only when lists were requested and
    /// none of the fetches succeeded.
    async fn fetch_all(&self, slots: &SlotMap) -> Result<BTreeMap<String, Option<Value>>, Error> {
        let results = fetch_lists(&self.remote, distinct_lists(slots)).await;

        let mut fetched = BTreeMap::new();
        let mut last_error = None;
        for (list_id, result) in results {
            match result {
                Ok(raw) => {
                    fetched.insert(list_id, raw);
                }
                Err(e) => {
                    tracing::warn!(list_id = %list_id, error = %e, "featured list fetch failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if fetched.is_empty() => Err(e),
            _ => Ok(fetched),
        }
    }

    /// Turn fetched documents into the served result and persist them.
    ///
    /// Lists that failed to fetch get no signature, so the next refresh
    /// retries them. Undecodable lists keep their signature but are not
    /// served until their content changes.
    async fn commit(
        &self, guard: OwnedMutexGuard<()>, user_id: &str, slots: SlotMap, fetched: BTreeMap<String, Option<Value>>,
    ) -> Featured {
        let per_list = self.options.thumbnails_per_list.min(MAX_THUMBNAILS_PER_LIST);
        let mut records = BTreeMap::new();
        let mut signatures = BTreeMap::new();
        let mut snapshots = Vec::new();
        let mut thumbnails = Vec::new();

        for (list_id, raw) in fetched {
            let Some(raw) = raw else {
                tracing::debug!(user_id, list_id = %list_id, "pinned list no longer exists");
                continue;
            };
            signatures.insert(list_id.clone(), content_signature(&raw));

            let record = match parse_list_record(&list_id, &raw) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(user_id, list_id = %list_id, error = %e, "skipping undecodable featured list");
                    continue;
                }
            };
            let bytes = match serde_json::to_vec(&raw) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(user_id, list_id = %list_id, error = %e, "failed to encode snapshot");
                    continue;
                }
            };

            thumbnails.extend(
                record
                    .top_items(per_list)
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| !item.image.is_empty())
                    .map(|(i, item)| ThumbnailJob {
                        list_id: list_id.clone(),
                        position: i + 1,
                        url: item.image.clone(),
                    }),
            );
            snapshots.push((list_id.clone(), bytes));
            records.insert(list_id, record);
        }

        let lists: BTreeMap<u8, ListRecord> = slots
            .iter()
            .filter_map(|(slot, list_id)| records.get(list_id).map(|record| (*slot, record.clone())))
            .collect();

        let plan = PersistPlan {
            user_id: user_id.to_string(),
            snapshots,
            thumbnails,
            index: CacheIndex::new(slots, signatures),
        };

        if self.options.background_persist {
            let local = self.local.clone();
            let source = self.thumbnails.clone();
            tokio::spawn(async move {
                let _guard = guard;
                persist(&local, source, plan).await;
            });
        } else {
            persist(&self.local, self.thumbnails.clone(), plan).await;
            drop(guard);
        }

        Featured::new(lists, Origin::Remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use podium_client::{DocumentStore, MemoryDocumentStore};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingThumbnails {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ThumbnailSource for CountingThumbnails {
        async fn fetch(&self, url: &str) -> Result<Bytes, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(format!("thumb:{url}")))
        }
    }

    struct Harness {
        reconciler: Reconciler,
        store: Arc<MemoryDocumentStore>,
        thumbnails: Arc<CountingThumbnails>,
        _dir: tempfile::TempDir,
    }

    fn list(name: &str, updated: &str, items: Value) -> Value {
        json!({"details": {"name": name, "updated": updated}, "items": items})
    }

    fn three_items(prefix: &str) -> Value {
        json!({
            "x": {"rank": 1, "name": "first", "image": format!("https://img/{prefix}1")},
            "y": {"rank": 2, "name": "second", "image": format!("https://img/{prefix}2")},
            "z": {"rank": 3, "name": "third", "image": format!("https://img/{prefix}3")}
        })
    }

    fn harness_with(root: Value, background_persist: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryDocumentStore::from_value(root));
        let thumbnails = Arc::new(CountingThumbnails::default());
        let options = ReconcileOptions {
            background_persist,
            retry: RetryPolicy { attempts: 2, delay: std::time::Duration::from_millis(1) },
            ..Default::default()
        };
        let reconciler = Reconciler::new(
            FeaturedRemote::new(store.clone()),
            LocalStore::new(dir.path()),
            thumbnails.clone(),
            options,
        );
        Harness { reconciler, store, thumbnails, _dir: dir }
    }

    fn harness(root: Value) -> Harness {
        harness_with(root, false)
    }

    fn two_list_root() -> Value {
        json!({
            "users": {"u1": {"featured-slots": {"1": "listA", "3": "listB"}}},
            "lists": {
                "listA": list("A", "20250101000000", three_items("a")),
                "listB": list("B", "20250102000000", json!({"q": {"rank": 1, "image": "https://img/b1"}}))
            }
        })
    }

    #[tokio::test]
    async fn test_cold_start_rebuilds_and_persists() {
        let h = harness(two_list_root());

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(featured.origin, Origin::Remote);
        assert_eq!(featured.lists.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(featured.lists[&1].name, "A");
        assert_eq!(featured.lists[&1].items.len(), 3);
        assert_eq!(featured.lists[&3].name, "B");

        let index = h.reconciler.local().load_index("u1").await.unwrap().unwrap();
        assert_eq!(index.slots.len(), 2);
        assert_eq!(index.signatures.len(), 2);
        assert_eq!(h.reconciler.cached_lists("u1").await, featured.lists);
        assert_eq!(h.thumbnails.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(
            h.reconciler.thumbnail("u1", "listA", 2).await.unwrap(),
            b"thumb:https://img/a2"
        );
    }

    #[tokio::test]
    async fn test_second_refresh_serves_cache() {
        let h = harness(two_list_root());
        let first = h.reconciler.refresh_if_changed("u1").await.unwrap();
        let thumbnails_after_first = h.thumbnails.fetches.load(Ordering::SeqCst);

        let second = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(second.origin, Origin::Cache);
        assert_eq!(second.lists, first.lists);
        assert_eq!(h.thumbnails.fetches.load(Ordering::SeqCst), thumbnails_after_first);
    }

    #[tokio::test]
    async fn test_refresh_reads_only_slot_map_and_pinned_lists() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();
        let before = h.store.reads();

        h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(h.store.reads() - before, 3);
    }

    #[tokio::test]
    async fn test_content_edit_triggers_rebuild() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store
            .write("lists/listB/items/q/image", json!("https://img/b1-new"))
            .await
            .unwrap();

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(featured.origin, Origin::Remote);
        assert_eq!(featured.lists[&3].items[0].image, "https://img/b1-new");
        assert_eq!(h.reconciler.cached_lists("u1").await[&3].items[0].image, "https://img/b1-new");
    }

    #[tokio::test]
    async fn test_edit_outside_signature_is_not_a_change() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store.write("lists/listA/items/x/name", json!("renamed")).await.unwrap();

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(featured.origin, Origin::Cache);
        assert_eq!(featured.lists[&1].items[0].name, "first");
    }

    #[tokio::test]
    async fn test_unpin_evicts_list_files() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();
        let snapshot_b = h.reconciler.local().snapshot_path("u1", "listB").unwrap();
        assert!(snapshot_b.exists());

        h.reconciler.remote().unpin_slot("u1", 3).await.unwrap();
        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(featured.origin, Origin::Remote);
        assert_eq!(featured.lists.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert!(!snapshot_b.exists());
        assert!(h.reconciler.thumbnail("u1", "listB", 1).await.is_none());
    }

    #[tokio::test]
    async fn test_pinning_a_slot_rebuilds_and_keeps_existing_lists() {
        let h = harness(two_list_root());
        let before = h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store
            .write("lists/listC", list("C", "20250103000000", json!({"c": {"rank": 1}})))
            .await
            .unwrap();
        h.reconciler.remote().pin_slot("u1", 5, "listC").await.unwrap();

        let after = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(after.origin, Origin::Remote);
        assert_eq!(after.lists.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(after.lists[&1], before.lists[&1]);
        assert_eq!(after.lists[&3], before.lists[&3]);
        assert_eq!(after.lists[&5].name, "C");
    }

    #[tokio::test]
    async fn test_image_swap_rebuilds_and_leaves_other_signatures() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();
        let old = h.reconciler.local().load_index("u1").await.unwrap().unwrap();

        h.store
            .write("lists/listA/items/y/image", json!("https://img/a2-swapped"))
            .await
            .unwrap();

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(featured.origin, Origin::Remote);
        assert_eq!(featured.lists[&1].items[1].image, "https://img/a2-swapped");

        let new = h.reconciler.local().load_index("u1").await.unwrap().unwrap();
        assert_ne!(new.signature("listA"), old.signature("listA"));
        assert_eq!(new.signature("listB"), old.signature("listB"));
        assert_eq!(
            h.reconciler.thumbnail("u1", "listA", 2).await.unwrap(),
            b"thumb:https://img/a2-swapped"
        );
    }

    #[tokio::test]
    async fn test_list_named_index_survives_round_trip() {
        let mut root = two_list_root();
        root["users"]["u1"]["featured-slots"] = json!({"1": "index", "2": "listB"});
        root["lists"]["index"] = list("Index", "20250104000000", three_items("i"));
        let h = harness(root);

        let rebuilt = h.reconciler.rebuild_from_remote("u1").await.unwrap();
        assert_eq!(rebuilt.lists.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(h.reconciler.cached_lists("u1").await, rebuilt.lists);

        let refreshed = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(refreshed.origin, Origin::Cache);
        assert_eq!(refreshed.lists, rebuilt.lists);
    }

    #[tokio::test]
    async fn test_dangling_slot_is_dropped_without_rebuild_loop() {
        let mut root = two_list_root();
        root["users"]["u1"]["featured-slots"]["5"] = json!("deleted");
        let h = harness(root);

        let first = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(first.lists.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(h.reconciler.expected_slots("u1").await, vec![1, 3, 5]);

        let second = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(second.origin, Origin::Cache);
        assert_eq!(second.lists.len(), 2);
    }

    #[tokio::test]
    async fn test_same_list_in_two_slots() {
        let mut root = two_list_root();
        root["users"]["u1"]["featured-slots"]["7"] = json!("listA");
        let h = harness(root);

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(featured.lists[&1], featured.lists[&7]);
        assert_eq!(h.reconciler.cached_lists("u1").await.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_slot_map_clears_cache() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store.remove("users/u1/featured-slots").await.unwrap();
        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(featured.origin, Origin::Remote);
        assert!(featured.lists.is_empty());
        assert!(h.reconciler.cached_lists("u1").await.is_empty());
        assert!(!h.reconciler.local().snapshot_path("u1", "listA").unwrap().exists());

        let again = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(again.origin, Origin::Cache);
    }

    #[tokio::test]
    async fn test_offline_serves_stale_cache() {
        let h = harness(two_list_root());
        let fresh = h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store.set_offline(true);
        let stale = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(stale.origin, Origin::Stale);
        assert_eq!(stale.lists, fresh.lists);
    }

    #[tokio::test]
    async fn test_offline_cold_start_is_error() {
        let h = harness(two_list_root());
        h.store.set_offline(true);
        assert!(matches!(h.reconciler.refresh_if_changed("u1").await, Err(Error::Unreachable(_))));
        assert!(h.reconciler.local().load_index("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_list_check_keeps_mirror_when_rebuild_fails() {
        let h = harness(two_list_root());
        let fresh = h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store.fail_path("lists").await;
        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();

        assert_eq!(featured.origin, Origin::Stale);
        assert_eq!(featured.lists, fresh.lists);
        assert_eq!(h.reconciler.cached_lists("u1").await, fresh.lists);
    }

    #[tokio::test]
    async fn test_partial_fetch_failure_is_retried_next_refresh() {
        let h = harness(two_list_root());
        h.store.fail_path("lists/listB").await;

        let partial = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(partial.origin, Origin::Remote);
        assert_eq!(partial.lists.keys().copied().collect::<Vec<_>>(), vec![1]);

        h.store.heal_path("lists/listB").await;
        let healed = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(healed.origin, Origin::Remote);
        assert_eq!(healed.lists.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_rebuild_from_remote_escalates_errors() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();

        h.store.set_offline(true);
        assert!(matches!(h.reconciler.rebuild_from_remote("u1").await, Err(Error::Unreachable(_))));
        assert_eq!(h.reconciler.cached_lists("u1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_rebuild_from_remote_always_rebuilds() {
        let h = harness(two_list_root());
        h.reconciler.refresh_if_changed("u1").await.unwrap();

        let featured = h.reconciler.rebuild_from_remote("u1").await.unwrap();
        assert_eq!(featured.origin, Origin::Remote);
        assert_eq!(featured.lists.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_schema_is_served() {
        let root = json!({
            "users": {"u1": {"featured-slots": [null, "old"]}},
            "lists": {"old": {
                "listName": "Legacy",
                "listType": "tier",
                "listUpdated": "20200101000000",
                "listItems": [{"id": "i1", "rank": "2", "imageURL": "https://img/o2"}, {"id": "i0", "rank": 1}]
            }}
        });
        let h = harness(root);

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        let record = &featured.lists[&1];
        assert_eq!(record.name, "Legacy");
        assert_eq!(record.items[0].id, "i0");
        assert_eq!(h.thumbnails.fetches.load(Ordering::SeqCst), 1);
        assert!(h.reconciler.thumbnail("u1", "old", 2).await.is_some());
    }

    #[tokio::test]
    async fn test_undecodable_list_is_skipped_without_rebuild_loop() {
        let mut root = two_list_root();
        root["lists"]["listB"] = json!({"unexpected": true});
        let h = harness(root);

        let first = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(first.lists.keys().copied().collect::<Vec<_>>(), vec![1]);

        let second = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(second.origin, Origin::Cache);
    }

    #[tokio::test]
    async fn test_background_persist_is_visible_after_flush() {
        let h = harness_with(two_list_root(), true);

        let featured = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(featured.origin, Origin::Remote);

        h.reconciler.flush("u1").await;
        assert_eq!(h.reconciler.cached_lists("u1").await, featured.lists);

        let second = h.reconciler.refresh_if_changed("u1").await.unwrap();
        assert_eq!(second.origin, Origin::Cache);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let mut root = two_list_root();
        root["users"]["u2"] = json!({"featured-slots": {"2": "listB"}});
        let h = harness(root);

        h.reconciler.refresh_if_changed("u1").await.unwrap();
        let u2 = h.reconciler.refresh_if_changed("u2").await.unwrap();
        assert_eq!(u2.lists.keys().copied().collect::<Vec<_>>(), vec![2]);

        h.reconciler.evict("u1").await.unwrap();
        assert!(h.reconciler.cached_lists("u1").await.is_empty());
        assert_eq!(h.reconciler.cached_lists("u2").await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_rebuild_once() {
        let h = harness(two_list_root());

        let (a, b) = tokio::join!(h.reconciler.refresh_if_changed("u1"), h.reconciler.refresh_if_changed("u1"));
        let mut origins = vec![a.unwrap().origin, b.unwrap().origin];
        origins.sort_by_key(|o| *o == Origin::Cache);

        assert_eq!(origins, vec![Origin::Remote, Origin::Cache]);
    }

    #[tokio::test]
    async fn test_invalid_user_id_is_rejected() {
        let h = harness(two_list_root());
        assert!(matches!(h.reconciler.refresh_if_changed("../u1").await, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config_requires_database_url() {
        assert!(matches!(Reconciler::from_config(&AppConfig::default()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cache_dir: dir.path().to_path_buf(),
            database_url: Some("https://db.example.com".into()),
            background_persist: false,
            thumbnails_per_list: 2,
            ..Default::default()
        };

        let reconciler = Reconciler::from_config(&config).unwrap();
        assert_eq!(reconciler.local().root(), dir.path());
        assert_eq!(reconciler.options().thumbnails_per_list, 2);
        assert!(!reconciler.options().background_persist);
    }
}
