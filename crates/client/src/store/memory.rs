//! In-process document store.
//!
//! Keeps the whole tree in a single JSON value. Useful for embedding
//! without a backend and for tests, which can take it offline or make
//! individual paths fail to exercise the reconciler's fallbacks.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, segments};

/// Document store backed by an in-memory JSON tree.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    root: RwLock<Value>,
    offline: AtomicBool,
    failing: RwLock<HashSet<String>>,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `root` as its whole tree.
    pub fn from_value(root: Value) -> Self {
        Self { root: RwLock::new(root), ..Default::default() }
    }

    /// Make every operation fail with [`StoreError::Offline`] until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make operations on `path` (and anything below it) fail.
    pub async fn fail_path(&self, path: &str) {
        self.failing.write().await.insert(normalize(path));
    }

    /// Undo [`fail_path`](Self::fail_path).
    pub async fn heal_path(&self, path: &str) {
        self.failing.write().await.remove(&normalize(path));
    }

    /// Number of `read` calls served or refused so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    async fn check(&self, path: &str) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        let path = normalize(path);
        let failing = self.failing.read().await;
        let blocked = failing
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")));
        if blocked {
            return Err(StoreError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check(path).await?;
        let segs = segments(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &segs).filter(|v| !v.is_null()).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.check(path).await?;
        let segs = segments(path)?;
        let mut root = self.root.write().await;
        if value.is_null() {
            remove_at(&mut root, &segs);
        } else {
            *entry_mut(&mut root, &segs)? = value;
        }
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.check(path).await?;
        let segs = segments(path)?;
        let mut root = self.root.write().await;
        let target = ensure_object(entry_mut(&mut root, &segs)?)?;
        for (key, value) in fields {
            if value.is_null() {
                target.remove(&key);
            } else {
                target.insert(key, value);
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.check(path).await?;
        let segs = segments(path)?;
        let mut root = self.root.write().await;
        remove_at(&mut root, &segs);
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/")
}

fn lookup<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    segs.iter().try_fold(root, |cur, seg| match cur {
        Value::Object(map) => map.get(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Turn `value` into an object in place. Arrays keep their non-null entries keyed by index.
fn ensure_object(value: &mut Value) -> Result<&mut Map<String, Value>, StoreError> {
    let map = match value.take() {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    *value = Value::Object(map);
    value
        .as_object_mut()
        .ok_or_else(|| StoreError::Parse("node did not convert to an object".into()))
}

fn entry_mut<'a>(root: &'a mut Value, segs: &[&str]) -> Result<&'a mut Value, StoreError> {
    let mut cur = root;
    for seg in segs {
        cur = ensure_object(cur)?.entry(seg.to_string()).or_insert(Value::Null);
    }
    Ok(cur)
}

fn remove_at(root: &mut Value, segs: &[&str]) {
    let Some((last, parents)) = segs.split_last() else {
        return;
    };
    let mut cur = root;
    for seg in parents {
        cur = match cur {
            Value::Object(map) => match map.get_mut(*seg) {
                Some(next) => next,
                None => return,
            },
            Value::Array(items) => match seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(next) => next,
                None => return,
            },
            _ => return,
        };
    }
    match cur {
        Value::Object(map) => {
            map.remove(*last);
        }
        Value::Array(items) => {
            if let Some(slot) = last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}
