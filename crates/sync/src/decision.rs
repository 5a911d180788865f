//! Serve-or-rebuild decision.
//!
//! Kept free of I/O so the reconciliation rules can be tested directly. The
//! reconciler gathers the inputs (local index, remote slot hash, per-list
//! signature checks) and acts on the returned [`Decision`].

use podium_core::CacheIndex;

/// Outcome of checking one featured list against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCheck {
    /// The list exists remotely with this content signature.
    Found { list_id: String, signature: String },
    /// The list no longer exists remotely.
    Missing { list_id: String },
    /// The list could not be fetched.
    Failed { list_id: String, error: String },
}

impl SlotCheck {
    pub fn list_id(&self) -> &str {
        match self {
            SlotCheck::Found { list_id, .. } | SlotCheck::Missing { list_id } | SlotCheck::Failed { list_id, .. } => {
                list_id
            }
        }
    }
}

/// Why the local mirror must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// No usable local index.
    ColdStart,
    /// The set of pinned lists differs from the one the index was built for.
    SlotSetChanged,
    /// A pinned list was edited or deleted remotely.
    ContentChanged { list_id: String },
    /// A pinned list could not be checked.
    CheckFailed { list_id: String },
}

/// What to do with the local mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    ServeCache,
    Rebuild(RebuildReason),
}

/// Decide whether the cached mirror still reflects the remote state.
///
/// `checks` is only consulted when the index exists and its featured hash
/// equals `remote_hash`. Checks are evaluated in list id order so the
/// reported reason does not depend on fetch completion order. A list that
/// is absent remotely and has no stored signature is unchanged.
pub fn decide(index: Option<&CacheIndex>, remote_hash: &str, checks: &[SlotCheck]) -> Decision {
    let Some(index) = index else {
        return Decision::Rebuild(RebuildReason::ColdStart);
    };
    if index.featured_hash != remote_hash {
        return Decision::Rebuild(RebuildReason::SlotSetChanged);
    }

    let mut ordered: Vec<&SlotCheck> = checks.iter().collect();
    ordered.sort_by(|a, b| a.list_id().cmp(b.list_id()));

    for check in ordered {
        match check {
            SlotCheck::Failed { list_id, .. } => {
                return Decision::Rebuild(RebuildReason::CheckFailed { list_id: list_id.clone() });
            }
            SlotCheck::Found { list_id, signature } => {
                if index.signature(list_id) != Some(signature.as_str()) {
                    return Decision::Rebuild(RebuildReason::ContentChanged { list_id: list_id.clone() });
                }
            }
            SlotCheck::Missing { list_id } => {
                if index.signature(list_id).is_some() {
                    return Decision::Rebuild(RebuildReason::ContentChanged { list_id: list_id.clone() });
                }
            }
        }
    }

    Decision::ServeCache
}
