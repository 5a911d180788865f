//! Featured-list reconciliation for podium.
//!
//! This crate provides:
//! - [`Reconciler`], which keeps each user's local featured mirror in step
//!   with the remote document store
//! - The pure serve-or-rebuild [`decide`] function
//! - Ordered persistence of rebuilt mirrors
//! - Bounded retry for callers via [`Reconciler::load_featured`]

pub mod decision;
pub mod fetch;
pub mod guard;
pub mod persist;
pub mod reconciler;
pub mod retry;

pub use decision::{Decision, RebuildReason, SlotCheck, decide};
pub use guard::UserLocks;
pub use persist::{PersistPlan, PersistReport, ThumbnailJob, persist};
pub use reconciler::{Featured, Origin, ReconcileOptions, Reconciler};
pub use retry::RetryPolicy;
