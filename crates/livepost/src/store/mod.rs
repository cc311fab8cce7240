//! Storage abstraction over the host CMS's content-record store.
//!
//! [`PostStore`] is the consumed collaborator interface: record reads,
//! metadata reads/writes, the storage-level write veto, and the permission
//! check. All methods take `&self`; implementations use interior mutability
//! (the request model is single-threaded, so a `RefCell` is enough — see
//! [`mem::InMemoryStore`]).
//!
//! [`previewed::PreviewedStore`] wraps any `PostStore` with the
//! request-scoped preview overrides; rendering collaborators read through
//! the wrapper and cannot tell staged values from committed ones.

pub mod mem;
pub mod previewed;

use serde_json::Value;

use crate::error::Result;
use crate::model::{Post, Principal};

/// What the principal is trying to do to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EditPost,
    EditMeta,
}

/// Abstract interface to the content-record store.
pub trait PostStore {
    /// Fetch a record by id. `None` if it does not exist.
    fn get_post(&self, id: u64) -> Option<Post>;

    /// Persist record-field changes. Returns `Ok(false)` when nothing
    /// actually changed. Errors when the record is unknown or the write is
    /// rejected.
    fn put_post(&self, post: &Post) -> Result<bool>;

    /// All stored values for `(post_id, key)`, in storage order.
    /// Empty when the key is absent.
    fn read_meta(&self, post_id: u64, key: &str) -> Vec<Value>;

    /// Replace the entire stored set for `(post_id, key)` with `values`.
    ///
    /// Full replace, not append: stored values missing from `values` are
    /// removed, new ones added, survivors keep their identity and order.
    /// Returns `Ok(false)` for a no-op (new set equals old set).
    fn write_meta(&self, post_id: u64, key: &str, values: Vec<Value>) -> Result<bool>;

    /// Storage-level veto consulted before any metadata write is attempted.
    /// Returning `false` short-circuits the whole write as not-allowed.
    fn allows_meta_write(&self, post_id: u64, key: &str, value: &Value) -> bool {
        let _ = (post_id, key, value);
        true
    }

    /// Whether `principal` may perform `action` on `(post_id, key)`.
    fn has_permission(&self, principal: &Principal, action: Action, post_id: u64, key: &str)
        -> bool;
}
