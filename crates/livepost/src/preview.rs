//! Request-scoped preview override state.
//!
//! A [`PreviewSession`] maps `(post_id, field)` to the staged values a
//! preview render should see instead of the persisted ones. It is scoped to
//! one request: the manager tears it down on `end_request`, and nothing in
//! it is ever persisted. Interior mutability is `RefCell` — one request,
//! one thread.
//!
//! The session itself is inert; [`crate::store::previewed::PreviewedStore`]
//! is the read-path interception that consults it.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

/// Which read path an override intercepts: a metadata key or a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OverrideField {
    Meta(String),
    Record(String),
}

#[derive(Debug, Default)]
pub struct PreviewSession {
    overrides: RefCell<HashMap<(u64, OverrideField), Vec<Value>>>,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an override for `(post_id, field)`.
    ///
    /// Idempotent per key: once installed, re-installing is a no-op and
    /// returns `false` (the first staged value for a key wins for the rest
    /// of the request).
    pub fn install(&self, post_id: u64, field: OverrideField, values: Vec<Value>) -> bool {
        let mut overrides = self.overrides.borrow_mut();
        if overrides.contains_key(&(post_id, field.clone())) {
            return false;
        }
        tracing::debug!(post_id, ?field, "installing preview override");
        overrides.insert((post_id, field), values);
        true
    }

    pub fn is_installed(&self, post_id: u64, field: &OverrideField) -> bool {
        self.overrides
            .borrow()
            .contains_key(&(post_id, field.clone()))
    }

    pub fn lookup(&self, post_id: u64, field: &OverrideField) -> Option<Vec<Value>> {
        self.overrides
            .borrow()
            .get(&(post_id, field.clone()))
            .cloned()
    }

    /// All record-field overrides for one post, for applying to a loaded record.
    pub fn record_overrides(&self, post_id: u64) -> Vec<(String, Value)> {
        self.overrides
            .borrow()
            .iter()
            .filter_map(|((id, field), values)| match field {
                OverrideField::Record(name) if *id == post_id => values
                    .first()
                    .map(|value| (name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.borrow().len()
    }

    /// Drop every override. Called at request end; must never leak across
    /// requests.
    pub fn clear(&self) {
        let mut overrides = self.overrides.borrow_mut();
        if !overrides.is_empty() {
            tracing::debug!(count = overrides.len(), "tearing down preview overrides");
        }
        overrides.clear();
    }
}
