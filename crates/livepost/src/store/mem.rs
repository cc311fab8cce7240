use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::error::{LivepostError, Result};
use crate::model::{Post, Principal};
use crate::store::{Action, PostStore};

/// Predicate deciding whether a metadata write may proceed at all.
pub type MetaWriteFilter = Box<dyn Fn(u64, &str, &Value) -> bool>;

/// In-memory content-record store.
///
/// Uses `RefCell` for interior mutability since the request model is
/// single-threaded; the `PostStore` trait keeps `&self` on every method.
/// Doubles as the test double: writes can be failed or vetoed on demand.
#[derive(Default)]
pub struct InMemoryStore {
    posts: RefCell<HashMap<u64, Post>>,
    meta: RefCell<HashMap<(u64, String), Vec<Value>>>,
    simulate_write_error: RefCell<bool>,
    meta_write_filter: RefCell<Option<MetaWriteFilter>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.borrow_mut().insert(post.id, post);
    }

    /// Append one value to `(post_id, key)`, like the CMS's `add_meta`.
    pub fn add_meta(&self, post_id: u64, key: &str, value: Value) {
        self.meta
            .borrow_mut()
            .entry((post_id, key.to_string()))
            .or_default()
            .push(value);
    }

    /// Make every subsequent write fail, for error-path testing.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Install (or clear) the storage-level write veto.
    pub fn set_meta_write_filter(&self, filter: Option<MetaWriteFilter>) {
        *self.meta_write_filter.borrow_mut() = filter;
    }
}

impl PostStore for InMemoryStore {
    fn get_post(&self, id: u64) -> Option<Post> {
        self.posts.borrow().get(&id).cloned()
    }

    fn put_post(&self, post: &Post) -> Result<bool> {
        if *self.simulate_write_error.borrow() {
            return Err(LivepostError::Store("simulated write error".to_string()));
        }
        let mut posts = self.posts.borrow_mut();
        match posts.get_mut(&post.id) {
            Some(existing) => {
                let changed = existing != post;
                *existing = post.clone();
                Ok(changed)
            }
            None => Err(LivepostError::Store(format!("no post with id {}", post.id))),
        }
    }

    fn read_meta(&self, post_id: u64, key: &str) -> Vec<Value> {
        self.meta
            .borrow()
            .get(&(post_id, key.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn write_meta(&self, post_id: u64, key: &str, values: Vec<Value>) -> Result<bool> {
        if *self.simulate_write_error.borrow() {
            return Err(LivepostError::Store("simulated write error".to_string()));
        }
        let mut meta = self.meta.borrow_mut();
        let entry = meta.entry((post_id, key.to_string())).or_default();

        // Diff the old and new sets: survivors keep their stored order and
        // identity, additions land at the end in submitted order.
        let retained: Vec<Value> = entry
            .iter()
            .filter(|old| values.contains(old))
            .cloned()
            .collect();
        let added: Vec<Value> = values
            .iter()
            .filter(|new| !entry.contains(new))
            .cloned()
            .collect();
        let next: Vec<Value> = retained.into_iter().chain(added).collect();

        let changed = *entry != next;
        *entry = next;
        Ok(changed)
    }

    fn allows_meta_write(&self, post_id: u64, key: &str, value: &Value) -> bool {
        match self.meta_write_filter.borrow().as_ref() {
            Some(filter) => filter(post_id, key, value),
            None => true,
        }
    }

    fn has_permission(
        &self,
        principal: &Principal,
        _action: Action,
        post_id: u64,
        _key: &str,
    ) -> bool {
        let Some(post) = self.get_post(post_id) else {
            return false;
        };
        if principal.can("edit_others_posts") {
            return true;
        }
        let edit_cap = if post.post_type == "page" {
            "edit_pages"
        } else {
            "edit_posts"
        };
        principal.can(edit_cap) && post.author == principal.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_meta_empty_when_absent() {
        let store = InMemoryStore::new();
        assert!(store.read_meta(1, "food").is_empty());
    }

    #[test]
    fn add_then_read_preserves_order() {
        let store = InMemoryStore::new();
        store.add_meta(1, "food", json!("tacos"));
        store.add_meta(1, "food", json!("soup"));
        assert_eq!(store.read_meta(1, "food"), vec![json!("tacos"), json!("soup")]);
    }

    #[test]
    fn write_meta_replaces_not_appends() {
        let store = InMemoryStore::new();
        for v in ["a", "b", "c"] {
            store.add_meta(1, "k", json!(v));
        }

        let changed = store
            .write_meta(1, "k", vec![json!("b"), json!("d")])
            .unwrap();
        assert!(changed);
        assert_eq!(store.read_meta(1, "k"), vec![json!("b"), json!("d")]);
    }

    #[test]
    fn write_meta_noop_returns_false() {
        let store = InMemoryStore::new();
        store.add_meta(1, "k", json!("a"));

        let changed = store.write_meta(1, "k", vec![json!("a")]).unwrap();
        assert!(!changed);

        let changed = store.write_meta(2, "missing", vec![]).unwrap();
        assert!(!changed);
    }

    #[test]
    fn write_meta_keeps_duplicate_survivors() {
        let store = InMemoryStore::new();
        store.add_meta(1, "k", json!("a"));
        store.add_meta(1, "k", json!("a"));

        // Both stored instances survive a write that still contains the value.
        let changed = store.write_meta(1, "k", vec![json!("a")]).unwrap();
        assert!(!changed);
        assert_eq!(store.read_meta(1, "k"), vec![json!("a"), json!("a")]);
    }

    #[test]
    fn simulated_write_error_surfaces() {
        let store = InMemoryStore::new();
        store.set_simulate_write_error(true);
        let err = store.write_meta(1, "k", vec![json!("a")]).unwrap_err();
        assert!(matches!(err, LivepostError::Store(_)));
    }

    #[test]
    fn veto_filter_blocks_writes() {
        let store = InMemoryStore::new();
        assert!(store.allows_meta_write(1, "k", &json!("x")));

        store.set_meta_write_filter(Some(Box::new(|_, key, _| key != "locked")));
        assert!(store.allows_meta_write(1, "open", &json!("x")));
        assert!(!store.allows_meta_write(1, "locked", &json!("x")));
    }

    #[test]
    fn put_post_requires_existing_record() {
        let store = InMemoryStore::new();
        let post = Post::new(5, "post");
        assert!(store.put_post(&post).is_err());

        store.insert_post(post.clone());
        assert!(!store.put_post(&post).unwrap());

        let renamed = post.with_title("Renamed");
        assert!(store.put_post(&renamed).unwrap());
        assert_eq!(store.get_post(5).unwrap().title, "Renamed");
    }

    #[test]
    fn permissions_follow_ownership() {
        let store = InMemoryStore::new();
        store.insert_post(Post::new(10, "post").with_author(2));

        let editor = Principal::editor(1);
        let owner = Principal::author(2);
        let other = Principal::author(3);
        let subscriber = Principal::subscriber(4);

        assert!(store.has_permission(&editor, Action::EditMeta, 10, "k"));
        assert!(store.has_permission(&owner, Action::EditMeta, 10, "k"));
        assert!(!store.has_permission(&other, Action::EditMeta, 10, "k"));
        assert!(!store.has_permission(&subscriber, Action::EditMeta, 10, "k"));
        assert!(!store.has_permission(&editor, Action::EditMeta, 99, "k"));
    }
}
