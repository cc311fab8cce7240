use serde_json::Value;

use crate::error::Result;
use crate::model::{Post, Principal};
use crate::preview::{OverrideField, PreviewSession};
use crate::store::{Action, PostStore};

/// A `PostStore` view with the request's preview overrides applied to reads.
///
/// Any collaborator reading through this wrapper sees staged values exactly
/// as if they were committed; writes and permission checks pass straight
/// through to the underlying store. This is the explicit request-scoped
/// interception point — there is no ambient global state to leak.
pub struct PreviewedStore<'a, S: PostStore> {
    inner: &'a S,
    session: &'a PreviewSession,
}

impl<'a, S: PostStore> PreviewedStore<'a, S> {
    pub fn new(inner: &'a S, session: &'a PreviewSession) -> Self {
        Self { inner, session }
    }
}

impl<S: PostStore> PostStore for PreviewedStore<'_, S> {
    fn get_post(&self, id: u64) -> Option<Post> {
        let mut post = self.inner.get_post(id)?;
        for (field, value) in self.session.record_overrides(id) {
            // Overrides are sanitized before install; a shape mismatch here
            // means a stale override for a field the record no longer has.
            if post.set_field(&field, &value).is_none() {
                tracing::warn!(post_id = id, field = %field, "preview override did not apply");
            }
        }
        Some(post)
    }

    fn put_post(&self, post: &Post) -> Result<bool> {
        self.inner.put_post(post)
    }

    fn read_meta(&self, post_id: u64, key: &str) -> Vec<Value> {
        match self
            .session
            .lookup(post_id, &OverrideField::Meta(key.to_string()))
        {
            Some(values) => values,
            None => self.inner.read_meta(post_id, key),
        }
    }

    fn write_meta(&self, post_id: u64, key: &str, values: Vec<Value>) -> Result<bool> {
        self.inner.write_meta(post_id, key, values)
    }

    fn allows_meta_write(&self, post_id: u64, key: &str, value: &Value) -> bool {
        self.inner.allows_meta_write(post_id, key, value)
    }

    fn has_permission(
        &self,
        principal: &Principal,
        action: Action,
        post_id: u64,
        key: &str,
    ) -> bool {
        self.inner.has_permission(principal, action, post_id, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::InMemoryStore;
    use serde_json::json;

    #[test]
    fn meta_reads_reflect_overrides() {
        let store = InMemoryStore::new();
        store.add_meta(1, "food", json!("tacos"));
        let session = PreviewSession::new();
        let previewed = PreviewedStore::new(&store, &session);

        assert_eq!(previewed.read_meta(1, "food"), vec![json!("tacos")]);

        session.install(1, OverrideField::Meta("food".into()), vec![json!("soup")]);
        assert_eq!(previewed.read_meta(1, "food"), vec![json!("soup")]);

        // The underlying store is untouched.
        assert_eq!(store.read_meta(1, "food"), vec![json!("tacos")]);
    }

    #[test]
    fn record_reads_reflect_overrides() {
        let store = InMemoryStore::new();
        store.insert_post(Post::new(1, "post").with_title("Persisted"));
        let session = PreviewSession::new();
        let previewed = PreviewedStore::new(&store, &session);

        session.install(
            1,
            OverrideField::Record("post_title".into()),
            vec![json!("Staged")],
        );

        assert_eq!(previewed.get_post(1).unwrap().title, "Staged");
        assert_eq!(store.get_post(1).unwrap().title, "Persisted");
    }

    #[test]
    fn overrides_scope_to_their_post() {
        let store = InMemoryStore::new();
        store.add_meta(1, "food", json!("tacos"));
        store.add_meta(2, "food", json!("pasta"));
        let session = PreviewSession::new();
        let previewed = PreviewedStore::new(&store, &session);

        session.install(1, OverrideField::Meta("food".into()), vec![json!("soup")]);

        assert_eq!(previewed.read_meta(1, "food"), vec![json!("soup")]);
        assert_eq!(previewed.read_meta(2, "food"), vec![json!("pasta")]);
    }

    #[test]
    fn writes_pass_through() {
        let store = InMemoryStore::new();
        let session = PreviewSession::new();
        let previewed = PreviewedStore::new(&store, &session);

        previewed
            .write_meta(1, "food", vec![json!("committed")])
            .unwrap();
        assert_eq!(store.read_meta(1, "food"), vec![json!("committed")]);
    }
}
