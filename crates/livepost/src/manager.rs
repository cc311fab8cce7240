//! # The Customizer Manager
//!
//! [`Customizer`] is the facade the host CMS drives for one preview/save
//! request. It owns everything request-scoped:
//!
//! - the staged client values, keyed by setting id (in submission order);
//! - the [`PreviewSession`] and the preview-transparent store view;
//! - the acting [`Principal`] and capability evaluation;
//! - the optional posts component (field registry + theme page templates);
//! - the save coordinator and its event dispatcher.
//!
//! Settings are resolved lazily: nothing is pre-enumerated, a setting object
//! is built on demand when a staged id is previewed or saved. The manager is
//! generic over [`PostStore`], so the whole protocol runs against the
//! in-memory store in tests and against the real CMS store in production.

use std::cell::RefCell;

use serde_json::Value;

use crate::config::LivepostConfig;
use crate::error::Result;
use crate::events::{Event, EventDispatcher};
use crate::fields::{FieldDefinition, FieldRegistry, SanitizeContext};
use crate::ident::SettingId;
use crate::model::Principal;
use crate::preview::PreviewSession;
use crate::settings::post::PostSetting;
use crate::settings::postmeta::PostmetaSetting;
use crate::settings::SettingArgs;
use crate::store::previewed::PreviewedStore;
use crate::store::{Action, PostStore};

/// The posts component: field registry plus the theme's page templates.
///
/// Its presence is what makes post settings constructible at all — the
/// original system can run with the component disabled, and settings must
/// fail distinguishably in that case.
#[derive(Debug)]
pub struct PostsComponent {
    registry: FieldRegistry,
    page_templates: Vec<String>,
}

impl PostsComponent {
    pub fn new(registry: FieldRegistry) -> Self {
        Self {
            registry,
            page_templates: Vec::new(),
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FieldRegistry {
        &mut self.registry
    }

    pub fn page_templates(&self) -> &[String] {
        &self.page_templates
    }
}

/// A lazily-resolved setting of either kind.
#[derive(Debug)]
pub enum SettingKind {
    Postmeta(PostmetaSetting),
    Post(PostSetting),
}

impl SettingKind {
    pub fn id(&self) -> &SettingId {
        match self {
            SettingKind::Postmeta(s) => s.id(),
            SettingKind::Post(s) => s.id(),
        }
    }

    pub fn value<S: PostStore>(&self, manager: &Customizer<S>) -> Value {
        match self {
            SettingKind::Postmeta(s) => s.value(manager),
            SettingKind::Post(s) => s.value(manager),
        }
    }

    pub fn preview<S: PostStore>(&self, manager: &Customizer<S>) -> bool {
        match self {
            SettingKind::Postmeta(s) => s.preview(manager),
            SettingKind::Post(s) => s.preview(manager),
        }
    }

    pub fn save<S: PostStore>(&self, manager: &Customizer<S>) -> Result<bool> {
        match self {
            SettingKind::Postmeta(s) => s.save(manager),
            SettingKind::Post(s) => s.save(manager),
        }
    }
}

pub struct Customizer<S: PostStore> {
    store: S,
    config: LivepostConfig,
    principal: Principal,
    posts: Option<PostsComponent>,
    staged: RefCell<Vec<(SettingId, Value)>>,
    session: PreviewSession,
    events: EventDispatcher,
}

impl<S: PostStore> Customizer<S> {
    /// A manager with the posts component installed and the built-in field
    /// definitions seeded for every previewable post type.
    pub fn new(store: S, config: LivepostConfig, principal: Principal) -> Self {
        let registry = FieldRegistry::with_builtins(&config.previewable_post_types());
        Self {
            store,
            config,
            principal,
            posts: Some(PostsComponent::new(registry)),
            staged: RefCell::new(Vec::new()),
            session: PreviewSession::new(),
            events: EventDispatcher::new(),
        }
    }

    /// Drop the posts component, for exercising the construction failure.
    pub fn without_posts_component(mut self) -> Self {
        self.posts = None;
        self
    }

    /// Declare the templates the current theme offers.
    pub fn with_page_templates(mut self, templates: Vec<String>) -> Self {
        if let Some(posts) = self.posts.as_mut() {
            posts.page_templates = templates;
        }
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LivepostConfig {
        &self.config
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = principal;
    }

    pub fn posts_component(&self) -> Option<&PostsComponent> {
        self.posts.as_ref()
    }

    pub fn posts_component_mut(&mut self) -> Option<&mut PostsComponent> {
        self.posts.as_mut()
    }

    /// Register a field definition on the posts component, if present.
    pub fn register_field(
        &mut self,
        post_type: impl Into<String>,
        field_key: impl Into<String>,
        definition: FieldDefinition,
    ) {
        if let Some(posts) = self.posts.as_mut() {
            posts.registry.register(post_type, field_key, definition);
        }
    }

    pub fn is_previewable(&self, post_type: &str) -> bool {
        self.config.is_previewable(post_type)
    }

    pub fn session(&self) -> &PreviewSession {
        &self.session
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// The preview-transparent read path for rendering collaborators.
    pub fn store_view(&self) -> PreviewedStore<'_, S> {
        PreviewedStore::new(&self.store, &self.session)
    }

    pub(crate) fn sanitize_context<'a>(
        &'a self,
        post_type: &'a str,
        post_id: u64,
        field_key: &'a str,
    ) -> SanitizeContext<'a> {
        SanitizeContext {
            post_type,
            post_id,
            field_key,
            page_templates: self
                .posts
                .as_ref()
                .map(|p| p.page_templates.as_slice())
                .unwrap_or(&[]),
            date_format: &self.config.date_format,
        }
    }

    /// Attach a client-submitted value for `raw_id`. Re-staging the same id
    /// replaces the earlier value; submission order is preserved otherwise.
    pub fn set_staged_value(&self, raw_id: &str, value: Value) -> Result<()> {
        let id: SettingId = raw_id.parse()?;
        let mut staged = self.staged.borrow_mut();
        match staged.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, existing_value)) => *existing_value = value,
            None => staged.push((id, value)),
        }
        Ok(())
    }

    pub fn staged_value(&self, id: &SettingId) -> Option<Value> {
        self.staged
            .borrow()
            .iter()
            .find(|(staged_id, _)| staged_id == id)
            .map(|(_, value)| value.clone())
    }

    pub fn staged_ids(&self) -> Vec<SettingId> {
        self.staged.borrow().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Resolve a setting on demand, dispatching on the identifier kind.
    pub fn setting(&self, raw_id: &str, args: SettingArgs) -> Result<SettingKind> {
        let id: SettingId = raw_id.parse()?;
        match id {
            SettingId::Postmeta { .. } => {
                PostmetaSetting::new(self, raw_id, args).map(SettingKind::Postmeta)
            }
            SettingId::Post { .. } => PostSetting::new(self, raw_id, args).map(SettingKind::Post),
        }
    }

    /// Construct and preview every staged setting. Returns how many preview
    /// overrides are active afterwards; settings that fail to construct are
    /// skipped.
    pub fn preview_staged(&self) -> usize {
        let mut active = 0;
        for id in self.staged_ids() {
            match self.setting(&id.to_string(), SettingArgs::new()) {
                Ok(setting) => {
                    if setting.preview(self) {
                        active += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(setting_id = %id, %err, "skipping unpreviewable setting");
                }
            }
        }
        active
    }

    /// Commit every staged setting, field by field, in staged order.
    ///
    /// Each setting commits independently: one failure neither aborts nor
    /// rolls back the others. The caller decides what to do with partial
    /// success, using the machine-readable codes on sanitize errors.
    pub fn save_staged(&self) -> Vec<(SettingId, Result<bool>)> {
        let mut outcomes = Vec::new();
        for id in self.staged_ids() {
            let outcome = self
                .setting(&id.to_string(), SettingArgs::new())
                .and_then(|setting| setting.save(self));
            outcomes.push((id, outcome));
        }
        outcomes
    }

    /// Evaluate a capability string for the acting principal.
    ///
    /// Entity-specific meta capabilities (`edit_post_meta[<id>][<key>]`,
    /// `edit_post[<id>]`) map onto the store's permission check; anything
    /// else is looked up verbatim on the principal.
    pub fn user_can(&self, cap: &str) -> bool {
        if let Some((post_id, key)) = parse_meta_cap(cap) {
            return self
                .store
                .has_permission(&self.principal, Action::EditMeta, post_id, key);
        }
        if let Some(post_id) = parse_post_cap(cap) {
            return self
                .store
                .has_permission(&self.principal, Action::EditPost, post_id, "");
        }
        self.principal.can(cap)
    }

    pub(crate) fn emit(&self, event: Event) {
        self.events.emit(event);
    }

    /// Tear down everything request-scoped: staged values and preview
    /// overrides. Must run when the request completes so nothing leaks into
    /// the next one.
    pub fn end_request(&self) {
        self.staged.borrow_mut().clear();
        self.session.clear();
    }
}

/// Parse `edit_post_meta[<id>][<key>]`.
fn parse_meta_cap(cap: &str) -> Option<(u64, &str)> {
    let rest = cap.strip_prefix("edit_post_meta[")?;
    let (id_part, rest) = rest.split_once("][")?;
    let key = rest.strip_suffix(']')?;
    let post_id: u64 = id_part.parse().ok()?;
    if post_id == 0 || key.is_empty() {
        return None;
    }
    Some((post_id, key))
}

/// Parse `edit_post[<id>]`.
fn parse_post_cap(cap: &str) -> Option<u64> {
    let id_part = cap.strip_prefix("edit_post[")?.strip_suffix(']')?;
    let post_id: u64 = id_part.parse().ok()?;
    (post_id > 0).then_some(post_id)
}
