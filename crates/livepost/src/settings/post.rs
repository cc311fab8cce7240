//! Post settings: fields stored on the record itself (date, title, author).
//!
//! Same protocol as postmeta, different persistence target: value reads come
//! off the (previewed) record, saves write the record back through
//! `PostStore::put_post`. Record fields are always single-valued.

use std::fmt;

use serde_json::Value;

use crate::error::{LivepostError, Result, SanitizeError};
use crate::events::Event;
use crate::fields::{FieldDefinition, Sanitizer};
use crate::ident::{FieldPath, SettingId};
use crate::manager::Customizer;
use crate::preview::OverrideField;
use crate::settings::SettingArgs;
use crate::store::PostStore;

pub struct PostSetting {
    id: SettingId,
    post_id: u64,
    post_type: String,
    field: FieldPath,
    capability: String,
    default: Value,
    sanitize: Option<Sanitizer>,
}

impl PostSetting {
    /// Resolve a record-field setting from its raw identifier.
    ///
    /// Same construction steps and failure modes as the postmeta form; the
    /// field definition comes from the built-in record-field registrations
    /// unless a theme or plugin overrode them.
    pub fn new<S: PostStore>(
        manager: &Customizer<S>,
        raw_id: &str,
        args: SettingArgs,
    ) -> Result<Self> {
        let id: SettingId = raw_id.parse()?;
        let SettingId::Post {
            post_type,
            post_id,
            field,
        } = id.clone()
        else {
            return Err(LivepostError::IllegalSettingId(raw_id.to_string()));
        };

        if !manager.is_previewable(&post_type) {
            return Err(LivepostError::UnrecognizedPostType { post_type });
        }

        let posts = manager
            .posts_component()
            .ok_or(LivepostError::ComponentNotInstantiated)?;

        let def = posts
            .registry()
            .lookup(&post_type, &field.field)
            .cloned()
            .unwrap_or_else(FieldDefinition::free_form);

        if args.single == Some(false) {
            tracing::warn!(setting_id = %id, "record fields are single-valued; ignoring override");
        }

        let capability = match args.capability {
            Some(capability) => capability,
            None => match &def.auth {
                Some(rule) => rule(post_id, &field.field),
                None => format!("edit_post[{post_id}]"),
            },
        };

        Ok(Self {
            id,
            post_id,
            post_type,
            field,
            capability,
            default: args.default.unwrap_or(def.default),
            sanitize: args.sanitize.or(def.sanitize),
        })
    }

    pub fn id(&self) -> &SettingId {
        &self.id
    }

    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    pub fn post_id(&self) -> u64 {
        self.post_id
    }

    pub fn post_type(&self) -> &str {
        &self.post_type
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn sanitize<S: PostStore>(
        &self,
        raw: &Value,
        manager: &Customizer<S>,
    ) -> std::result::Result<Value, SanitizeError> {
        let ctx = manager.sanitize_context(&self.post_type, self.post_id, &self.field.field);
        match &self.sanitize {
            Some(sanitize) => sanitize(raw, &ctx),
            None => Ok(raw.clone()),
        }
    }

    /// The current field value, through the preview-transparent read path.
    ///
    /// Compound identifiers resolve the child property of an object-valued
    /// field; `id` on a scalar reference resolves to the reference itself.
    pub fn value<S: PostStore>(&self, manager: &Customizer<S>) -> Value {
        let Some(post) = manager.store_view().get_post(self.post_id) else {
            return self.default.clone();
        };
        let Some(base) = post.field(&self.field.field) else {
            return self.default.clone();
        };
        match &self.field.child {
            None => base,
            Some(child) => match &base {
                Value::Object(map) => map.get(child).cloned().unwrap_or(Value::Null),
                _ if child == "id" => base,
                _ => Value::Null,
            },
        }
    }

    /// Install the staged value as a record-field preview override.
    /// Same idempotence and no-staged-value semantics as the postmeta form.
    pub fn preview<S: PostStore>(&self, manager: &Customizer<S>) -> bool {
        let field = OverrideField::Record(self.field.field.clone());
        if manager.session().is_installed(self.post_id, &field) {
            return true;
        }
        let Some(staged) = manager.staged_value(&self.id) else {
            return false;
        };
        let sanitized = match self.sanitize(&staged, manager) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    setting_id = %self.id,
                    code = err.code(),
                    "staged value rejected; preview not installed"
                );
                return false;
            }
        };
        manager.session().install(self.post_id, field, vec![sanitized]);
        true
    }

    /// Persist the staged field back onto the record.
    pub fn save<S: PostStore>(&self, manager: &Customizer<S>) -> Result<bool> {
        if !manager.user_can(&self.capability) {
            return Err(SanitizeError::NotAllowed.into());
        }
        let Some(staged) = manager.staged_value(&self.id) else {
            return Ok(false);
        };
        let sanitized = self.sanitize(&staged, manager)?;

        if self.field.child.is_some() {
            // Compound bindings are a client-side convenience; persistence
            // happens through the base field's own setting.
            tracing::warn!(setting_id = %self.id, "compound settings do not persist directly");
            return Ok(false);
        }

        let mut post = manager
            .store()
            .get_post(self.post_id)
            .ok_or_else(|| LivepostError::Store(format!("no post with id {}", self.post_id)))?;
        let field_changed = post
            .set_field(&self.field.field, &sanitized)
            .ok_or_else(|| {
                LivepostError::Store(format!("field {} is not writable", self.field.field))
            })?;
        if !field_changed {
            return Ok(false);
        }

        let changed = manager.store().put_post(&post)?;
        if changed {
            manager.emit(Event::PostSaved {
                setting_id: self.id.to_string(),
            });
        }
        Ok(changed)
    }
}

impl fmt::Debug for PostSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostSetting")
            .field("id", &self.id)
            .field("capability", &self.capability)
            .field("default", &self.default)
            .field("sanitize", &self.sanitize.as_ref().map(|_| "fn"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LivepostConfig;
    use crate::model::{Post, Principal};
    use crate::store::mem::InMemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn manager() -> Customizer<InMemoryStore> {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2016, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        store.insert_post(
            Post::new(42, "post")
                .with_title("Hello World")
                .with_author(1)
                .with_date(date),
        );
        Customizer::new(store, LivepostConfig::default(), Principal::editor(1))
    }

    #[test]
    fn construct_rejects_postmeta_ids() {
        let mgr = manager();
        let err = PostSetting::new(&mgr, "postmeta[post][42][food]", SettingArgs::new())
            .unwrap_err();
        assert!(matches!(err, LivepostError::IllegalSettingId(_)));
    }

    #[test]
    fn construct_rejects_unrecognized_post_type() {
        let mgr = manager();
        let err =
            PostSetting::new(&mgr, "post[food][42][post_date]", SettingArgs::new()).unwrap_err();
        assert!(matches!(err, LivepostError::UnrecognizedPostType { .. }));
    }

    #[test]
    fn construct_synthesizes_edit_post_capability() {
        let mgr = manager();
        let setting = PostSetting::new(&mgr, "post[post][42][post_date]", SettingArgs::new())
            .unwrap();
        assert_eq!(setting.capability(), "edit_post[42]");
        assert!(mgr.user_can(setting.capability()));
    }

    #[test]
    fn value_reads_the_record_field() {
        let mgr = manager();
        let setting =
            PostSetting::new(&mgr, "post[post][42][post_date]", SettingArgs::new()).unwrap();
        assert_eq!(setting.value(&mgr), json!("2016-03-14 09:26:53"));

        let title =
            PostSetting::new(&mgr, "post[post][42][post_title]", SettingArgs::new()).unwrap();
        assert_eq!(title.value(&mgr), json!("Hello World"));
    }

    #[test]
    fn compound_child_resolves_reference_id() {
        let mgr = manager();
        let setting =
            PostSetting::new(&mgr, "post[post][42][post_author][id]", SettingArgs::new()).unwrap();
        assert_eq!(setting.value(&mgr), json!(1));

        let unknown = PostSetting::new(
            &mgr,
            "post[post][42][post_author][user_login]",
            SettingArgs::new(),
        )
        .unwrap();
        assert_eq!(unknown.value(&mgr), Value::Null);
    }

    #[test]
    fn sanitize_rejects_malformed_dates() {
        let mgr = manager();
        let setting =
            PostSetting::new(&mgr, "post[post][42][post_date]", SettingArgs::new()).unwrap();
        let err = setting.sanitize(&json!("soon"), &mgr).unwrap_err();
        assert_eq!(err.code(), "invalid_date");
    }

    #[test]
    fn preview_overrides_record_reads() {
        let mgr = manager();
        mgr.set_staged_value("post[post][42][post_date]", json!("2020-01-01 00:00:00"))
            .unwrap();

        let setting =
            PostSetting::new(&mgr, "post[post][42][post_date]", SettingArgs::new()).unwrap();
        assert_eq!(setting.value(&mgr), json!("2016-03-14 09:26:53"));

        assert!(setting.preview(&mgr));
        assert_eq!(setting.value(&mgr), json!("2020-01-01 00:00:00"));

        // Transparent through the previewed store, persisted record intact.
        assert_eq!(
            mgr.store_view().get_post(42).unwrap().field("post_date"),
            Some(json!("2020-01-01 00:00:00"))
        );
        assert_eq!(
            mgr.store().get_post(42).unwrap().field("post_date"),
            Some(json!("2016-03-14 09:26:53"))
        );
        assert!(setting.preview(&mgr));
    }

    #[test]
    fn preview_rejects_invalid_staged_date() {
        let mgr = manager();
        mgr.set_staged_value("post[post][42][post_date]", json!("soon")).unwrap();

        let setting =
            PostSetting::new(&mgr, "post[post][42][post_date]", SettingArgs::new()).unwrap();
        assert!(!setting.preview(&mgr));
        assert_eq!(setting.value(&mgr), json!("2016-03-14 09:26:53"));
    }

    #[test]
    fn save_writes_the_record_and_emits() {
        let mgr = manager();
        mgr.set_staged_value("post[post][42][post_title]", json!("Renamed"))
            .unwrap();

        let setting =
            PostSetting::new(&mgr, "post[post][42][post_title]", SettingArgs::new()).unwrap();
        assert!(setting.save(&mgr).unwrap());

        assert_eq!(mgr.store().get_post(42).unwrap().title, "Renamed");
        assert_eq!(
            mgr.events().count(|e| matches!(e, Event::PostSaved { .. })),
            1
        );
    }

    #[test]
    fn save_same_value_is_a_noop() {
        let mgr = manager();
        mgr.set_staged_value("post[post][42][post_title]", json!("Hello World"))
            .unwrap();

        let setting =
            PostSetting::new(&mgr, "post[post][42][post_title]", SettingArgs::new()).unwrap();
        assert!(!setting.save(&mgr).unwrap());
        assert!(mgr.events().log().is_empty());
    }

    #[test]
    fn save_requires_edit_post_permission() {
        let mut mgr = manager();
        mgr.set_staged_value("post[post][42][post_title]", json!("Renamed"))
            .unwrap();
        mgr.set_principal(Principal::subscriber(9));

        let setting =
            PostSetting::new(&mgr, "post[post][42][post_title]", SettingArgs::new()).unwrap();
        let err = setting.save(&mgr).unwrap_err();
        match err {
            LivepostError::Sanitize(inner) => assert_eq!(inner.code(), "not_allowed"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mgr.store().get_post(42).unwrap().title, "Hello World");
    }

    #[test]
    fn compound_settings_do_not_persist_directly() {
        let mgr = manager();
        mgr.set_staged_value("post[post][42][post_author][id]", json!(7))
            .unwrap();

        let setting = PostSetting::new(
            &mgr,
            "post[post][42][post_author][id]",
            SettingArgs::new(),
        )
        .unwrap();
        assert!(!setting.save(&mgr).unwrap());
        assert_eq!(mgr.store().get_post(42).unwrap().author, 1);
    }
}
