//! Postmeta settings: one metadata key on one record.

use std::fmt;

use serde_json::Value;

use crate::error::{LivepostError, Result, SanitizeError};
use crate::events::Event;
use crate::fields::{FieldDefinition, Sanitizer};
use crate::ident::SettingId;
use crate::manager::Customizer;
use crate::preview::OverrideField;
use crate::settings::SettingArgs;
use crate::store::PostStore;

/// A setting bound to `(post_id, meta_key)`.
///
/// Holds the resolved schema (capability, default, cardinality, sanitizer)
/// but never the record or the staged value — those live in the store and
/// the manager respectively.
pub struct PostmetaSetting {
    id: SettingId,
    post_id: u64,
    post_type: String,
    meta_key: String,
    capability: String,
    default: Value,
    single: bool,
    sanitize: Option<Sanitizer>,
}

impl PostmetaSetting {
    /// Resolve a postmeta setting from its raw identifier.
    ///
    /// Fails distinguishably at each step: illegal id, unrecognized post
    /// type, missing posts component. Unregistered meta keys do not fail —
    /// they get a permissive single-valued definition, since postmeta keys
    /// are free-form by design.
    pub fn new<S: PostStore>(
        manager: &Customizer<S>,
        raw_id: &str,
        args: SettingArgs,
    ) -> Result<Self> {
        let id: SettingId = raw_id.parse()?;
        let SettingId::Postmeta {
            post_type,
            post_id,
            meta_key,
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
            .lookup(&post_type, &meta_key)
            .cloned()
            .unwrap_or_else(FieldDefinition::free_form);

        let capability = match args.capability {
            Some(capability) => capability,
            None => match &def.auth {
                Some(rule) => rule(post_id, &meta_key),
                None => format!("edit_post_meta[{post_id}][{meta_key}]"),
            },
        };

        let single = args.single.unwrap_or(def.single);
        let mut default = args.default.clone().unwrap_or(def.default);
        if !single {
            // Multi-valued settings always default to the empty sequence;
            // a caller-supplied scalar default is discarded, not an error.
            if args.default.is_some() && !matches!(&default, Value::Array(a) if a.is_empty()) {
                tracing::warn!(
                    setting_id = %id,
                    "discarding supplied default for a multi-valued setting"
                );
            }
            default = Value::Array(Vec::new());
        }

        Ok(Self {
            id,
            post_id,
            post_type,
            meta_key,
            capability,
            default,
            single,
            sanitize: args.sanitize.or(def.sanitize),
        })
    }

    pub fn id(&self) -> &SettingId {
        &self.id
    }

    /// The identifier string, for serialization back to the client.
    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    pub fn post_id(&self) -> u64 {
        self.post_id
    }

    pub fn post_type(&self) -> &str {
        &self.post_type
    }

    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Sanitize a raw client value into its stored form.
    ///
    /// The storage veto is consulted first and short-circuits the whole
    /// write at most once; after that, multi-valued input must be a
    /// sequence, and the field sanitizer runs on each element independently.
    pub fn sanitize<S: PostStore>(
        &self,
        raw: &Value,
        manager: &Customizer<S>,
    ) -> std::result::Result<Value, SanitizeError> {
        if !manager
            .store()
            .allows_meta_write(self.post_id, &self.meta_key, raw)
        {
            return Err(SanitizeError::NotAllowed);
        }

        let ctx = manager.sanitize_context(&self.post_type, self.post_id, &self.meta_key);
        if self.single {
            match &self.sanitize {
                Some(sanitize) => sanitize(raw, &ctx),
                None => Ok(raw.clone()),
            }
        } else {
            let Value::Array(items) = raw else {
                return Err(SanitizeError::ExpectedSequence);
            };
            let mut sanitized = Vec::with_capacity(items.len());
            for item in items {
                sanitized.push(match &self.sanitize {
                    Some(sanitize) => sanitize(item, &ctx)?,
                    None => item.clone(),
                });
            }
            Ok(Value::Array(sanitized))
        }
    }

    /// The current value, through the preview-transparent read path.
    ///
    /// Single-valued settings return the first stored value (or the
    /// default); multi-valued settings return the full ordered sequence.
    pub fn value<S: PostStore>(&self, manager: &Customizer<S>) -> Value {
        let values = manager.store_view().read_meta(self.post_id, &self.meta_key);
        if self.single {
            values.into_iter().next().unwrap_or_else(|| self.default.clone())
        } else {
            Value::Array(values)
        }
    }

    /// Install the staged value as a preview override.
    ///
    /// Idempotent: returns `true` without side effects once installed.
    /// Returns `false` when no staged value exists for this setting, or when
    /// the staged value fails sanitization (the persisted value keeps
    /// rendering).
    pub fn preview<S: PostStore>(&self, manager: &Customizer<S>) -> bool {
        let field = OverrideField::Meta(self.meta_key.clone());
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
        manager
            .session()
            .install(self.post_id, field, self.to_stored(sanitized));
        true
    }

    /// Persist the staged value, replacing the entire stored set.
    ///
    /// Returns `Ok(false)` when there was nothing to write (no staged value,
    /// or the new set equals the old one). Emits one `PostmetaSaved` event
    /// per actual write.
    pub fn save<S: PostStore>(&self, manager: &Customizer<S>) -> Result<bool> {
        if !manager.user_can(&self.capability) {
            return Err(SanitizeError::NotAllowed.into());
        }
        let Some(staged) = manager.staged_value(&self.id) else {
            return Ok(false);
        };
        let sanitized = self.sanitize(&staged, manager)?;
        let changed = manager.store().write_meta(
            self.post_id,
            &self.meta_key,
            self.to_stored(sanitized),
        )?;
        if changed {
            manager.emit(Event::PostmetaSaved {
                setting_id: self.id.to_string(),
            });
        }
        Ok(changed)
    }

    /// Shape a sanitized value as the stored sequence.
    fn to_stored(&self, sanitized: Value) -> Vec<Value> {
        if self.single {
            vec![sanitized]
        } else {
            match sanitized {
                Value::Array(values) => values,
                other => vec![other],
            }
        }
    }
}

impl fmt::Debug for PostmetaSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostmetaSetting")
            .field("id", &self.id)
            .field("capability", &self.capability)
            .field("default", &self.default)
            .field("single", &self.single)
            .field("sanitize", &self.sanitize.as_ref().map(|_| "fn"))
            .finish()
    }
}
