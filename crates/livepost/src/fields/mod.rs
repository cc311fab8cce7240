//! Field definitions and the per-subtype registry.
//!
//! This module is the schema layer: what a field's default looks like,
//! whether it holds one value or a sequence, how raw client input is
//! sanitized, and which capability guards it. Definitions are plain data
//! (a struct carrying closures), looked up — never mutated — by settings.
//!
//! Resolution order is exact `(subtype, key)` first, then the subtype-wide
//! wildcard, else nothing. Registration is last-writer-wins so a theme or
//! plugin can override a built-in definition by registering on top of it.

pub mod sanitizers;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::SanitizeError;

/// Per-call context handed to sanitizers: which field is being sanitized and
/// the environment it validates against (theme templates, date format).
#[derive(Debug, Clone, Copy)]
pub struct SanitizeContext<'a> {
    pub post_type: &'a str,
    pub post_id: u64,
    pub field_key: &'a str,
    /// Templates offered by the current theme, for template fields.
    pub page_templates: &'a [String],
    /// strftime-style format accepted for client-submitted dates.
    pub date_format: &'a str,
}

/// Sanitizes one raw client value into its stored form.
pub type Sanitizer =
    Rc<dyn Fn(&Value, &SanitizeContext<'_>) -> Result<Value, SanitizeError>>;

/// Produces the capability string guarding writes to `(post_id, field_key)`.
pub type AuthRule = Rc<dyn Fn(u64, &str) -> String>;

/// The complete schema for a single field of a subtype.
#[derive(Clone)]
pub struct FieldDefinition {
    /// Value reported when nothing is stored. Coerced to an empty sequence
    /// for multi-valued fields at setting construction.
    pub default: Value,
    /// Single-valued (scalar) or multi-valued (ordered sequence).
    pub single: bool,
    pub sanitize: Option<Sanitizer>,
    pub auth: Option<AuthRule>,
}

impl FieldDefinition {
    /// A permissive single-valued definition with an empty-string default.
    /// This is what unregistered postmeta keys get synthesized as.
    pub fn free_form() -> Self {
        Self {
            default: Value::String(String::new()),
            single: true,
            sanitize: None,
            auth: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.single = false;
        self
    }

    pub fn with_sanitizer(
        mut self,
        sanitize: impl Fn(&Value, &SanitizeContext<'_>) -> Result<Value, SanitizeError> + 'static,
    ) -> Self {
        self.sanitize = Some(Rc::new(sanitize));
        self
    }

    pub fn with_auth(mut self, auth: impl Fn(u64, &str) -> String + 'static) -> Self {
        self.auth = Some(Rc::new(auth));
        self
    }
}

impl Default for FieldDefinition {
    fn default() -> Self {
        Self::free_form()
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("default", &self.default)
            .field("single", &self.single)
            .field("sanitize", &self.sanitize.as_ref().map(|_| "fn"))
            .field("auth", &self.auth.as_ref().map(|_| "fn"))
            .finish()
    }
}

/// Registry of field definitions, keyed by `(subtype, field_key)` with an
/// optional subtype-wide wildcard for free-form postmeta keys.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    entries: HashMap<(String, String), FieldDefinition>,
    wildcards: HashMap<String, FieldDefinition>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with the record fields every previewable
    /// subtype supports, plus the page-template meta key for pages.
    pub fn with_builtins(post_types: &[String]) -> Self {
        let mut registry = Self::new();
        for post_type in post_types {
            registry.register(
                post_type,
                "post_title",
                FieldDefinition::free_form().with_sanitizer(sanitizers::text),
            );
            registry.register(
                post_type,
                "post_date",
                FieldDefinition::free_form().with_sanitizer(sanitizers::post_date),
            );
            registry.register(
                post_type,
                "post_author",
                FieldDefinition::free_form()
                    .with_default(Value::from(0u64))
                    .with_sanitizer(sanitizers::positive_id),
            );
            if post_type == "page" {
                registry.register(
                    post_type,
                    "_wp_page_template",
                    FieldDefinition::free_form()
                        .with_default(Value::String("default".into()))
                        .with_sanitizer(sanitizers::page_template),
                );
            }
        }
        registry
    }

    /// Register a definition for an exact `(subtype, key)`.
    /// Registering the same key again replaces the earlier definition.
    pub fn register(
        &mut self,
        post_type: impl Into<String>,
        field_key: impl Into<String>,
        definition: FieldDefinition,
    ) {
        self.entries
            .insert((post_type.into(), field_key.into()), definition);
    }

    /// Register a subtype-wide fallback used when no exact entry matches.
    pub fn register_wildcard(&mut self, post_type: impl Into<String>, definition: FieldDefinition) {
        self.wildcards.insert(post_type.into(), definition);
    }

    /// Exact entry first, then the subtype wildcard.
    pub fn lookup(&self, post_type: &str, field_key: &str) -> Option<&FieldDefinition> {
        self.entries
            .get(&(post_type.to_string(), field_key.to_string()))
            .or_else(|| self.wildcards.get(post_type))
    }
}
