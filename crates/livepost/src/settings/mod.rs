//! The value-holding settings bound to one field of one content record.
//!
//! Two kinds exist, one per identifier form:
//! - [`postmeta::PostmetaSetting`] for `postmeta[type][id][key]` — metadata
//!   values, single or multi-valued;
//! - [`post::PostSetting`] for `post[type][id][field]` — fields stored on
//!   the record itself (date, title, author).
//!
//! Settings are plain values; every operation takes the manager by
//! reference. They hold the record's id, never the record.

pub mod post;
pub mod postmeta;

use std::fmt;

use serde_json::Value;

use crate::fields::{SanitizeContext, Sanitizer};

/// Caller-supplied overrides applied during setting construction.
///
/// Everything is optional; unset fields fall back to the field definition
/// resolved from the registry.
#[derive(Clone, Default)]
pub struct SettingArgs {
    /// Replaces the synthesized capability verbatim.
    pub capability: Option<String>,
    /// Overrides the field's cardinality.
    pub single: Option<bool>,
    /// Overrides the field's default. Discarded (with a warning) for
    /// multi-valued settings, whose default is always the empty sequence.
    pub default: Option<Value>,
    /// Replaces the field's sanitizer.
    pub sanitize: Option<Sanitizer>,
}

impl SettingArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_single(mut self, single: bool) -> Self {
        self.single = Some(single);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_sanitizer(
        mut self,
        sanitize: impl Fn(&Value, &SanitizeContext<'_>) -> Result<Value, crate::error::SanitizeError>
            + 'static,
    ) -> Self {
        self.sanitize = Some(std::rc::Rc::new(sanitize));
        self
    }
}

impl fmt::Debug for SettingArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingArgs")
            .field("capability", &self.capability)
            .field("single", &self.single)
            .field("default", &self.default)
            .field("sanitize", &self.sanitize.as_ref().map(|_| "fn"))
            .finish()
    }
}
