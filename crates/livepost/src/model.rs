//! Core data types: the content record the collaborators trade in, and the
//! acting principal.
//!
//! [`Post`] is deliberately slim — it carries only the record fields the
//! setting surface can touch. The generic field access pair
//! ([`Post::field`] / [`Post::set_field`]) lets the preview layer apply
//! overrides and the post settings persist edits without enumerating fields
//! at every call site.

use std::collections::HashSet;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical storage format for post dates (local wall-clock time).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Publish,
    Private,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Publish => "publish",
            PostStatus::Private => "private",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(PostStatus::Draft),
            "pending" => Some(PostStatus::Pending),
            "publish" => Some(PostStatus::Publish),
            "private" => Some(PostStatus::Private),
            _ => None,
        }
    }
}

/// A content record. Settings hold only its id, never the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub post_type: String,
    pub title: String,
    pub status: PostStatus,
    pub date: NaiveDateTime,
    pub author: u64,
}

impl Post {
    pub fn new(id: u64, post_type: impl Into<String>) -> Self {
        Self {
            id,
            post_type: post_type.into(),
            title: String::new(),
            status: PostStatus::default(),
            date: Utc::now().naive_utc(),
            author: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: u64) -> Self {
        self.author = author;
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = date;
        self
    }

    /// Read a record field by its wire name.
    ///
    /// Returns `None` for unknown field names. Dates come back as canonical
    /// `Y-m-d H:i:s` strings, matching what the storage layer persists.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "post_title" => Some(Value::String(self.title.clone())),
            "post_status" => Some(Value::String(self.status.as_str().to_string())),
            "post_date" => Some(Value::String(self.date.format(DATETIME_FORMAT).to_string())),
            "post_author" => Some(Value::from(self.author)),
            _ => None,
        }
    }

    /// Write a record field by its wire name.
    ///
    /// Returns `None` if the field is unknown or the value has the wrong
    /// shape; `Some(changed)` otherwise. Date strings must already be in the
    /// canonical format (sanitizers normalize before values get here).
    pub fn set_field(&mut self, name: &str, value: &Value) -> Option<bool> {
        match name {
            "post_title" => {
                let title = value.as_str()?;
                let changed = self.title != title;
                self.title = title.to_string();
                Some(changed)
            }
            "post_status" => {
                let status = PostStatus::parse(value.as_str()?)?;
                let changed = self.status != status;
                self.status = status;
                Some(changed)
            }
            "post_date" => {
                let date = NaiveDateTime::parse_from_str(value.as_str()?, DATETIME_FORMAT).ok()?;
                let changed = self.date != date;
                self.date = date;
                Some(changed)
            }
            "post_author" => {
                let author = value.as_u64()?;
                let changed = self.author != author;
                self.author = author;
                Some(changed)
            }
            _ => None,
        }
    }
}

/// The acting user for the current request.
///
/// Holds a flat capability set. Entity-specific meta capabilities
/// (`edit_post_meta[42][email_address]`) are not stored here — the manager
/// maps those onto the store's permission check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub id: u64,
    caps: HashSet<String>,
}

impl Principal {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            caps: HashSet::new(),
        }
    }

    /// An editor: may edit any post or page.
    pub fn editor(id: u64) -> Self {
        Self::new(id)
            .granted("edit_posts")
            .granted("edit_pages")
            .granted("edit_others_posts")
    }

    /// An author: may edit only their own posts.
    pub fn author(id: u64) -> Self {
        Self::new(id).granted("edit_posts")
    }

    /// A subscriber: no editing capabilities at all.
    pub fn subscriber(id: u64) -> Self {
        Self::new(id)
    }

    pub fn granted(mut self, cap: impl Into<String>) -> Self {
        self.caps.insert(cap.into());
        self
    }

    pub fn can(&self, cap: &str) -> bool {
        self.caps.contains(cap)
    }
}
