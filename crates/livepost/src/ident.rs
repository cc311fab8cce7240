//! # Setting Identifiers
//!
//! Every setting is addressed by a single string mixing entity kind, subtype,
//! record id and field key:
//!
//! ```text
//! postmeta[<subtype>][<id>][<meta_key>]        e.g. postmeta[page][123][food]
//! post[<subtype>][<id>][<field>]               e.g. post[post][42][post_date]
//! post[<subtype>][<id>][<field>][<child>]      e.g. post[post][42][post_author][user_login]
//! ```
//!
//! This is a wire format: the client round-trips these ids verbatim, so
//! [`SettingId`] guarantees `parse(format(id)) == id` for every valid id.
//! Parsing is an exhaustive tagged-variant decode — anything that does not
//! match the grammar exactly fails with [`LivepostError::IllegalSettingId`],
//! never a silent default.

use std::fmt;
use std::str::FromStr;

use crate::error::LivepostError;

/// A record field reference, optionally addressing a child property of a
/// compound field (the four-segment `post[..][..][post_author][..]` form).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub field: String,
    pub child: Option<String>,
}

impl FieldPath {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            child: None,
        }
    }

    pub fn with_child(field: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            child: Some(child.into()),
        }
    }
}

/// A parsed setting identifier.
///
/// Construct only by parsing (`raw.parse::<SettingId>()?`); the parser is the
/// sole place the grammar is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingId {
    /// A metadata value attached to a record: `postmeta[type][id][key]`.
    Postmeta {
        post_type: String,
        post_id: u64,
        meta_key: String,
    },
    /// A field stored on the record itself: `post[type][id][field]`.
    Post {
        post_type: String,
        post_id: u64,
        field: FieldPath,
    },
}

impl SettingId {
    pub fn post_type(&self) -> &str {
        match self {
            SettingId::Postmeta { post_type, .. } | SettingId::Post { post_type, .. } => post_type,
        }
    }

    pub fn post_id(&self) -> u64 {
        match self {
            SettingId::Postmeta { post_id, .. } | SettingId::Post { post_id, .. } => *post_id,
        }
    }

    /// The field key this setting addresses: the meta key, or the record
    /// field name (child properties share their base field's key).
    pub fn field_key(&self) -> &str {
        match self {
            SettingId::Postmeta { meta_key, .. } => meta_key,
            SettingId::Post { field, .. } => &field.field,
        }
    }

    /// Convenience constructor for the common postmeta form, used when a
    /// server-side collaborator needs to address a known key.
    pub fn postmeta(post_type: impl Into<String>, post_id: u64, meta_key: impl Into<String>) -> Self {
        SettingId::Postmeta {
            post_type: post_type.into(),
            post_id,
            meta_key: meta_key.into(),
        }
    }
}

impl fmt::Display for SettingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingId::Postmeta {
                post_type,
                post_id,
                meta_key,
            } => write!(f, "postmeta[{post_type}][{post_id}][{meta_key}]"),
            SettingId::Post {
                post_type,
                post_id,
                field,
            } => {
                write!(f, "post[{post_type}][{post_id}][{}]", field.field)?;
                if let Some(child) = &field.child {
                    write!(f, "[{child}]")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for SettingId {
    type Err = LivepostError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let illegal = || LivepostError::IllegalSettingId(raw.to_string());

        let (head, segments) = split_segments(raw).ok_or_else(illegal)?;
        match (head, segments.len()) {
            ("postmeta", 3) => Ok(SettingId::Postmeta {
                post_type: segments[0].to_string(),
                post_id: parse_post_id(segments[1]).ok_or_else(illegal)?,
                meta_key: segments[2].to_string(),
            }),
            ("post", 3) => Ok(SettingId::Post {
                post_type: segments[0].to_string(),
                post_id: parse_post_id(segments[1]).ok_or_else(illegal)?,
                field: FieldPath::new(segments[2]),
            }),
            ("post", 4) => Ok(SettingId::Post {
                post_type: segments[0].to_string(),
                post_id: parse_post_id(segments[1]).ok_or_else(illegal)?,
                field: FieldPath::with_child(segments[2], segments[3]),
            }),
            _ => Err(illegal()),
        }
    }
}

/// Split `head[a][b][c]` into the head and its bracketed segments.
///
/// Rejects empty segments, nested brackets, and trailing garbage — the
/// grammar has no room for either.
fn split_segments(raw: &str) -> Option<(&str, Vec<&str>)> {
    let open = raw.find('[')?;
    let head = &raw[..open];
    if head.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    let mut rest = &raw[open..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        let segment = &rest[1..close];
        if segment.is_empty() || segment.contains('[') {
            return None;
        }
        segments.push(segment);
        rest = &rest[close + 1..];
    }
    Some((head, segments))
}

/// Record ids are strictly positive decimal integers: no signs, no zero.
fn parse_post_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}
