//! Built-in sanitizers.
//!
//! Each is a plain function matching the [`Sanitizer`](super::Sanitizer)
//! signature so it can be registered directly or wrapped by a custom one.
//! Sanitizers normalize as well as validate: dates are re-emitted in the
//! canonical storage format whatever accepted format they arrived in.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::SanitizeError;
use crate::fields::SanitizeContext;
use crate::model::DATETIME_FORMAT;

/// Trim surrounding whitespace and strip control characters.
pub fn text(raw: &Value, _ctx: &SanitizeContext<'_>) -> Result<Value, SanitizeError> {
    let s = raw.as_str().unwrap_or_default();
    let cleaned: String = s.trim().chars().filter(|c| !c.is_control()).collect();
    Ok(Value::String(cleaned))
}

/// Lowercase and shape-check an email address.
pub fn email(raw: &Value, _ctx: &SanitizeContext<'_>) -> Result<Value, SanitizeError> {
    let s = raw.as_str().unwrap_or_default().trim().to_lowercase();
    let mut parts = s.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if local.is_empty() || !domain_ok || s.chars().any(char::is_whitespace) {
        return Err(SanitizeError::InvalidEmail { raw: s });
    }
    Ok(Value::String(s))
}

/// Validate a template slug against the current theme's template list.
/// `default` always passes: it means "no template", not a file.
pub fn page_template(raw: &Value, ctx: &SanitizeContext<'_>) -> Result<Value, SanitizeError> {
    let s = raw.as_str().unwrap_or_default();
    if s == "default" || ctx.page_templates.iter().any(|t| t == s) {
        Ok(Value::String(s.to_string()))
    } else {
        Err(SanitizeError::InvalidPageTemplate {
            template: s.to_string(),
        })
    }
}

/// Parse a client-submitted date against the configured format and re-emit
/// it canonically.
pub fn post_date(raw: &Value, ctx: &SanitizeContext<'_>) -> Result<Value, SanitizeError> {
    let s = raw.as_str().unwrap_or_default().trim();
    let parsed = NaiveDateTime::parse_from_str(s, ctx.date_format)
        .map_err(|_| SanitizeError::InvalidDate { raw: s.to_string() })?;
    Ok(Value::String(parsed.format(DATETIME_FORMAT).to_string()))
}

/// Accept a strictly positive integer id (author references).
pub fn positive_id(raw: &Value, _ctx: &SanitizeContext<'_>) -> Result<Value, SanitizeError> {
    let id = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(Value::from(id)),
        _ => Err(SanitizeError::InvalidAuthor),
    }
}
