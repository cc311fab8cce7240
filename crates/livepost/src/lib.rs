//! # Livepost
//!
//! Live-preview staging, sanitization and persistence for CMS post fields
//! and postmeta. This is the server half of a "customizer" editing surface:
//! a client stages unsaved values against setting identifiers, the server
//! applies them transiently to in-memory reads so a preview renders with
//! them, and on save commits them — validated per field — to the real store.
//!
//! ## The request protocol
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Customizer manager (manager.rs)                             │
//! │  - staged client values, acting principal, posts component   │
//! │  - lazy setting resolution, batch save, request teardown     │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Settings (settings/)                                        │
//! │  - postmeta[type][id][key] and post[type][id][field] kinds   │
//! │  - construct → sanitize → value / preview / save             │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Storage (store/) + preview overrides (preview.rs)           │
//! │  - PostStore trait; InMemoryStore for tests                  │
//! │  - PreviewedStore applies session overrides to reads         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are a wire format ([`ident`]); field schemas live in a
//! registry ([`fields`]) resolved exact-key-first with per-subtype
//! wildcards. Everything request-scoped is owned by the manager and torn
//! down by [`manager::Customizer::end_request`] — preview state never leaks
//! between requests.
//!
//! ## Module overview
//!
//! - [`manager`]: the per-request facade and save coordinator
//! - [`settings`]: the two setting kinds and their operations
//! - [`ident`]: setting identifier parsing and formatting
//! - [`fields`]: field definitions, registry, built-in sanitizers
//! - [`store`]: storage abstraction and the preview-transparent view
//! - [`preview`]: the request-scoped override session
//! - [`events`]: save lifecycle notifications
//! - [`controls`]: client-facing export for the date-picker control
//! - [`config`]: layered configuration
//! - [`error`]: error types

pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod fields;
pub mod ident;
pub mod manager;
pub mod model;
pub mod preview;
pub mod settings;
pub mod store;

pub use config::LivepostConfig;
pub use error::{LivepostError, Result, SanitizeError};
pub use events::Event;
pub use ident::SettingId;
pub use manager::{Customizer, SettingKind};
pub use model::{Post, Principal};
pub use settings::post::PostSetting;
pub use settings::postmeta::PostmetaSetting;
pub use settings::SettingArgs;
pub use store::mem::InMemoryStore;
pub use store::PostStore;
