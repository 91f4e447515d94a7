//! # API crate: hosted backend client for CampusSkill
//!
//! The marketplace keeps no server of its own. Auth, storage and row-level
//! access rules all live in a hosted backend-as-a-service; this crate is the
//! client for it and implements [`store::Backend`] so the marketplace
//! controller can run against it unchanged.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Magic-link sign-in, token refresh, logout, redirect parsing and session persistence |
//! | [`config`] | `SUPABASE_URL` / `SUPABASE_ANON_KEY` and friends from the environment |
//! | [`error`] | [`SupabaseError`] and the error-body message extraction |
//! | [`rest`] | `select` / `insert` / `upsert` over the REST tables |
//!
//! [`SupabaseClient`] ties them together: it holds the current session,
//! persists it, refreshes it when expired, and broadcasts auth changes.

pub mod auth;
mod client;
pub mod config;
pub mod error;
pub mod rest;

pub use client::SupabaseClient;
pub use config::{ConfigError, SupabaseConfig};
pub use error::SupabaseError;
