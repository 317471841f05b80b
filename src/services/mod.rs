//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! `segment`, `render` and `selector` are pure; everything touching storage
//! goes through `store::DoubtStore`.

pub mod account;
pub mod history;
pub mod render;
pub mod segment;
pub mod selector;
pub mod session;
pub mod solve;
pub mod store;
