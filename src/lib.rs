//! Personal finance estimation toolkit.
//!
//! The `core` module holds the pure calculators: compounding projections,
//! the required-contribution solver, slab-based tax evaluation, and the
//! estimators derived from them. `profile` persists a flat record of user
//! financial facts as JSON, and `api` wraps both in an HTTP JSON API and a
//! one-shot CLI.

pub mod api;
pub mod core;
pub mod profile;
