//! pgcompare
//!
//! Compares several deployments of the same PostgreSQL database: health and
//! latency, ad-hoc query results, schema structure, and latency history.

pub mod api;
pub mod config;
pub mod error;
pub mod latency;
pub mod platform;
pub mod presets;
pub mod schema;
pub mod security;
pub mod store;
