//! Vishwavani news core
//!
//! Taxonomy, authorship and article ranking for the Vishwavani news site,
//! with a read-only JSON query surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
