//! Command handlers for the CLI
//!
//! - `serve`    runs the HTTP API
//! - `models`   prints the live model catalog
//! - `sessions` lists stored sessions and shows their history

pub mod models;
pub mod serve;
pub mod sessions;
