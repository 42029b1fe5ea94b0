// Narrative Entity Miner - HTTP API
//
// Thin axum server around the entity-miner library: story upload and
// download, template lookup, similarity search and asynchronous mining jobs.

pub mod config;
pub mod server;

pub use config::*;
