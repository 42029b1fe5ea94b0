//! Data types for the mining pipeline.

pub mod config;
pub mod entity;
pub mod mined;
pub mod profile;
pub mod template;
