//! Hosted model and embedding implementations.

#[cfg(feature = "hosted")]
pub mod hosted;

#[cfg(feature = "hosted")]
pub use hosted::{HostedEmbedder, HostedModel};
