//! Store implementations.
//!
//! - `MemoryTemplateStore`, `MemoryVectorStore`, `MemoryBlobStore`,
//!   `MemoryJobStore` - in-memory, for tests and development
//! - `FsBlobStore` - uploaded stories on the local filesystem
//! - `ChromaVectorStore` - a Chroma server over HTTP

pub mod chroma;
pub mod fs_blob;
pub mod memory;

pub use chroma::ChromaVectorStore;
pub use fs_blob::FsBlobStore;
pub use memory::{MemoryBlobStore, MemoryJobStore, MemoryTemplateStore, MemoryVectorStore};
