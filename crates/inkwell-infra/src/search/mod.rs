//! Search index backends.

pub mod matching;
mod memory;

#[cfg(feature = "tantivy")]
mod tantivy_index;

pub use memory::InMemorySearchIndex;

#[cfg(feature = "tantivy")]
pub use tantivy_index::TantivySearchIndex;
