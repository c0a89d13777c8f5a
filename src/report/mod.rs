//! Catalog document assembly and serialization.

pub mod document;
pub mod writer;

pub use document::{CatalogDocument, FeatureEntry, SampleEntry};
pub use writer::{read_catalog, write_catalog};
