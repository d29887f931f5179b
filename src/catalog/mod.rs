//! Format catalog: filtering, classification and selection of the formats an
//! extractor reports for one URL.

pub mod builder;
pub mod descriptor;
pub mod selector;
pub mod tier;

pub use builder::{Catalog, CatalogBuilder, CatalogEntry, StreamKind};
pub use descriptor::{FormatDescriptor, SourceInfo};
pub use tier::QualityTier;
