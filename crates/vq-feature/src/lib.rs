//! Feature assembly: running per-frame feature extractors for an asset and
//! exposing their series keyed by feature score key.

mod assembler;
mod error;
mod external;
mod extractor;
mod spec;

pub use assembler::{FeatureAssembler, NoopFeatureAssembler};
pub use error::FeatureError;
pub use external::ExternalFeatureAssembler;
pub use extractor::{ExtractorCatalog, ExtractorDefinition};
pub use spec::{AtomSelection, FeatureSpec};
