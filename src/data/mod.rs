//! Data module - dataset loading and normalization

mod loader;
mod normalizer;
pub mod schema;
mod table;

pub use loader::{DataLoader, SourceFormat};
pub use normalizer::{DataNormalizer, NormalizeSummary};
pub use table::{FeatureSeries, MissingnessMask, ObservationTable};
