//! Market data models
//!
//! This module contains the core data types shared by the catalog, the
//! providers, the resolution engine and the cache:
//! - `types` - Asset classes, source identifiers and source preferences
//! - `attribute` - The closed `Attribute` enumeration and its wire names
//! - `record` - Attribute values, partial records and ordered projections

mod attribute;
mod record;
mod types;

pub use attribute::Attribute;
pub use record::{AttributeRecord, AttributeValue, OrderedRecord};
pub use types::{AssetClass, SourceId, SourcePreference};
