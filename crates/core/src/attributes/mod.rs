//! Attributes module - request models, service, and cache traits.

mod attributes_model;
mod attributes_service;
mod attributes_traits;


pub use attributes_model::{AttributeLookup, AttributeRequest, Resolution};
pub use attributes_service::AttributeService;
pub use attributes_traits::{AttributeCacheStore, AttributeServiceTrait};
