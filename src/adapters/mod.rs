// Adapters layer: concrete implementations for external systems.

pub mod wsdl_cache;

pub use wsdl_cache::{CacheReport, WsdlCache};
