pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::{CacheReport, WsdlCache};
pub use config::BrtConfig;
pub use core::{
    client::BrtTrackingClient, invoker::SoapInvoker, rate_limiter::FixedWindowRateLimiter,
    resolver::EndpointResolver,
};
pub use domain::model::{
    EventLegendEntry, EventRecord, NoteRecord, ShipmentIdLookup, ShipmentRecord,
    StatusLegendEntry,
};
pub use utils::error::{BrtError, Result};
