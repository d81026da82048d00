// src/app/mod.rs
//
// Application wiring: configuration and subsystem initialization.

pub mod attribution_init;
pub mod config;

pub use attribution_init::init_attribution_subsystem;
pub use config::{AttributionConfig, ParserConfig, ResolverConfig, ServiceConfig, StoreConfig};
