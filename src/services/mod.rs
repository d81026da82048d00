// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod attribution_parser;
pub mod attribution_resolver;


pub use attribution_parser::{AttributionParser, QueryParamParser};
pub use attribution_resolver::AttributionResolver;
