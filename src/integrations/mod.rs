// src/integrations/mod.rs
//
// External Integrations Module

pub mod referrer;

pub use referrer::{CompletionCallback, HttpReferrerClient, PayloadProvider, ServiceClient};
