// src/integrations/referrer/mod.rs

pub mod client;
pub mod http_client;

pub use client::{CompletionCallback, PayloadProvider, ServiceClient};
pub use http_client::HttpReferrerClient;

#[cfg(test)]
pub use client::MockServiceClient;
