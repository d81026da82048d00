// src/integrations/referrer/client.rs
//
// Referrer service boundary.
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - A successful connect() is followed by exactly one completion callback
// - The owner of the connection closes it with disconnect() once the callback ran

use crate::domain::ResponseCode;
use crate::error::AppResult;

/// Hands over the raw referrer payload. Only meaningful for ResponseCode::OK.
pub type PayloadProvider = Box<dyn FnOnce() -> AppResult<String> + Send>;

/// Single completion event for a connection.
pub type CompletionCallback = Box<dyn FnOnce(ResponseCode, PayloadProvider) + Send>;

#[cfg_attr(test, mockall::automock)]
pub trait ServiceClient: Send + Sync {
    /// Whether the referrer service is installed/reachable at all.
    fn discover(&self) -> AppResult<bool>;

    /// Open the connection. `on_complete` fires once, possibly on another thread.
    fn connect(&self, on_complete: CompletionCallback) -> AppResult<()>;

    fn disconnect(&self) -> AppResult<()>;
}
