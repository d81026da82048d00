// src/domain/attribution/response_code.rs
//
// Platform response codes delivered with the referrer completion event.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_objects::FailureReason;

/// Raw response code reported by the platform referrer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseCode(pub i32);

impl ResponseCode {
    pub const SERVICE_DISCONNECTED: ResponseCode = ResponseCode(-1);
    pub const OK: ResponseCode = ResponseCode(0);
    pub const SERVICE_UNAVAILABLE: ResponseCode = ResponseCode(1);
    pub const FEATURE_NOT_SUPPORTED: ResponseCode = ResponseCode(2);
    pub const DEVELOPER_ERROR: ResponseCode = ResponseCode(3);

    pub fn is_ok(&self) -> bool {
        *self == ResponseCode::OK
    }

    /// Maps the code to a failure.
    ///
    /// Returns None only for OK; unrecognized codes fold into Unknown.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match *self {
            ResponseCode::OK => None,
            ResponseCode::FEATURE_NOT_SUPPORTED => Some(FailureReason::FeatureNotSupported),
            ResponseCode::SERVICE_UNAVAILABLE => Some(FailureReason::ServiceConnectFailed),
            ResponseCode::DEVELOPER_ERROR => Some(FailureReason::DeveloperMisconfiguration),
            ResponseCode::SERVICE_DISCONNECTED => {
                Some(FailureReason::ServiceDisconnectedBeforeAnswer)
            }
            _ => Some(FailureReason::Unknown),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            ResponseCode::OK => "OK",
            ResponseCode::SERVICE_DISCONNECTED => "SERVICE_DISCONNECTED",
            ResponseCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
            ResponseCode::FEATURE_NOT_SUPPORTED => "FEATURE_NOT_SUPPORTED",
            ResponseCode::DEVELOPER_ERROR => "DEVELOPER_ERROR",
            _ => return write!(f, "UNRECOGNIZED({})", self.0),
        };
        write!(f, "{}", name)
    }
}
