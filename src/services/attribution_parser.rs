// src/services/attribution_parser.rs
//
// Extracts the campaign suffix from a raw install referrer.

use regex::Regex;

use crate::app::config::ParserConfig;
use crate::error::AppResult;

/// Maps a raw referrer payload to an attribution value. Pure and total.
#[cfg_attr(test, mockall::automock)]
pub trait AttributionParser: Send + Sync {
    fn parse(&self, raw: &str) -> Option<String>;
}

/// Reads one parameter out of a `key=value&key=value` referrer.
pub struct QueryParamParser {
    pattern: Regex,
}

impl QueryParamParser {
    pub fn new(config: &ParserConfig) -> AppResult<Self> {
        let pattern = Regex::new(&format!(
            r"(?:^|&){}=([^&]*)",
            regex::escape(config.campaign_param.trim())
        ))?;
        Ok(Self { pattern })
    }
}

impl AttributionParser for QueryParamParser {
    fn parse(&self, raw: &str) -> Option<String> {
        let value = self.pattern.captures(raw.trim())?.get(1)?.as_str().trim();
        if value.is_empty() {
            log::debug!("[ATTRIBUTION] Campaign parameter present but empty");
            None
        } else {
            Some(value.to_string())
        }
    }
}
