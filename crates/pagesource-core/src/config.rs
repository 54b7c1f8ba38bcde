//! Service configuration
//!
//! The fetch timeout and header profile are fixed constants in
//! [`crate::fetcher`]; only presentation details are configurable.

/// Default service name reported by `/health` and `/`.
pub const DEFAULT_SERVICE_NAME: &str = "Website Source Fetcher API";

/// Default `Cache-Control: max-age` on successful envelopes, in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub service_name: String,
    pub version: String,
    pub cache_max_age: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }
}

impl ServiceConfig {
    /// Build a config from a key lookup such as Worker vars or process env.
    ///
    /// Reads `SERVICE_NAME` and `CACHE_MAX_AGE`. Missing, blank or unparsable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("SERVICE_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            config.service_name = name;
        }

        if let Some(raw) = lookup("CACHE_MAX_AGE") {
            match raw.trim().parse::<u32>() {
                Ok(max_age) => config.cache_max_age = max_age,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid CACHE_MAX_AGE"),
            }
        }

        config
    }
}
