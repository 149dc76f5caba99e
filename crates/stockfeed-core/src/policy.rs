use std::env;
use std::str::FromStr;
use std::time::Duration;

use time::UtcOffset;

use crate::ValidationError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.stockanalysis.com";
pub const DEFAULT_SITE_BASE_URL: &str = "https://stockanalysis.com";
pub const DEFAULT_USER_AGENT: &str = concat!("stockfeed/", env!("CARGO_PKG_VERSION"));

/// Runtime limits and endpoints for the rate-limited client and its fetchers.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Upper bound on concurrently in-flight requests, process-wide per client.
    pub max_concurrency: usize,
    /// Throttle retries allowed per logical call.
    pub max_throttle_retries: u32,
    /// Back-off used when a throttle response carries no usable `Retry-After`.
    pub default_retry_after: Duration,
    /// Cap on any throttle back-off, whatever the upstream asks for.
    pub max_retry_after: Duration,
    pub request_timeout: Duration,
    /// Optional spacing of outbound requests; `None` disables pacing.
    pub quota: Option<RequestQuota>,
    pub user_agent: String,
    pub calendar_offset: CalendarOffset,
    pub endpoints: Endpoints,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 2,
            max_throttle_retries: 1,
            default_retry_after: Duration::from_secs(5),
            max_retry_after: Duration::from_secs(60),
            request_timeout: Duration::from_secs(15),
            quota: None,
            user_agent: String::from(DEFAULT_USER_AGENT),
            calendar_offset: CalendarOffset::Local,
            endpoints: Endpoints::default(),
        }
    }
}

impl FetchPolicy {
    /// Default policy overlaid with `STOCKFEED_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut policy = Self::default();

        if let Some(value) = env_parse::<usize>("STOCKFEED_MAX_CONCURRENCY")? {
            if value == 0 {
                return Err(ValidationError::InvalidConfig {
                    key: "STOCKFEED_MAX_CONCURRENCY",
                    value: value.to_string(),
                });
            }
            policy.max_concurrency = value;
        }
        if let Some(value) = env_parse::<u32>("STOCKFEED_MAX_THROTTLE_RETRIES")? {
            policy.max_throttle_retries = value;
        }
        if let Some(value) = env_parse::<u64>("STOCKFEED_RETRY_AFTER_SECS")? {
            policy.default_retry_after = Duration::from_secs(value);
        }
        if let Some(value) = env_parse::<u64>("STOCKFEED_MAX_RETRY_AFTER_SECS")? {
            policy.max_retry_after = Duration::from_secs(value);
        }
        if let Some(value) = env_parse::<u64>("STOCKFEED_TIMEOUT_MS")? {
            policy.request_timeout = Duration::from_millis(value);
        }
        if let Ok(value) = env::var("STOCKFEED_API_BASE_URL") {
            policy.endpoints.api_base = Endpoints::normalize(&value);
        }
        if let Ok(value) = env::var("STOCKFEED_SITE_BASE_URL") {
            policy.endpoints.site_base = Endpoints::normalize(&value);
        }
        if let Ok(value) = env::var("STOCKFEED_USER_AGENT") {
            policy.user_agent = value;
        }

        Ok(policy)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    pub fn with_max_retry_after(mut self, cap: Duration) -> Self {
        self.max_retry_after = cap;
        self
    }

    pub fn with_quota(mut self, quota: RequestQuota) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn with_calendar_offset(mut self, offset: CalendarOffset) -> Self {
        self.calendar_offset = offset;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// At most `limit` requests per `window`, spread evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestQuota {
    pub window: Duration,
    pub limit: u32,
}

/// Base URLs of the two upstream surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// JSON API host serving quotes, history and chart data.
    pub api_base: String,
    /// Site host serving the index-encoded `__data.json` documents.
    pub site_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: String::from(DEFAULT_API_BASE_URL),
            site_base: String::from(DEFAULT_SITE_BASE_URL),
        }
    }
}

impl Endpoints {
    pub fn new(api_base: &str, site_base: &str) -> Self {
        Self {
            api_base: Self::normalize(api_base),
            site_base: Self::normalize(site_base),
        }
    }

    fn normalize(base: &str) -> String {
        base.trim().trim_end_matches('/').to_owned()
    }
}

/// Offset used to turn time-series timestamps into calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarOffset {
    /// Offset of the host, falling back to UTC when it cannot be determined.
    Local,
    Utc,
    Fixed(UtcOffset),
}

impl CalendarOffset {
    pub fn resolve(self) -> UtcOffset {
        match self {
            Self::Local => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            Self::Utc => UtcOffset::UTC,
            Self::Fixed(offset) => offset,
        }
    }
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ValidationError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidConfig { key, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_limits() {
        let policy = FetchPolicy::default();

        assert_eq!(policy.max_concurrency, 2);
        assert_eq!(policy.max_throttle_retries, 1);
        assert_eq!(policy.default_retry_after, Duration::from_secs(5));
        assert_eq!(policy.max_retry_after, Duration::from_secs(60));
        assert!(policy.quota.is_none());
        assert_eq!(policy.endpoints.api_base, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn endpoints_drop_trailing_slashes() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000/", " https://site.test// ");

        assert_eq!(endpoints.api_base, "http://127.0.0.1:9000");
        assert_eq!(endpoints.site_base, "https://site.test");
    }

    #[test]
    fn concurrency_is_never_zero() {
        let policy = FetchPolicy::default().with_max_concurrency(0);
        assert_eq!(policy.max_concurrency, 1);
    }

    #[test]
    fn fixed_calendar_offset_resolves_to_itself() {
        let offset = UtcOffset::from_hms(9, 0, 0).expect("valid offset");
        assert_eq!(CalendarOffset::Fixed(offset).resolve(), offset);
        assert_eq!(CalendarOffset::Utc.resolve(), UtcOffset::UTC);
    }

    #[test]
    fn unparsable_environment_value_is_a_config_error() {
        env::set_var("STOCKFEED_TEST_PARSE_GARBAGE", "two");
        env::set_var("STOCKFEED_TEST_PARSE_PADDED", " 7 ");

        let error = env_parse::<usize>("STOCKFEED_TEST_PARSE_GARBAGE").expect_err("not a number");
        assert_eq!(
            error,
            ValidationError::InvalidConfig {
                key: "STOCKFEED_TEST_PARSE_GARBAGE",
                value: String::from("two"),
            }
        );
        assert_eq!(env_parse::<u64>("STOCKFEED_TEST_PARSE_PADDED"), Ok(Some(7)));
        assert_eq!(env_parse::<u64>("STOCKFEED_TEST_PARSE_UNSET"), Ok(None));
    }
}
