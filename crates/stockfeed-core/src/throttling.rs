use std::fmt::{Debug, Formatter};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{DecodeError, FetchError};
use crate::http_client::{HttpClient, HttpConnector, HttpError, HttpRequest, ReqwestConnector};
use crate::policy::{FetchPolicy, RequestQuota};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces outbound requests according to a [`RequestQuota`].
pub struct RequestPacer {
    limiter: DirectRateLimiter,
    quota: RequestQuota,
}

impl RequestPacer {
    pub fn new(quota: RequestQuota) -> Self {
        Self {
            limiter: RateLimiter::direct(quota_from_window(quota.window, quota.limit)),
            quota,
        }
    }

    /// Takes one cell of budget if available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until one cell of budget is available and takes it.
    pub async fn ready(&self) {
        self.limiter.until_ready().await;
    }

    pub const fn quota(&self) -> RequestQuota {
        self.quota
    }
}

impl Debug for RequestPacer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Shared HTTP access point: bounded concurrency, one reusable connection
/// context, and a single retry after a throttle response.
///
/// Construct once and hand out behind an `Arc`; the admission bound holds
/// across every caller sharing the instance.
pub struct RateLimitedClient {
    policy: FetchPolicy,
    connector: Arc<dyn HttpConnector>,
    session: Mutex<Option<Arc<dyn HttpClient>>>,
    gate: Semaphore,
    pacer: Option<RequestPacer>,
}

impl RateLimitedClient {
    pub fn new(policy: FetchPolicy, connector: Arc<dyn HttpConnector>) -> Self {
        let permits = policy.max_concurrency.max(1);
        let pacer = policy.quota.map(RequestPacer::new);

        Self {
            policy,
            connector,
            session: Mutex::new(None),
            gate: Semaphore::new(permits),
            pacer,
        }
    }

    /// Client over the reqwest transport.
    pub fn from_policy(policy: FetchPolicy) -> Self {
        let connector = Arc::new(ReqwestConnector::new(policy.user_agent.clone()));
        Self::new(policy, connector)
    }

    pub fn with_defaults() -> Self {
        Self::from_policy(FetchPolicy::default())
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Admission slots currently free.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    pub fn has_open_session(&self) -> bool {
        self.session
            .lock()
            .expect("session lock should not be poisoned")
            .is_some()
    }

    /// Issues a GET and returns the parsed JSON body.
    ///
    /// The admission slot is held for the whole logical call, throttle
    /// back-off included. Dropping the returned future releases it.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| HttpError::new("admission gate is closed"))?;

        let mut throttled = 0_u32;
        loop {
            if let Some(pacer) = &self.pacer {
                pacer.ready().await;
            }

            let session = self.session()?;
            let request = HttpRequest::get(url)
                .with_timeout(self.policy.request_timeout)
                .with_header("accept", "application/json");

            debug!(url, attempt = throttled + 1, "sending request");
            let response =
                match tokio::time::timeout(self.policy.request_timeout, session.execute(request))
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(HttpError::timeout(format!(
                            "request timeout after {}ms",
                            self.policy.request_timeout.as_millis()
                        ))
                        .into())
                    }
                };

            if response.is_success() {
                session.clear_cookies();
                return parse_body(&response.body);
            }

            if response.is_throttled() && throttled < self.policy.max_throttle_retries {
                throttled += 1;
                let delay = response
                    .retry_after()
                    .unwrap_or(self.policy.default_retry_after)
                    .min(self.policy.max_retry_after);
                warn!(
                    url,
                    status = response.status,
                    delay_ms = delay.as_millis() as u64,
                    "throttled by upstream, recycling session before retry"
                );
                self.recycle(&session);
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(FetchError::upstream(response.status, response.reason()));
        }
    }

    /// Closes the current connection context. Safe to call repeatedly or
    /// before anything was opened.
    pub fn close(&self) {
        let closed = self
            .session
            .lock()
            .expect("session lock should not be poisoned")
            .take();

        if let Some(session) = closed {
            session.clear_cookies();
            debug!("closed http session");
        }
    }

    fn session(&self) -> Result<Arc<dyn HttpClient>, HttpError> {
        let mut slot = self
            .session
            .lock()
            .expect("session lock should not be poisoned");

        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = self.connector.connect()?;
        debug!("opened http session");
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Drops `used` if it is still the live context. A context already
    /// replaced by another caller is left alone.
    fn recycle(&self, used: &Arc<dyn HttpClient>) {
        let mut slot = self
            .session
            .lock()
            .expect("session lock should not be poisoned");

        let is_current = slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, used));
        if is_current {
            if let Some(session) = slot.take() {
                session.clear_cookies();
            }
            debug!("recycled http session");
        }
    }
}

impl Debug for RateLimitedClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("policy", &self.policy)
            .field("available_slots", &self.gate.available_permits())
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

fn parse_body(body: &str) -> Result<Value, FetchError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).map_err(|e| {
        DecodeError::InvalidJson {
            message: e.to_string(),
        }
        .into()
    })
}
