//! Circuit breaker and retry helpers for outbound calls.
//!
//! [`Resilience::execute`] wraps a call in a retry loop whose every attempt goes
//! through a shared [`CircuitBreaker`]. Callers classify their own errors through
//! [`RemoteFailure`].

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use metrics::counter;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// Error Types
// ============================================================================

/// Reasons a call was refused without reaching the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Circuit breaker is open, service temporarily unavailable")]
    CircuitOpen,

    #[error("Too many requests while circuit breaker is half-open")]
    TooManyRequests,

    #[error("Call cancelled while waiting to retry")]
    Cancelled,
}

/// Error classification used by the breaker and the retry loop.
pub trait RemoteFailure: From<Rejection> {
    /// Whether this error counts against the breaker's failure threshold.
    fn trips_breaker(&self) -> bool;

    /// Whether another attempt may succeed. Only `Ok` stops the loop by default.
    fn is_retryable(&self) -> bool {
        true
    }
}

// ============================================================================
// Circuit Breaker
// ============================================================================

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    /// Name used in logs and metric labels.
    pub name: String,
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing trial calls.
    pub reset_timeout: Duration,
    /// Concurrent trial calls allowed while half-open; this many successes close it.
    pub half_open_max_requests: u32,
    /// Period after which counters are cleared while closed. `None` never clears.
    pub interval: Option<Duration>,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            name: "remote".to_string(),
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            half_open_max_requests: 1,
            interval: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    requests: u32,
    consecutive_successes: u32,
    consecutive_failures: u32,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

/// Circuit breaker for remote service protection.
///
/// Every state change starts a new generation; outcomes reported for an older
/// generation are dropped.
#[derive(Debug)]
pub struct CircuitBreaker {
    settings: BreakerSettings,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        let expiry = settings.interval.map(|interval| Instant::now() + interval);
        Self {
            settings,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Get current state.
    pub async fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().await;
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    /// Runs `call` if the breaker allows it and records the outcome.
    ///
    /// The future is dropped without being polled when the call is rejected.
    pub async fn call<T, E, Fut>(&self, call: Fut) -> Result<T, E>
    where
        E: RemoteFailure,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = self.before_call().await.map_err(E::from)?;

        let result = call.await;

        let failed = matches!(&result, Err(e) if e.trips_breaker());
        self.after_call(generation, !failed).await;

        result
    }

    async fn before_call(&self) -> Result<u64, Rejection> {
        let mut inner = self.inner.lock().await;
        self.refresh(&mut inner, Instant::now());

        match inner.state {
            CircuitState::Open => {
                counter!("circuit_breaker_rejections_total", "breaker" => self.settings.name.clone())
                    .increment(1);
                return Err(Rejection::CircuitOpen);
            }
            CircuitState::HalfOpen
                if inner.counts.requests >= self.settings.half_open_max_requests =>
            {
                counter!("circuit_breaker_rejections_total", "breaker" => self.settings.name.clone())
                    .increment(1);
                return Err(Rejection::TooManyRequests);
            }
            _ => {}
        }

        inner.counts.requests += 1;
        Ok(inner.generation)
    }

    async fn after_call(&self, generation: u64, success: bool) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        self.refresh(&mut inner, now);

        if inner.generation != generation {
            debug!(
                breaker = %self.settings.name,
                "Ignoring outcome from previous breaker generation"
            );
            return;
        }

        if success {
            inner.counts.consecutive_successes += 1;
            inner.counts.consecutive_failures = 0;
            if inner.state == CircuitState::HalfOpen
                && inner.counts.consecutive_successes >= self.settings.half_open_max_requests
            {
                self.transition(&mut inner, CircuitState::Closed, now);
            }
        } else {
            inner.counts.consecutive_failures += 1;
            inner.counts.consecutive_successes = 0;
            match inner.state {
                CircuitState::Closed
                    if inner.counts.consecutive_failures >= self.settings.failure_threshold =>
                {
                    warn!(
                        breaker = %self.settings.name,
                        failure_count = inner.counts.consecutive_failures,
                        threshold = self.settings.failure_threshold,
                        "Circuit breaker opened due to consecutive failures"
                    );
                    self.transition(&mut inner, CircuitState::Open, now);
                }
                CircuitState::HalfOpen => {
                    warn!(breaker = %self.settings.name, "Trial call failed, reopening circuit");
                    self.transition(&mut inner, CircuitState::Open, now);
                }
                _ => {}
            }
        }
    }

    /// Applies time-based transitions: open to half-open, and the closed-state reset.
    fn refresh(&self, inner: &mut BreakerInner, now: Instant) {
        let expired = inner.expiry.is_some_and(|expiry| expiry <= now);
        match inner.state {
            CircuitState::Closed if expired => self.new_generation(inner, now),
            CircuitState::Open if expired => {
                debug!(breaker = %self.settings.name, "Circuit breaker transitioning to half-open");
                self.transition(inner, CircuitState::HalfOpen, now);
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut BreakerInner, state: CircuitState, now: Instant) {
        if inner.state == state {
            return;
        }

        let previous = inner.state;
        inner.state = state;
        self.new_generation(inner, now);

        if state == CircuitState::Closed {
            info!(breaker = %self.settings.name, "Circuit breaker closed after successful request");
        }
        info!(
            breaker = %self.settings.name,
            from = previous.as_str(),
            to = state.as_str(),
            "Circuit breaker state changed"
        );
        counter!(
            "circuit_breaker_transitions_total",
            "breaker" => self.settings.name.clone(),
            "to" => state.as_str()
        )
        .increment(1);
    }

    fn new_generation(&self, inner: &mut BreakerInner, now: Instant) {
        inner.generation += 1;
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            CircuitState::Closed => self.settings.interval.map(|interval| now + interval),
            CircuitState::Open => Some(now + self.settings.reset_timeout),
            CircuitState::HalfOpen => None,
        };
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Bounded fixed-delay retry settings.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Calls `f` until it succeeds, fails with a non-retryable error, or attempts run out.
///
/// The whole loop, including the wait between attempts, races `cancel`;
/// cancellation returns [`Rejection::Cancelled`] right away.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    f: F,
) -> Result<T, E>
where
    E: RemoteFailure + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let backoff = ConstantBuilder::default()
        .with_delay(policy.delay)
        .with_max_times((attempts - 1) as usize);

    let attempt = f
        .retry(backoff)
        .when(|e: &E| e.is_retryable())
        .notify(|e: &E, delay: Duration| {
            warn!(
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Remote call failed, retrying"
            );
        });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Rejection::Cancelled.into()),
        result = attempt => result,
    }
}

// ============================================================================
// Combined wrapper
// ============================================================================

/// Retry around a circuit breaker. One instance is shared by all calls to a service.
#[derive(Debug)]
pub struct Resilience {
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl Resilience {
    pub fn new(breaker: BreakerSettings, retry: RetryPolicy) -> Self {
        Self {
            breaker: CircuitBreaker::new(breaker),
            retry,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    /// Runs `f` through the retry loop, each attempt guarded by the breaker.
    pub async fn execute<T, E, F, Fut>(&self, cancel: &CancellationToken, mut f: F) -> Result<T, E>
    where
        E: RemoteFailure + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = retry(&self.retry, cancel, || self.breaker.call(f())).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(
            "remote_calls_total",
            "breaker" => self.breaker.name().to_string(),
            "outcome" => outcome
        )
        .increment(1);

        result
    }
}
