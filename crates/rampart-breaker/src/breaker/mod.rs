//! The per-dependency circuit breaker.
//!
//! A [`CircuitBreaker`] wraps calls to one named dependency. Its counters live
//! behind a single mutex; the wrapped operation and any fallback always run
//! with the lock released, so a slow dependency never blocks status queries
//! or unrelated callers.
//!
//! While half-open the breaker admits exactly one probe at a time. Calls that
//! arrive while the probe is still in flight are treated as if the circuit
//! were open: they receive the fallback, or a
//! [`CircuitOpenError`](crate::CircuitOpenError) when none was supplied.
//! An operation that panics is recorded as a failure before the unwind
//! continues, and only the probe's own success counts towards closing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::clock::{Clock, SystemClock};
use crate::error::{BreakerError, CircuitOpenError};
use crate::listener::{BREAKER_TARGET, LoggingStateListener, StateListener};

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);
const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;

/// Lifecycle state of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    /// Calls flow through to the dependency.
    Closed,
    /// Calls fail fast until the cooldown elapses.
    Open,
    /// A probe is testing whether the dependency has recovered.
    HalfOpen,
}

impl BreakerState {
    /// Returns the canonical upper-case label used in status snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable thresholds for a single breaker.
///
/// Thresholds below one are raised to one: a breaker that opened on zero
/// failures could never close again.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rampart_breaker::BreakerSettings;
///
/// let settings = BreakerSettings::new(3, Duration::from_millis(1_000), 0);
/// assert_eq!(settings.failure_threshold(), 3);
/// assert_eq!(settings.success_threshold(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    failure_threshold: u32,
    cooldown: Duration,
    success_threshold: u32,
}

impl BreakerSettings {
    /// Creates settings from explicit thresholds.
    #[must_use]
    pub fn new(failure_threshold: u32, cooldown: Duration, success_threshold: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            success_threshold: success_threshold.max(1),
        }
    }

    /// Consecutive failures that open a closed breaker.
    #[must_use]
    pub const fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Time an open breaker waits before admitting a probe.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Consecutive half-open successes that close the breaker.
    #[must_use]
    pub const fn success_threshold(&self) -> u32 {
        self.success_threshold
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_COOLDOWN,
            DEFAULT_SUCCESS_THRESHOLD,
        )
    }
}

/// Point-in-time snapshot of a breaker for operational tooling.
///
/// Serialises with camel-case keys; timestamps are RFC 3339 strings or
/// `null` when the event has not happened yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStatus {
    /// Dependency name.
    pub name: String,
    /// Current state.
    pub state: BreakerState,
    /// Consecutive failures counted towards opening.
    pub failures: u32,
    /// Consecutive successes counted while half-open.
    pub successes: u32,
    /// Failures required to open the breaker.
    pub failure_threshold: u32,
    /// Half-open successes required to close the breaker.
    pub success_threshold: u32,
    /// Cooldown before a probe is admitted, in milliseconds.
    pub cooldown_ms: u64,
    /// When the most recent failure was recorded.
    pub last_failure_at: Option<String>,
    /// When the breaker last opened.
    pub opened_at: Option<String>,
    /// Calls made through the breaker, including shunted ones.
    pub total_calls: u64,
    /// Failures reported by the wrapped operation.
    pub total_failures: u64,
    /// Calls answered by a fallback or refused while open.
    pub total_fallbacks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    from: BreakerState,
    to: BreakerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Attempt { probe: bool },
    Rejected,
}

/// Result of a guarded attempt before the caller's fallback policy applies.
enum Outcome<T, E> {
    Value(T),
    Failed(E),
    Shunted,
}

#[derive(Debug)]
struct Core {
    state: BreakerState,
    failures: u32,
    successes: u32,
    last_failure_at: Option<OffsetDateTime>,
    opened_at: Option<OffsetDateTime>,
    total_calls: u64,
    total_failures: u64,
    total_fallbacks: u64,
    probe_in_flight: bool,
}

impl Core {
    const fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            failures: 0,
            successes: 0,
            last_failure_at: None,
            opened_at: None,
            total_calls: 0,
            total_failures: 0,
            total_fallbacks: 0,
            probe_in_flight: false,
        }
    }

    fn enter(&mut self, to: BreakerState) -> Option<Transition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        Some(Transition { from, to })
    }

    fn open(&mut self, now: OffsetDateTime) -> Option<Transition> {
        self.opened_at = Some(now);
        self.enter(BreakerState::Open)
    }

    fn shunt(&mut self) {
        self.total_fallbacks = self.total_fallbacks.saturating_add(1);
    }
}

/// Failure-aware wrapper around calls to one named dependency.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use rampart_breaker::{BreakerSettings, BreakerState, CircuitBreaker, ManualClock};
///
/// let clock = Arc::new(ManualClock::default());
/// let breaker = CircuitBreaker::new("inference", BreakerSettings::new(1, Duration::from_secs(5), 1))
///     .with_clock(clock.clone());
///
/// let _ = breaker.call(|| Err::<(), _>("backend down"));
/// assert_eq!(breaker.state(), BreakerState::Open);
///
/// clock.advance(Duration::from_secs(5));
/// breaker.call(|| Ok::<_, &str>(())).expect("probe succeeds");
/// assert_eq!(breaker.state(), BreakerState::Closed);
/// ```
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn StateListener>,
    core: Mutex<Core>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a closed breaker using the system clock and the logging
    /// listener.
    #[must_use]
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            clock: Arc::new(SystemClock),
            listener: Arc::new(LoggingStateListener),
            core: Mutex::new(Core::new()),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the state-change listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Returns the dependency name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the configured thresholds.
    #[must_use]
    pub const fn settings(&self) -> BreakerSettings {
        self.settings
    }

    /// Returns the current state without side effects.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Runs `op` under breaker protection.
    ///
    /// # Errors
    ///
    /// Returns [`BreakerError::Open`] without invoking `op` while the circuit
    /// is open (or a half-open probe is already in flight), and
    /// [`BreakerError::Operation`] carrying `op`'s own error when it fails.
    pub fn call<T, E, F>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self.run(op, false) {
            Outcome::Value(value) => Ok(value),
            Outcome::Failed(error) => Err(BreakerError::Operation(error)),
            Outcome::Shunted => Err(BreakerError::Open(CircuitOpenError::new(
                self.name.as_str(),
            ))),
        }
    }

    /// Runs `op` under breaker protection, degrading to `fallback`.
    ///
    /// The fallback answers calls refused by an open circuit, and replaces a
    /// failure that left the breaker open. A failure that does not open the
    /// breaker is still returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns `op`'s error when it fails while the breaker stays closed.
    pub fn call_with_fallback<T, E, F, G>(&self, op: F, fallback: G) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        G: FnOnce() -> T,
    {
        match self.run(op, true) {
            Outcome::Value(value) => Ok(value),
            Outcome::Failed(error) => Err(error),
            Outcome::Shunted => Ok(fallback()),
        }
    }

    /// Forces the breaker closed and clears the consecutive counters.
    pub fn reset(&self) {
        let transition = {
            let mut core = self.lock();
            core.failures = 0;
            core.successes = 0;
            core.probe_in_flight = false;
            core.enter(BreakerState::Closed)
        };
        tracing::info!(target: BREAKER_TARGET, breaker = %self.name, "circuit breaker reset");
        self.notify(transition);
    }

    /// Returns a snapshot of every attribute for observability.
    #[must_use]
    pub fn status(&self) -> BreakerStatus {
        let core = self.lock();
        BreakerStatus {
            name: self.name.clone(),
            state: core.state,
            failures: core.failures,
            successes: core.successes,
            failure_threshold: self.settings.failure_threshold,
            success_threshold: self.settings.success_threshold,
            cooldown_ms: u64::try_from(self.settings.cooldown.as_millis()).unwrap_or(u64::MAX),
            last_failure_at: format_instant(core.last_failure_at),
            opened_at: format_instant(core.opened_at),
            total_calls: core.total_calls,
            total_failures: core.total_failures,
            total_fallbacks: core.total_fallbacks,
        }
    }

    fn run<T, E, F>(&self, op: F, has_fallback: bool) -> Outcome<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let (admission, transition) = self.admit();
        self.notify(transition);
        let probe = match admission {
            Admission::Attempt { probe } => probe,
            Admission::Rejected => {
                tracing::debug!(
                    target: BREAKER_TARGET,
                    breaker = %self.name,
                    has_fallback,
                    "call shunted by open circuit"
                );
                return Outcome::Shunted;
            }
        };

        let attempt = Attempt::new(self, probe);
        match op() {
            Ok(value) => {
                attempt.succeeded();
                Outcome::Value(value)
            }
            Err(error) => {
                if attempt.failed(has_fallback) {
                    Outcome::Shunted
                } else {
                    Outcome::Failed(error)
                }
            }
        }
    }

    fn admit(&self) -> (Admission, Option<Transition>) {
        let now = self.clock.now();
        let mut core = self.lock();
        core.total_calls = core.total_calls.saturating_add(1);
        match core.state {
            BreakerState::Closed => (Admission::Attempt { probe: false }, None),
            BreakerState::Open if self.cooldown_elapsed(&core, now) => {
                let transition = core.enter(BreakerState::HalfOpen);
                core.successes = 0;
                core.probe_in_flight = true;
                (Admission::Attempt { probe: true }, transition)
            }
            BreakerState::HalfOpen if !core.probe_in_flight => {
                core.probe_in_flight = true;
                (Admission::Attempt { probe: true }, None)
            }
            BreakerState::Open | BreakerState::HalfOpen => {
                core.shunt();
                (Admission::Rejected, None)
            }
        }
    }

    fn record_success(&self, probe: bool) -> Option<Transition> {
        let mut core = self.lock();
        if probe {
            core.probe_in_flight = false;
        }
        match core.state {
            BreakerState::HalfOpen if probe => {
                core.successes = core.successes.saturating_add(1);
                if core.successes >= self.settings.success_threshold {
                    core.failures = 0;
                    core.enter(BreakerState::Closed)
                } else {
                    None
                }
            }
            BreakerState::Closed => {
                core.failures = 0;
                None
            }
            // Admitted before the circuit reopened: the newer failure wins and
            // only probes may close a half-open breaker.
            BreakerState::HalfOpen | BreakerState::Open => None,
        }
    }

    fn record_failure(&self, probe: bool, has_fallback: bool) -> (bool, Option<Transition>) {
        let now = self.clock.now();
        let mut core = self.lock();
        if probe {
            core.probe_in_flight = false;
        }
        core.total_failures = core.total_failures.saturating_add(1);
        core.failures = core.failures.saturating_add(1);
        core.last_failure_at = Some(now);

        let transition = match core.state {
            BreakerState::HalfOpen => core.open(now),
            BreakerState::Closed if core.failures >= self.settings.failure_threshold => {
                core.open(now)
            }
            BreakerState::Closed | BreakerState::Open => None,
        };

        let shunted = has_fallback && core.state == BreakerState::Open;
        if shunted {
            core.shunt();
        }
        (shunted, transition)
    }

    fn cooldown_elapsed(&self, core: &Core, now: OffsetDateTime) -> bool {
        core.opened_at.is_none_or(|opened_at| {
            let elapsed = now - opened_at;
            !elapsed.is_negative() && elapsed.unsigned_abs() >= self.settings.cooldown
        })
    }

    fn notify(&self, transition: Option<Transition>) {
        if let Some(Transition { from, to }) = transition {
            self.listener.on_transition(&self.name, from, to);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An admitted call whose outcome has not been recorded yet.
///
/// Dropping an unsettled attempt means the operation unwound. The panic is
/// recorded as a failure so a half-open probe slot is never left occupied.
struct Attempt<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> Attempt<'a> {
    const fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    fn succeeded(mut self) {
        self.settled = true;
        let transition = self.breaker.record_success(self.probe);
        self.breaker.notify(transition);
    }

    /// Records the failure and returns `true` when the caller's fallback
    /// should answer instead.
    fn failed(mut self, has_fallback: bool) -> bool {
        self.settled = true;
        let (shunted, transition) = self.breaker.record_failure(self.probe, has_fallback);
        self.breaker.notify(transition);
        shunted
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(
            target: BREAKER_TARGET,
            breaker = %self.breaker.name,
            probe = self.probe,
            "guarded operation panicked"
        );
        let (_, transition) = self.breaker.record_failure(self.probe, false);
        self.breaker.notify(transition);
    }
}

fn format_instant(instant: Option<OffsetDateTime>) -> Option<String> {
    instant.and_then(|value| value.format(&Rfc3339).ok())
}
