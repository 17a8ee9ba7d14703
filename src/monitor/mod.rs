//! Check orchestration
//!
//! Fans probes out over a bounded number of concurrent tasks, attributes each
//! verdict back to its descriptor, and folds verdicts into per-domain
//! availability.

mod availability;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::models::{EndpointDescriptor, HealthVerdict, ProbeOutcome};
use crate::probe::{Clock, HealthChecker, Transport};
use crate::utils::now;

pub use availability::{AvailabilityTracker, DomainTally};

/// Verdict for one descriptor in one cycle
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Position of the descriptor in the endpoint list
    pub index: usize,
    pub id: String,
    pub domain: String,
    pub outcome: ProbeOutcome,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn verdict(&self) -> HealthVerdict {
        self.outcome.verdict
    }
}

/// Probe every endpoint once with at most `concurrency` probes in flight.
///
/// Results come back in endpoint order regardless of completion order.
pub async fn run_cycle<T, C>(
    checker: &HealthChecker<T, C>,
    endpoints: &[EndpointDescriptor],
    concurrency: usize,
) -> Vec<CheckResult>
where
    T: Transport,
    C: Clock,
{
    let mut results: Vec<CheckResult> = stream::iter(endpoints.iter().enumerate())
        .map(|(index, endpoint)| async move {
            let outcome = checker.probe(endpoint).await;
            CheckResult {
                index,
                id: endpoint.id().to_string(),
                domain: endpoint.domain(),
                outcome,
                checked_at: now(),
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|r| r.index);
    results
}

/// Repeating check cycles with cumulative availability
pub struct Monitor<T, C> {
    checker: HealthChecker<T, C>,
    endpoints: Vec<EndpointDescriptor>,
    check_interval: Duration,
    concurrency: usize,
    tracker: AvailabilityTracker,
}

impl<T: Transport, C: Clock> Monitor<T, C> {
    pub fn new(
        checker: HealthChecker<T, C>,
        endpoints: Vec<EndpointDescriptor>,
        check_interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            checker,
            endpoints,
            check_interval,
            concurrency,
            tracker: AvailabilityTracker::new(),
        }
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    /// Run one cycle and fold its verdicts into the tracker.
    pub async fn run_once(&mut self) -> Vec<CheckResult> {
        let results = run_cycle(&self.checker, &self.endpoints, self.concurrency).await;
        self.tracker.record_all(&results);

        let up = results.iter().filter(|r| r.verdict().is_up()).count();
        info!(
            endpoints = results.len(),
            up = up,
            down = results.len() - up,
            "Check cycle complete"
        );
        results
    }

    /// Run cycles every `check_interval` until `shutdown` resolves.
    ///
    /// The first cycle starts immediately. A cycle in progress is finished
    /// before shutdown is honoured. `on_cycle` sees each cycle's results
    /// and the cumulative tracker.
    pub async fn run<S, F>(mut self, shutdown: S, mut on_cycle: F) -> AvailabilityTracker
    where
        S: Future<Output = ()>,
        F: FnMut(&[CheckResult], &AvailabilityTracker),
    {
        info!(
            endpoints = self.endpoints.len(),
            interval_secs = self.check_interval.as_secs(),
            concurrency = self.concurrency,
            latency_threshold_ms = self.checker.policy().latency_threshold.as_millis() as u64,
            "Starting endpoint monitor"
        );

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping monitor");
                    break;
                }
                _ = ticker.tick() => {
                    let results = self.run_once().await;
                    on_cycle(&results, &self.tracker);
                }
            }
        }

        self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MonotonicClock, ProbePolicy, ProbeRequest, ProbeResponse, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers 503 for hosts starting with "down", 200 otherwise, after a short delay.
    #[derive(Default)]
    struct HostTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Arc<HostTransport> {
        async fn send(
            &self,
            request: ProbeRequest,
        ) -> std::result::Result<ProbeResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let host = request.url.host_str().unwrap_or_default();
            let status = if host.starts_with("down") { 503 } else { 200 };
            Ok(ProbeResponse { status, body_len: 0 })
        }

        fn implementation_name(&self) -> &'static str {
            "host"
        }
    }

    fn checker(transport: Arc<HostTransport>) -> HealthChecker<Arc<HostTransport>, MonotonicClock> {
        HealthChecker::from_parts(transport, MonotonicClock::new(), ProbePolicy::default())
    }

    fn endpoints() -> Vec<EndpointDescriptor> {
        vec![
            EndpointDescriptor::new("http://up-1.example.com/").with_name("first"),
            EndpointDescriptor::new("http://down-1.example.com:8080/"),
            EndpointDescriptor::new("http://up-2.example.com/health"),
            EndpointDescriptor::new("http://badjson.example.com/")
                .with_method("POST")
                .with_body("{invalid}"),
            EndpointDescriptor::new("http://down-2.example.com/"),
            EndpointDescriptor::new("http://up-1.example.com/other"),
        ]
    }

    #[tokio::test]
    async fn test_results_attributed_in_order() {
        let transport = Arc::new(HostTransport::default());
        let checker = checker(transport.clone());

        let results = run_cycle(&checker, &endpoints(), 3).await;
        let verdicts: Vec<_> = results.iter().map(|r| (r.index, r.verdict())).collect();

        assert_eq!(
            verdicts,
            vec![
                (0, HealthVerdict::Up),
                (1, HealthVerdict::Down),
                (2, HealthVerdict::Up),
                (3, HealthVerdict::Down),
                (4, HealthVerdict::Down),
                (5, HealthVerdict::Up),
            ]
        );
        assert_eq!(results[0].id, "first");
        assert_eq!(results[1].domain, "down-1.example.com");
        // The malformed body never reaches the transport.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let transport = Arc::new(HostTransport::default());
        let checker = checker(transport.clone());

        run_cycle(&checker, &endpoints(), 2).await;
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        assert!(transport.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let transport = Arc::new(HostTransport::default());
        let checker = checker(transport.clone());

        let results = run_cycle(&checker, &endpoints(), 0).await;
        assert_eq!(results.len(), 6);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_once_accumulates() {
        let transport = Arc::new(HostTransport::default());
        let mut monitor = Monitor::new(checker(transport), endpoints(), Duration::from_secs(15), 4);

        monitor.run_once().await;
        monitor.run_once().await;

        let tracker = monitor.tracker();
        assert_eq!(
            tracker.tally("up-1.example.com"),
            Some(DomainTally { up: 4, total: 4 })
        );
        assert_eq!(tracker.availability("down-1.example.com"), Some(0));
        assert_eq!(tracker.availability("badjson.example.com"), Some(0));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let transport = Arc::new(HostTransport::default());
        let monitor = Monitor::new(checker(transport), endpoints(), Duration::from_secs(60), 6);

        let mut cycles = 0;
        let tracker = monitor
            .run(tokio::time::sleep(Duration::from_millis(300)), |results, _| {
                assert_eq!(results.len(), 6);
                cycles += 1;
            })
            .await;

        assert_eq!(cycles, 1);
        assert_eq!(tracker.availability("up-2.example.com"), Some(100));
        assert_eq!(tracker.availability("down-2.example.com"), Some(0));
    }
}
