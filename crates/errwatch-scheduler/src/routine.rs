//! The check routine — one invocation of one check kind.
//!
//! Iterates the configured cluster addresses sequentially (a deliberate
//! simplification), probing each and notifying on failure
//! classifications. A transport error isolates to the host it hit; only
//! the invocation deadline or a shutdown signal aborts the whole routine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use errwatch_core::{CheckDefinition, Classification, HeaderSet};
use errwatch_notify::{NotificationMessage, Notifier, OutboundMessage};
use errwatch_probe::Prober;

use crate::error::CheckError;

/// Everything a check invocation needs, constructed once at startup and
/// shared read-only by all concurrent invocations.
pub struct CheckRunner {
    prober: Prober,
    notifier: Arc<dyn Notifier>,
    /// Base URL prefix, e.g. `https://`.
    host: String,
    /// Cluster address segments, probed in list order.
    clusters: Vec<String>,
    headers: HeaderSet,
    mention: String,
    probe_timeout: Duration,
}

impl CheckRunner {
    pub fn new(
        prober: Prober,
        notifier: Arc<dyn Notifier>,
        host: String,
        clusters: Vec<String>,
        headers: HeaderSet,
        mention: String,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            prober,
            notifier,
            host,
            clusters,
            headers,
            mention,
            probe_timeout,
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Run one invocation of `check` against every configured cluster.
    ///
    /// Aborts with [`CheckError::DeadlineExceeded`] once `deadline` has
    /// passed and with [`CheckError::Cancelled`] once shutdown is
    /// signalled; either way remaining hosts are skipped. A notifier
    /// error is recorded and returned after the loop completes (last
    /// error wins), it does not stop iteration.
    pub async fn run_check(
        &self,
        check: &CheckDefinition,
        deadline: Instant,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<(), CheckError> {
        let mut result = Ok(());

        for cluster in &self.clusters {
            if *shutdown.borrow() {
                return Err(CheckError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(CheckError::DeadlineExceeded);
            }
            // The request may not outlive the invocation deadline.
            let timeout = self.probe_timeout.min(deadline - now);

            let url = format!("{}{}{}", self.host, cluster, check.path);
            let outcome = match self
                .prober
                .probe(check.method, &url, &self.headers, check.body, timeout)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(CheckError::DeadlineExceeded);
                    }
                    // One bad host must not block checks on the others.
                    warn!(check = check.name, %cluster, error = %e, "probe transport error");
                    continue;
                }
            };

            match check.rule.classify(outcome.status) {
                Classification::Success => {
                    info!(ok = true, check = check.name, %cluster, status = outcome.status, "check succeeded");
                }
                Classification::Failure => {
                    warn!(ok = false, check = check.name, %cluster, status = outcome.status, "check failed");
                    let alert = OutboundMessage::Alert(NotificationMessage::from_outcome(
                        &self.mention,
                        check.path,
                        cluster,
                        &outcome,
                    ));
                    if let Err(e) = self.notifier.notify(&alert).await {
                        error!(check = check.name, %cluster, error = %e, "failed to deliver notification");
                        result = Err(CheckError::Notify(e));
                    }
                }
                Classification::Neutral => {
                    info!(check = check.name, %cluster, status = outcome.status, "unclassified status");
                }
            }
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::routing::post;
    use axum::Router;

    use errwatch_core::{HttpConfig, TABLE_LIST};
    use errwatch_notify::NotifyError;

    /// Test notifier that records messages and can delay or fail.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<OutboundMessage>>,
        pub delay: Option<Duration>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn alerts(&self) -> Vec<NotificationMessage> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| match m {
                    OutboundMessage::Alert(a) => Some(a.clone()),
                    OutboundMessage::Text(_) => None,
                })
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(NotifyError::Delivery("injected failure".to_string()));
            }
            Ok(())
        }
    }

    /// Serve the tableList path with a fixed status, counting hits.
    pub(crate) async fn serve_status(
        status: u16,
        body: &'static str,
        delay: Duration,
    ) -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/viewer/viewer/tableListv6",
                post(
                    move |State(hits): State<Arc<AtomicUsize>>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(delay).await;
                        (
                            axum::http::StatusCode::from_u16(status).unwrap(),
                            body,
                        )
                    },
                ),
            )
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, hits)
    }

    pub(crate) fn unbound_addr() -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    pub(crate) fn runner_for(
        clusters: Vec<String>,
        notifier: Arc<dyn Notifier>,
        probe_timeout: Duration,
    ) -> CheckRunner {
        CheckRunner::new(
            Prober::new(&HttpConfig::default()).unwrap(),
            notifier,
            "http://".to_string(),
            clusters,
            HeaderSet::new("51523448", "session=test"),
            "@oncall".to_string(),
            probe_timeout,
        )
    }

    fn no_shutdown() -> watch::Receiver<bool> {
        // The value stays readable after the sender drops.
        let (_tx, rx) = watch::channel(false);
        rx
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn failure_status_sends_one_notification_per_host() {
        let (addr_a, _) = serve_status(503, "down", Duration::ZERO).await;
        let (addr_b, _) = serve_status(503, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr_a}/"), format!("{addr_b}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await
            .unwrap();

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].cluster, addr_a.to_string());
        assert_eq!(alerts[1].cluster, addr_b.to_string());
        for alert in alerts {
            assert_eq!(alert.status, 503);
            assert_eq!(alert.endpoint, "viewer/viewer/tableListv6");
            assert_eq!(alert.body, "`down`");
        }
    }

    #[tokio::test]
    async fn success_sends_no_notification() {
        let (addr, _) = serve_status(200, "ok", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await
            .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn neutral_status_is_logged_only() {
        let (addr, _) = serve_status(404, "not found", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let result = runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await;

        assert!(result.is_ok());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_cluster_and_one_healthy() {
        // The end-to-end example: first cluster 503, second 200 →
        // exactly one alert, for the first cluster.
        let (addr_a, _) = serve_status(503, "sad", Duration::ZERO).await;
        let (addr_b, _) = serve_status(200, "fine", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr_a}/"), format!("{addr_b}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await
            .unwrap();

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].cluster, addr_a.to_string());
        assert_eq!(alerts[0].endpoint, "viewer/viewer/tableListv6");
    }

    #[tokio::test]
    async fn dead_host_does_not_block_the_rest() {
        let dead = unbound_addr();
        let (live, live_hits) = serve_status(503, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{dead}/"), format!("{live}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let result = runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await;

        // The dead host is isolated; the live host was still checked.
        assert!(result.is_ok());
        assert_eq!(live_hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn per_host_timeouts_attempt_every_host() {
        let (addr_a, hits_a) = serve_status(200, "late", Duration::from_secs(5)).await;
        let (addr_b, hits_b) = serve_status(200, "late", Duration::from_secs(5)).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr_a}/"), format!("{addr_b}/")],
            notifier.clone(),
            Duration::from_millis(100),
        );

        let result = runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await;

        // Individual timeouts are isolated errors, not routine errors.
        assert!(result.is_ok());
        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_deadline_skips_all_hosts() {
        let (addr, hits) = serve_status(503, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr}/"), format!("{addr}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let result = runner
            .run_check(&TABLE_LIST, Instant::now(), &no_shutdown())
            .await;

        assert!(matches!(result, Err(CheckError::DeadlineExceeded)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deadline_expiring_mid_probe_skips_remaining_hosts() {
        let (slow, slow_hits) = serve_status(503, "late", Duration::from_secs(5)).await;
        let (next, next_hits) = serve_status(503, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{slow}/"), format!("{next}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let result = runner
            .run_check(
                &TABLE_LIST,
                Instant::now() + Duration::from_millis(150),
                &no_shutdown(),
            )
            .await;

        assert!(matches!(result, Err(CheckError::DeadlineExceeded)));
        assert_eq!(slow_hits.load(Ordering::SeqCst), 1);
        assert_eq!(next_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn notify_error_is_returned_but_iteration_continues() {
        let (addr_a, hits_a) = serve_status(500, "down", Duration::ZERO).await;
        let (addr_b, hits_b) = serve_status(500, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let runner = runner_for(
            vec![format!("{addr_a}/"), format!("{addr_b}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let result = runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await;

        assert!(matches!(result, Err(CheckError::Notify(_))));
        // Both hosts were probed despite the first delivery failure.
        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_signal_cancels_remaining_hosts() {
        let (addr, hits) = serve_status(503, "down", Duration::ZERO).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(
            vec![format!("{addr}/")],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let (tx, rx) = watch::channel(true);
        let result = runner.run_check(&TABLE_LIST, far_deadline(), &rx).await;
        drop(tx);

        assert!(matches!(result, Err(CheckError::Cancelled)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_cluster_list_is_a_no_op() {
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = runner_for(vec![], notifier.clone(), Duration::from_secs(5));

        runner
            .run_check(&TABLE_LIST, far_deadline(), &no_shutdown())
            .await
            .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
