//! Task group wiring the event source and both enrichment loops.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use dashboard_core::constants::TLS_SCAN_INTERVAL;
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::{CertificateSource, ClusterQuery, IconSource, Receiver, ResourceEventHandler};
use dashboard_store::RecordStore;

use crate::adapter::WatchAdapter;
use crate::logo::LogoLoop;
use crate::notifier::Notifier;
use crate::source::EventSource;
use crate::tls::TlsLoop;
use crate::trigger::trigger;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Periodic certificate scan interval
    pub tls_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tls_interval: TLS_SCAN_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Sets the periodic certificate scan interval.
    pub fn with_tls_interval(mut self, interval: Duration) -> Self {
        self.tls_interval = interval;
        self
    }
}

/// The watch-cache-enrich-notify engine.
pub struct Engine {
    config: EngineConfig,
    store: Arc<RecordStore>,
    receiver: Arc<dyn Receiver>,
    cluster: Arc<dyn ClusterQuery>,
    icons: Arc<dyn IconSource>,
    certificates: Arc<dyn CertificateSource>,
}

impl Engine {
    /// Creates an engine with default configuration.
    pub fn new(
        store: Arc<RecordStore>,
        receiver: Arc<dyn Receiver>,
        cluster: Arc<dyn ClusterQuery>,
        icons: Arc<dyn IconSource>,
        certificates: Arc<dyn CertificateSource>,
    ) -> Self {
        Self {
            config: EngineConfig::default(),
            store,
            receiver,
            cluster,
            icons,
            certificates,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The store the engine writes to.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Runs the event source, the logo loop and the TLS loop until one of
    /// them exits or `shutdown` fires.
    ///
    /// The first exit cancels the other two. Returns the first error any
    /// member reported.
    #[instrument(skip_all, fields(source = %source.name()))]
    pub async fn run(self, source: Box<dyn EventSource>, shutdown: CancellationToken) -> Result<()> {
        let group = shutdown.child_token();

        let (logo_tx, logo_rx) = trigger();
        let (tls_tx, tls_rx) = trigger();
        let notifier = Arc::new(Notifier::new(self.store.clone(), self.receiver.clone(), logo_tx, tls_tx));

        let adapter: Arc<dyn ResourceEventHandler> =
            Arc::new(WatchAdapter::new(notifier.clone(), self.cluster.clone()));
        let logo = LogoLoop::new(notifier.clone(), self.icons.clone(), logo_rx);
        let tls = TlsLoop::new(notifier.clone(), self.certificates.clone(), tls_rx)
            .with_period(self.config.tls_interval);

        notifier.publish();
        let stats = self.store.stats();
        info!(live = stats.live_entries, statics = stats.static_entries, "Engine starting");

        let mut tasks = JoinSet::new();
        spawn_member(&mut tasks, &group, "source", source.run(adapter, group.clone()));
        spawn_member(&mut tasks, &group, "logo", logo.run(group.clone()));
        spawn_member(&mut tasks, &group, "tls", tls.run(group.clone()));

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            // A panicking member never reaches its own cancel.
            group.cancel();
            let outcome = joined
                .map_err(|e| DashboardError::InternalError(format!("engine task aborted: {}", e)))
                .and_then(|result| result);
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        let stats = self.store.stats();
        info!(
            live = stats.live_entries,
            with_logo = stats.with_logo,
            with_tls_expiration = stats.with_tls_expiration,
            "Engine stopped"
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn spawn_member<F>(tasks: &mut JoinSet<Result<()>>, group: &CancellationToken, name: &'static str, task: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let group = group.clone();
    tasks.spawn(async move {
        let result = task.await;
        match &result {
            Ok(()) => info!(task = name, "Engine task exited"),
            Err(e) => error!(task = name, error = %e, "Engine task failed"),
        }
        group.cancel();
        result
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use dashboard_core::constants::ANNO_TITLE;
    use dashboard_core::types::{IngressResource, Record, Reference, ServiceBackend, WatchEvent, WatchObject};
    use parking_lot::Mutex;

    use crate::source::{ChannelEventSource, IdleEventSource};

    struct FakeCluster(HashMap<String, usize>);

    #[async_trait]
    impl ClusterQuery for FakeCluster {
        async fn endpoint_count(&self, namespace: &str, backend: &ServiceBackend) -> Result<usize> {
            self.0
                .get(&backend.name)
                .copied()
                .ok_or_else(|| DashboardError::ServiceNotFound {
                    namespace: namespace.into(),
                    name: backend.name.clone(),
                })
        }
    }

    struct FakeIcons;

    #[async_trait]
    impl IconSource for FakeIcons {
        async fn discover(&self, page_url: &str) -> Option<String> {
            page_url.contains("example.com").then(|| "/favicon.ico".to_string())
        }
    }

    struct FakeCertificates(HashMap<String, DateTime<Utc>>);

    #[async_trait]
    impl CertificateSource for FakeCertificates {
        async fn expiration(&self, host: &str) -> Result<Option<DateTime<Utc>>> {
            self.0.get(host).copied().map(Some).ok_or_else(|| DashboardError::TlsDialFailed {
                host: host.into(),
                reason: "refused".into(),
            })
        }
    }

    #[derive(Default)]
    struct Latest(Mutex<Option<Vec<Record>>>);

    impl Receiver for Latest {
        fn set(&self, records: Vec<Record>) {
            *self.0.lock() = Some(records);
        }
    }

    impl Latest {
        fn get(&self) -> Vec<Record> {
            self.0.lock().clone().unwrap_or_default()
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(self: Box<Self>, _handler: Arc<dyn ResourceEventHandler>, _shutdown: CancellationToken) -> Result<()> {
            Err(DashboardError::EventSourceError("watch forbidden".into()))
        }
    }

    fn engine(expiry: DateTime<Utc>) -> (Engine, Arc<Latest>) {
        let store = Arc::new(RecordStore::new());
        let latest = Arc::new(Latest::default());
        let cluster = FakeCluster(HashMap::from([("web".to_string(), 2)]));
        let certificates = FakeCertificates(HashMap::from([("example.com".to_string(), expiry)]));
        let engine = Engine::new(
            store,
            latest.clone(),
            Arc::new(cluster),
            Arc::new(FakeIcons),
            Arc::new(certificates),
        );
        (engine, latest)
    }

    async fn eventually<F: Fn() -> bool>(condition: F) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let expiry = Utc::now() + ChronoDuration::days(30);
        let (engine, latest) = engine(expiry);
        let store = engine.store().clone();
        let (events, source) = ChannelEventSource::new(16);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(engine.run(Box::new(source), shutdown.clone()));

        let plain = IngressResource::new("u1", "default", "app")
            .with_rule("example.com", &[("/", "web"), ("/api", "web")]);
        events.send(WatchEvent::Added(plain.clone().into())).await.unwrap();

        eventually(|| latest.get().len() == 1).await;
        let record = &latest.get()[0];
        assert_eq!(
            record.refs,
            vec![
                Reference::new("http://example.com/").with_pods(2),
                Reference::new("http://example.com/api").with_pods(2),
            ]
        );

        eventually(|| latest.get().first().map(|r| r.logo_url == "/favicon.ico").unwrap_or(false)).await;

        let secure = plain.clone().with_tls(&["example.com"]).with_annotation(ANNO_TITLE, "App");
        events
            .send(WatchEvent::Updated {
                old: plain.into(),
                new: secure.into(),
            })
            .await
            .unwrap();

        eventually(|| latest.get().first().and_then(|r| r.tls_expiration) == Some(expiry)).await;
        let record = store.get("u1").unwrap();
        assert_eq!(record.title, "App");
        assert_eq!(record.logo_url, "/favicon.ico", "logo survives the update");
        assert_eq!(record.refs[0].url, "https://example.com/");
        assert!(!record.expires_soon(Utc::now()));

        events
            .send(WatchEvent::Deleted(WatchObject::Other { kind: "Secret".into() }))
            .await
            .unwrap();
        events
            .send(WatchEvent::Deleted(IngressResource::new("u1", "default", "app").into()))
            .await
            .unwrap();
        eventually(|| latest.get().is_empty() && store.is_empty()).await;

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_statics_published_at_start() {
        let (engine, latest) = engine(Utc::now());
        let mut fixed = Record::new("", "external", "wiki");
        fixed.refs.push(Reference::fixed("https://wiki.example.com"));
        engine.store().prepend(vec![fixed]);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(engine.run(Box::new(IdleEventSource), shutdown.clone()));

        eventually(|| latest.get().len() == 1).await;
        assert!(latest.get()[0].is_static());
        assert_eq!(latest.get()[0].logo_url, "", "static entries are not enriched");

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_source_exit_stops_loops() {
        let (engine, _) = engine(Utc::now());
        let (events, source) = ChannelEventSource::new(1);
        drop(events);

        let shutdown = CancellationToken::new();
        tokio::time::timeout(Duration::from_secs(5), engine.run(Box::new(source), shutdown.clone()))
            .await
            .expect("engine stops when the source ends")
            .unwrap();
        assert!(!shutdown.is_cancelled(), "caller token is left alone");
    }

    #[tokio::test]
    async fn test_source_error_is_returned() {
        let (engine, _) = engine(Utc::now());
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            engine.run(Box::new(FailingSource), CancellationToken::new()),
        )
        .await
        .expect("engine stops when the source fails")
        .unwrap_err();
        assert!(matches!(err, DashboardError::EventSourceError(_)));
    }

    struct PanickingSource;

    #[async_trait]
    impl EventSource for PanickingSource {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn run(self: Box<Self>, _handler: Arc<dyn ResourceEventHandler>, _shutdown: CancellationToken) -> Result<()> {
            panic!("source bug");
        }
    }

    #[tokio::test]
    async fn test_source_panic_stops_loops() {
        let (engine, _) = engine(Utc::now());
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            engine.run(Box::new(PanickingSource), CancellationToken::new()),
        )
        .await
        .expect("engine stops when a member panics")
        .unwrap_err();
        assert!(matches!(err, DashboardError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_external_shutdown() {
        let (engine, _) = engine(Utc::now());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(engine.run(Box::new(IdleEventSource), shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("engine stops on shutdown")
            .unwrap()
            .unwrap();
    }
}
