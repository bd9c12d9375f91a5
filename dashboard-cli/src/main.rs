//! ingress-dashboard CLI
//!
//! Serves the dashboard API and runs one-shot diagnostics for the enrichment
//! steps.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dashboard_api::{ApiConfig, ApiServer, DashboardState};
use dashboard_core::constants::{
    DEFAULT_NETWORK_TIMEOUT_SECS, EXPIRY_WARNING_DAYS, HTTPS_PORT, TLS_SCAN_INTERVAL,
};
use dashboard_core::traits::ClusterQuery;
use dashboard_icons::{IconConfig, IconFinder};
use dashboard_store::{load_definitions, RecordStore};
use dashboard_tls::{CertificateProber, ProberConfig};
use dashboard_watch::{Engine, EngineConfig, EventSource};

/// ingress-dashboard - live dashboard of cluster ingresses
#[derive(Parser)]
#[command(name = "ingress-dashboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "DASHBOARD_LOG_JSON")]
    log_json: bool,

    /// Timeout for outbound HTTP requests and TLS dials, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_NETWORK_TIMEOUT_SECS, env = "DASHBOARD_TIMEOUT")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch ingresses and serve the dashboard API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "DASHBOARD_PORT")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0", env = "DASHBOARD_BIND")]
        bind: String,
        /// Directory of static definitions (*.json)
        #[arg(short, long, env = "DASHBOARD_DEFINITIONS")]
        definitions: Option<PathBuf>,
        /// Periodic certificate scan interval, in seconds
        #[arg(long, default_value_t = TLS_SCAN_INTERVAL.as_secs(), env = "DASHBOARD_TLS_INTERVAL")]
        tls_interval: u64,
        /// Allow cross-origin requests from anywhere
        #[arg(long, env = "DASHBOARD_CORS")]
        cors: bool,
    },

    /// Print the certificate expiry of a host
    Probe {
        /// Host name
        host: String,
        /// Port to dial
        #[arg(short, long, default_value_t = HTTPS_PORT)]
        port: u16,
    },

    /// Discover the icon of a page
    Icon {
        /// Page URL
        url: String,
    },

    /// Load and print static definitions
    Definitions {
        /// Directory of *.json definitions
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ingress_dashboard=debug,dashboard=debug,info"
    } else {
        "ingress_dashboard=info,dashboard=info,warn"
    };

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()));
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let timeout = Duration::from_secs(cli.timeout);

    match cli.command {
        Commands::Serve {
            port,
            bind,
            definitions,
            tls_interval,
            cors,
        } => {
            let addr: SocketAddr = format!("{}:{}", bind, port)
                .parse()
                .context("Invalid bind address")?;
            cmd_serve(addr, definitions.as_deref(), Duration::from_secs(tls_interval), timeout, cors).await
        }
        Commands::Probe { host, port } => cmd_probe(&host, port, timeout).await,
        Commands::Icon { url } => cmd_icon(&url, timeout).await,
        Commands::Definitions { dir } => cmd_definitions(&dir).await,
    }
}

/// Run the engine and the API server
async fn cmd_serve(
    addr: SocketAddr,
    definitions: Option<&Path>,
    tls_interval: Duration,
    timeout: Duration,
    cors: bool,
) -> Result<()> {
    println!("{}", "🚀 Starting ingress-dashboard...".cyan().bold());

    let store = Arc::new(RecordStore::new());
    if let Some(dir) = definitions {
        let statics = load_definitions(dir)
            .await
            .with_context(|| format!("Failed to load definitions from {}", dir.display()))?;
        println!("   {} {}", "Static entries:".green(), statics.len());
        store.prepend(statics);
    }

    let dashboard = Arc::new(DashboardState::new());
    let icons = IconFinder::with_config(IconConfig::default().with_timeout(timeout))?;
    let prober = CertificateProber::with_config(ProberConfig::default().with_timeout(timeout))?;
    let (source, cluster) = event_source().await?;

    let engine = Engine::new(store, dashboard.clone(), cluster, Arc::new(icons), Arc::new(prober))
        .with_config(EngineConfig::default().with_tls_interval(tls_interval));

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        ctrl_c.cancel();
    });

    let server = ApiServer::new(ApiConfig::default().with_addr(addr).with_any_origin(cors), dashboard);
    let server_task = tokio::spawn(server.run_until(shutdown.clone().cancelled_owned()));

    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    let result = engine.run(source, shutdown.clone()).await;
    shutdown.cancel();

    server_task
        .await
        .context("API server task failed")?
        .context("API server error")?;
    result.context("Engine stopped with an error")?;

    println!("{}", "👋 Stopped".dimmed());
    Ok(())
}

#[cfg(feature = "kube")]
async fn event_source() -> Result<(Box<dyn EventSource>, Arc<dyn ClusterQuery>)> {
    use dashboard_watch::kubernetes::{connect, KubeClusterQuery, KubeEventSource};

    let client = connect().await.context("Failed to connect to Kubernetes")?;
    Ok((
        Box::new(KubeEventSource::new(client.clone())),
        Arc::new(KubeClusterQuery::new(client)),
    ))
}

#[cfg(not(feature = "kube"))]
async fn event_source() -> Result<(Box<dyn EventSource>, Arc<dyn ClusterQuery>)> {
    tracing::warn!("Built without Kubernetes support; serving static definitions only");
    Ok((Box::new(dashboard_watch::IdleEventSource), Arc::new(NoCluster)))
}

/// Cluster lookups for builds without a cluster.
#[cfg(not(feature = "kube"))]
struct NoCluster;

#[cfg(not(feature = "kube"))]
#[async_trait::async_trait]
impl ClusterQuery for NoCluster {
    async fn endpoint_count(
        &self,
        _namespace: &str,
        _backend: &dashboard_core::types::ServiceBackend,
    ) -> dashboard_core::Result<usize> {
        Ok(0)
    }
}

/// Probe a host certificate
async fn cmd_probe(host: &str, port: u16, timeout: Duration) -> Result<()> {
    println!("{} {}:{}", "🔒 Probing:".cyan().bold(), host, port);

    let prober = CertificateProber::with_config(ProberConfig::default().with_port(port).with_timeout(timeout))?;
    let info = prober.probe(host).await.context("Failed to probe certificate")?;

    match info.expires_at {
        Some(at) => {
            let days = (at - Utc::now()).num_days();
            let line = format!("{} ({} days)", at.to_rfc3339(), days);
            let line = if days < EXPIRY_WARNING_DAYS { line.red().bold() } else { line.green() };
            println!("   {} {}", "Expires:".dimmed(), line);
        }
        None => println!("   {}", "No certificate presented".yellow()),
    }
    println!("   {} {}", "Chain length:".dimmed(), info.chain_len);
    if let Some(issuer) = &info.issuer {
        println!("   {} {}", "Issuer:".dimmed(), issuer);
    }
    if !info.dns_names.is_empty() {
        println!("   {} {}", "Names:".dimmed(), info.dns_names.join(", "));
    }

    Ok(())
}

/// Discover a page icon
async fn cmd_icon(url: &str, timeout: Duration) -> Result<()> {
    println!("{} {}", "🔍 Looking for icon:".cyan().bold(), url);

    let finder = IconFinder::with_config(IconConfig::default().with_timeout(timeout))?;
    match finder.discover(url).await {
        Some(icon) => println!("   {} {}", "✅ Found:".green(), icon),
        None => println!("   {}", "❌ No icon found".red()),
    }

    Ok(())
}

/// Print static definitions
async fn cmd_definitions(dir: &Path) -> Result<()> {
    let records = load_definitions(dir)
        .await
        .with_context(|| format!("Failed to load definitions from {}", dir.display()))?;

    println!("{} {}", "📄 Static entries:".cyan().bold(), records.len());
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}
