mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use kubemeta_k8s::KubeClient;
use kubemeta_server::{AppState, NamespaceResolver, router};
use kubemeta_types::ImageSource;

use crate::config::ConfigLayer;

/// Kubemeta - read-only HTTP facade over Kubernetes workload and pod metadata
#[derive(Parser, Debug)]
#[command(name = "kubemeta")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with default settings
    #[arg(long, env = "KUBEMETA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long, env = "KUBEMETA_HOST")]
    host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(long, env = "KUBEMETA_PORT")]
    port: Option<u16>,

    /// Pin request domains to namespaces, e.g. `a.example.com:develop,b.example.com:staging`
    #[arg(long, env = "STRICT_NAMESPACE_MAPPING")]
    strict_namespace_mapping: Option<String>,

    /// Where workload images are read from: `annotation` or `container` [default: annotation]
    #[arg(long, env = "IMAGE_SOURCE")]
    image_source: Option<ImageSource>,

    /// Kubeconfig context (in-cluster or default context when omitted)
    #[arg(long, env = "KUBEMETA_CONTEXT")]
    context: Option<String>,
}

impl Args {
    fn into_layer(self) -> (Option<PathBuf>, ConfigLayer) {
        let layer = ConfigLayer {
            host: self.host,
            port: self.port,
            strict_namespace_mapping: self.strict_namespace_mapping,
            image_source: self.image_source,
            context: self.context,
        };
        (self.config, layer)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let (config_path, cli) = args.into_layer();
    let file = match config_path {
        Some(path) => ConfigLayer::from_file(&path)?,
        None => ConfigLayer::default(),
    };
    let settings = cli.or(file).finish();

    let resolver =
        NamespaceResolver::from_mapping_value(settings.strict_namespace_mapping.as_deref())
            .context("Invalid STRICT_NAMESPACE_MAPPING")?;

    let client = KubeClient::new(settings.context.as_deref()).await?;

    let state = AppState::new(Arc::new(client), resolver, settings.image_source);
    match state.resolver.mapping().filter(|m| !m.is_empty()) {
        Some(mapping) => info!(domains = mapping.len(), "Strict namespace mapping enabled"),
        None => info!("No strict namespace mapping, filtering by query parameter only"),
    }
    let app = router(state);

    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!(
        addr = %addr,
        image_source = %settings.image_source,
        "Metadata server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Metadata server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM (sent by the kubelet on pod deletion)
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
