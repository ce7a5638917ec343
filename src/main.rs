mod approval;
mod classify;
mod clients;
mod config;
mod error;
mod filter;
mod helpers;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use approval::ApprovalApi;
use clients::store::SummaryStore;
use clients::BackendClient;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SummaryStore>,
    pub approvals: Arc<dyn ApprovalApi>,
    pub config: Arc<config::Config>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kluctl_console=info")),
        )
        .init();

    let config_path = std::env::args()
        .skip(1)
        .zip(std::env::args().skip(2))
        .find_map(|(k, v)| {
            if k == "-config" || k == "--config" {
                Some(v)
            } else {
                None
            }
        })
        .or_else(|| std::env::args().nth(1).filter(|a| !a.starts_with('-')))
        .unwrap_or_else(|| "/etc/kluctl-console/config.yaml".to_string());

    let cfg = config::Config::load(&PathBuf::from(&config_path)).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });

    let backend = BackendClient::new(cfg.backend.base_url.clone(), cfg.request_timeout())
        .unwrap_or_else(|e| {
            eprintln!("error creating backend client: {}", e);
            std::process::exit(1);
        });

    if let Err(e) = backend.ping().await {
        tracing::warn!("backend {} not reachable yet: {}", backend.base_url, e);
    }

    let store = Arc::new(SummaryStore::new());
    let cfg = Arc::new(cfg);

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    // Start refresher
    let store_clone = store.clone();
    let refresh_client = backend.clone();
    let every = cfg.refresh_interval();
    tokio::spawn(async move {
        store_clone
            .run_refresher(refresh_client, every, shutdown_rx)
            .await;
    });

    let state = AppState {
        store,
        approvals: Arc::new(backend),
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!("kluctl-console listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
