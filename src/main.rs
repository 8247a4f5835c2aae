// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, net::SocketAddr, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flashdash_server::{
    api::router,
    bootstrap::{open_store, seed_admin},
    config::{Config, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env();
    init_tracing(config.as_ref().map(|c| c.log_format).unwrap_or_default());
    let config = config.inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;
    tracing::debug!(?config, "Configuration loaded");

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let store = open_store(&config)?;
    let state = AppState::from_config(&config, store)?;

    if let Some(seed) = &config.seed_admin {
        let store = state.store.clone();
        let seed = seed.clone();
        let settings = state.settings.clone();
        tokio::task::spawn_blocking(move || {
            seed_admin(store.as_ref(), &seed, &settings.frn_service, settings.password_cost)
        })
        .await??;
    }

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let addr: SocketAddr = config.bind_address().parse()?;

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "FlashDash server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app)
                .await?;
        }
        None => {
            tracing::warn!("TLS_CERT_PATH/TLS_KEY_PATH not set; serving plain HTTP");
            tracing::info!(%addr, "FlashDash server listening on http (docs at /docs)");
            axum_server::bind(addr).handle(handle).serve(app).await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
