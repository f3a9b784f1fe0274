use std::net::SocketAddr;
use std::sync::Arc;

use gate_trek_backend::build_app;
use gate_trek_backend::cache::RedisCache;
use gate_trek_backend::config::Config;
use gate_trek_backend::db::DatabaseProxy;
use gate_trek_backend::logging::init_tracing;
use gate_trek_backend::state::AppState;
use gate_trek_backend::workers::WorkerManager;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_tracing(&config.log_level);
    if config.uses_dev_jwt_secret() {
        tracing::warn!("JWT_SECRET not set, using development secret");
    }

    let db_proxy = match DatabaseProxy::connect(&config.database).await {
        Ok(proxy) => Arc::new(proxy),
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };
    tracing::info!("database connected");

    let cache = match config.redis_url.as_deref() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("redis cache connected");
                Some(Arc::new(cache))
            }
            Err(err) => {
                tracing::warn!(error = %err, "redis unavailable, continuing without cache");
                None
            }
        },
        None => None,
    };

    let config = Arc::new(config);
    let state = AppState::new(Arc::clone(&config), Arc::clone(&db_proxy), cache);
    if !state.llm().is_available() {
        tracing::warn!("LLM_API_KEY not set, AI mentor disabled");
    }

    let worker_manager = match WorkerManager::new(Arc::clone(&db_proxy), config.workers.clone()).await {
        Ok(manager) => {
            if let Err(e) = manager.start().await {
                tracing::error!(error = %e, "failed to start workers");
            }
            Some(manager)
        }
        Err(e) => {
            tracing::warn!(error = %e, "worker manager not initialized");
            None
        }
    };

    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "gate-trek backend listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }
    db_proxy.close().await;

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
