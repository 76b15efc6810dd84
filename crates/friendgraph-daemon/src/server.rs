use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use friendgraph_config::{get_pid_path, remove_pid, write_pid, Config};
use friendgraph_store::UserGraphStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::handlers::{
    handle_create_user, handle_delete_user, handle_get_user, handle_list_friends,
    handle_make_friends, handle_stats, handle_update_age, ApiError, HandlerContext,
};

pub struct DaemonServer {
    config: Config,
    store: Arc<UserGraphStore>,
}

impl DaemonServer {
    pub fn new(config: Config, store: UserGraphStore) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let pid_path = get_pid_path();

        let listener = TcpListener::bind(&self.config.daemon.listen_addr).await?;
        write_pid(&pid_path, std::process::id())?;

        info!("Daemon started, listening on {}", listener.local_addr()?);

        let app = router(
            HandlerContext::new(Arc::clone(&self.store)),
            self.config.daemon.request_timeout(),
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.shutdown();
        result?;
        Ok(())
    }

    fn shutdown(&self) {
        let stats = self.store.stats();
        info!(
            "Shutting down daemon, discarding {} users and {} friendships",
            stats.users, stats.friendships
        );
        remove_pid(&get_pid_path());
        fastrace::flush();
    }
}

pub fn router(ctx: HandlerContext, request_timeout: Duration) -> Router {
    Router::new()
        .route("/create", post(handle_create_user))
        .route("/make_friends", post(handle_make_friends))
        .route("/user", delete(handle_delete_user))
        .route("/user/:user_id", get(handle_get_user).put(handle_update_age))
        .route("/friends/:user_id", get(handle_list_friends))
        .route("/stats", get(handle_stats))
        .layer(middleware::from_fn_with_state(request_timeout, enforce_timeout))
        .with_state(ctx)
}

async fn enforce_timeout(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let uri = request.uri().clone();
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("{} did not complete within {:?}", uri, timeout);
            ApiError::Timeout.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
