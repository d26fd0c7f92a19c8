//! Control HTTP server: health, readiness and the manual check trigger.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::pipeline::TickReport;
use super::scheduler::PollScheduler;
use crate::domain::Category;
use crate::error::{GameWatchError, Result};

#[derive(Debug, Deserialize)]
struct ForceCheckParams {
    game: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForceCheckResponse {
    categories: usize,
    notifications_sent: usize,
    reports: Vec<TickReport>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Build the control router over a shared scheduler
pub fn router(scheduler: Arc<PollScheduler>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/forcecheck", post(force_check_handler))
        .with_state(scheduler)
}

pub struct ControlServer {
    scheduler: Arc<PollScheduler>,
    port: u16,
}

impl ControlServer {
    pub fn new(scheduler: Arc<PollScheduler>, port: u16) -> Self {
        Self { scheduler, port }
    }

    /// Serve until the shutdown flag flips
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let app = router(Arc::clone(&self.scheduler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting control server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await
            .map_err(|e| GameWatchError::Internal(format!("Control server error: {}", e)))?;

        info!("Control server stopped");
        Ok(())
    }
}

async fn health_handler(State(scheduler): State<Arc<PollScheduler>>) -> impl IntoResponse {
    let snapshot = scheduler.snapshot().await;
    let status = if snapshot.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot))
}

async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readiness_handler(State(scheduler): State<Arc<PollScheduler>>) -> impl IntoResponse {
    if scheduler.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn force_check_handler(
    State(scheduler): State<Arc<PollScheduler>>,
    Query(params): Query<ForceCheckParams>,
) -> axum::response::Response {
    let filter = match params.game.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
    };

    info!(
        "Manual check requested for {}",
        filter.map_or("all categories".to_string(), |c| c.to_string())
    );

    match scheduler.trigger(filter).await {
        Ok(reports) => {
            let notifications_sent = reports.iter().map(|r| r.sent).sum();
            Json(ForceCheckResponse {
                categories: reports.len(),
                notifications_sent,
                reports,
            })
            .into_response()
        }
        Err(GameWatchError::NotReady) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "chat platform is not ready yet",
        ),
        Err(e) => {
            warn!("Manual check failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
