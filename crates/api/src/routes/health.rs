//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use broker::MessageBroker;
use common::destinations::health_check_for;
use common::{HealthCheckRequest, HealthReport, HealthStatus};
use serde::Serialize;

use crate::AppState;
use crate::backend::MONITORED_SERVICES;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every worker is healthy, `degraded` otherwise.
    pub status: &'static str,
    pub services: Vec<HealthReport>,
}

/// GET /health — gateway status plus one report per back-end service.
///
/// A service that does not answer within the window is reported as
/// unreachable.
pub async fn check<B>(State(state): State<Arc<AppState<B>>>) -> Json<HealthResponse>
where
    B: MessageBroker + Clone + 'static,
{
    let destinations: Vec<String> = MONITORED_SERVICES
        .iter()
        .map(|service| health_check_for(service))
        .collect();
    let ping = HealthCheckRequest {
        requested_by: "gateway".to_string(),
    };

    let replies = match state
        .health
        .gather(&destinations, &ping, state.config.health_check_window)
        .await
    {
        Ok(replies) => replies,
        Err(e) => {
            tracing::warn!(error = %e, "health fan-out failed");
            Vec::new()
        }
    };

    let mut reports: Vec<HealthReport> = replies
        .iter()
        .filter_map(|reply| match reply.decode::<HealthReport>() {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "malformed health report ignored");
                None
            }
        })
        .collect();

    let services = MONITORED_SERVICES
        .iter()
        .map(|service| {
            reports
                .iter()
                .position(|r| r.service == *service)
                .map(|i| reports.swap_remove(i))
                .unwrap_or_else(|| HealthReport::unreachable(*service))
        })
        .collect::<Vec<_>>();

    let status = if services.iter().all(|r| r.status == HealthStatus::Healthy) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status, services })
}
