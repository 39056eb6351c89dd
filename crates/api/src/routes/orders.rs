//! Order processing endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use broker::MessageBroker;
use common::OrderRequest;
use saga::{OrderConfirmation, SagaOutcome};

use crate::AppState;
use crate::error::ApiError;

/// POST /api/process-order — runs the order saga and reports how it ended.
pub async fn process<B>(
    State(state): State<Arc<AppState<B>>>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<OrderConfirmation>, ApiError>
where
    B: MessageBroker + Clone + 'static,
{
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected order payload");
        ApiError::BadRequest(rejection.body_text())
    })?;

    match state.coordinator.execute(request).await? {
        SagaOutcome::Completed(confirmation) => Ok(Json(confirmation)),
        SagaOutcome::StockUnavailable(rejection) => Err(ApiError::StockUnavailable(rejection)),
    }
}
