use axum::{
    extract::{RawQuery, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::ReturnScreen;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonRequest {
    /// The `orderId` of the redirect being left, when it had one.
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonResponse {
    pub redirect_to: String,
}

/// Landing point of the gateway redirect. Always answers 200: the outcome,
/// including `error`, is part of the screen. Retrying is re-issuing the same
/// request.
pub async fn payment_return(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<ReturnScreen> {
    let screen = state
        .reconciliation
        .handle_return(query.as_deref().unwrap_or_default())
        .await;

    Json(screen)
}

pub async fn abandon_return(
    State(state): State<AppState>,
    Json(request): Json<AbandonRequest>,
) -> Json<AbandonResponse> {
    Json(AbandonResponse {
        redirect_to: state.reconciliation.abandon(request.order_id.as_deref()),
    })
}
