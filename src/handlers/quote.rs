use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::Quote;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: u32,
}

fn default_guests() -> u32 {
    1
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<Quote>, AppError> {
    let quote = state
        .checkout
        .quote_stay(&property_id, params.check_in, params.check_out, params.guests)
        .await?;

    Ok(Json(quote))
}
