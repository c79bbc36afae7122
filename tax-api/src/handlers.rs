use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use tax_core::calculations::{BracketListing, TaxCalculationReport};

use crate::app::AppState;
use crate::error::ApiResult;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Query string for the calculation endpoint. Both fields are optional at
/// this layer so that a missing income is reported by the validator rather
/// than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct CalculationParams {
    pub income: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BracketParams {
    pub currency: Option<String>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn tax_calculation(
    State(state): State<AppState>,
    Query(params): Query<CalculationParams>,
) -> ApiResult<Json<TaxCalculationReport>> {
    let report = state
        .calculator
        .calculate(params.income.as_deref(), params.currency.as_deref())
        .await?;

    Ok(Json(report))
}

pub async fn tax_brackets(
    State(state): State<AppState>,
    Query(params): Query<BracketParams>,
) -> ApiResult<Json<Vec<BracketListing>>> {
    let brackets = state
        .calculator
        .list_brackets(params.currency.as_deref())
        .await?;

    Ok(Json(brackets))
}
