use super::{ApiQuery, CampaignView};
use crate::auth::AuthUser;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::CampaignStatus;
use crate::state::AppState;
use crate::stats::{monthly_buckets, MonthlyPoint, Totals};
use axum::extract::State;
use serde::{Deserialize, Serialize};

const DEFAULT_AD_SET_LIMIT: usize = 5;
const MAX_AD_SET_LIMIT: usize = 50;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_spend: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_results: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roi: f64,
    pub active_campaigns: usize,
    pub total_campaigns: usize,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub months: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AdSetQuery {
    pub limit: Option<usize>,
}

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<SummaryResponse>, AppError> {
    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let campaigns = data.owned_campaigns(&user.user_id);

    let totals: Totals = campaigns
        .iter()
        .map(|campaign| data.display_totals(campaign, &settings))
        .collect();
    let metrics = totals.metrics(state.revenue_per_result());

    Ok(ApiResponse::ok(SummaryResponse {
        total_spend: metrics.spend,
        total_impressions: metrics.impressions,
        total_clicks: metrics.clicks,
        total_results: metrics.results,
        ctr: metrics.ctr,
        cpc: metrics.cpc,
        cpm: metrics.cpm,
        roi: metrics.roi,
        active_campaigns: campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .count(),
        total_campaigns: campaigns.len(),
        currency: settings.currency,
    }))
}

pub async fn chart_data(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ChartQuery>,
) -> Result<ApiResponse<Vec<MonthlyPoint>>, AppError> {
    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let rows = data.display_metrics(&data.metrics_for_user(&user.user_id), &settings);
    let refs: Vec<_> = rows.iter().collect();

    let mut buckets = monthly_buckets(&refs, state.revenue_per_result());
    if let Some(months) = query.months {
        let skip = buckets.len().saturating_sub(months);
        buckets.drain(..skip);
    }
    Ok(ApiResponse::ok(buckets))
}

/// The caller's campaigns ranked by spend.
pub async fn ad_sets(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<AdSetQuery>,
) -> Result<ApiResponse<Vec<CampaignView>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_AD_SET_LIMIT).clamp(1, MAX_AD_SET_LIMIT);

    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let mut campaigns: Vec<_> = data
        .owned_campaigns(&user.user_id)
        .into_iter()
        .map(|campaign| (data.display_totals(campaign, &settings).spend, campaign))
        .collect();
    campaigns.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    let views = campaigns
        .into_iter()
        .take(limit)
        .map(|(_, campaign)| CampaignView::build(&data, campaign, &settings, state.revenue_per_result()))
        .collect();
    Ok(ApiResponse::ok(views))
}
