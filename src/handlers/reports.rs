use super::{ApiQuery, CampaignView};
use crate::auth::AuthUser;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::state::AppState;
use crate::stats::{round2, Metrics};
use axum::extract::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub campaign_id_a: Option<String>,
    pub campaign_id_b: Option<String>,
}

/// `b - a` for every metric.
#[derive(Debug, Serialize, PartialEq)]
pub struct MetricDelta {
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub results: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roi: f64,
}

impl MetricDelta {
    pub fn between(a: &Metrics, b: &Metrics) -> Self {
        let diff = |x: u64, y: u64| y as i64 - x as i64;
        Self {
            spend: round2(b.spend - a.spend),
            impressions: diff(a.impressions, b.impressions),
            clicks: diff(a.clicks, b.clicks),
            results: diff(a.results, b.results),
            ctr: round2(b.ctr - a.ctr),
            cpc: round2(b.cpc - a.cpc),
            cpm: round2(b.cpm - a.cpm),
            roi: round2(b.roi - a.roi),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub campaign_a: CampaignView,
    pub campaign_b: CampaignView,
    pub metrics_a: Metrics,
    pub metrics_b: Metrics,
    pub difference: MetricDelta,
}

pub async fn compare(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<CompareQuery>,
) -> Result<ApiResponse<CompareResponse>, AppError> {
    let (Some(id_a), Some(id_b)) = (
        query.campaign_id_a.filter(|id| !id.trim().is_empty()),
        query.campaign_id_b.filter(|id| !id.trim().is_empty()),
    ) else {
        return Err(AppError::bad_request("campaignIdA and campaignIdB are required"));
    };

    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let a = data.owned_campaign(&user.user_id, &id_a)?;
    let b = data.owned_campaign(&user.user_id, &id_b)?;

    let revenue = state.revenue_per_result();
    let metrics_a = data.display_totals(a, &settings).metrics(revenue);
    let metrics_b = data.display_totals(b, &settings).metrics(revenue);

    Ok(ApiResponse::ok(CompareResponse {
        campaign_a: CampaignView::build(&data, a, &settings, revenue),
        campaign_b: CampaignView::build(&data, b, &settings, revenue),
        difference: MetricDelta::between(&metrics_a, &metrics_b),
        metrics_a,
        metrics_b,
    }))
}
