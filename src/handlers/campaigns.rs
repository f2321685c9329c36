use super::{save, ApiJson, ApiQuery, CampaignView};
use crate::auth::AuthUser;
use crate::constants::FB_INSIGHT_FIELDS;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::handlers::facebook::GraphToken;
use crate::insights::normalize_row;
use crate::models::{BudgetType, CampaignStatus};
use crate::state::AppState;
use crate::stats::{ctr, progress, round2, Metrics, Totals};
use axum::body::Bytes;
use axum::extract::{Path, State};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const DEFAULT_CHART_DAYS: i64 = 30;
const MAX_CHART_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub account_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub objective: Option<String>,
    pub budget: Option<f64>,
    pub budget_type: Option<String>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub campaign_id: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: usize,
    pub metrics: Metrics,
    pub progress: u32,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub conversion: u64,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<ApiResponse<Vec<CampaignView>>, AppError> {
    let status = query
        .status
        .filter(|s| !s.trim().is_empty() && s != "all")
        .map(|s| s.parse::<CampaignStatus>())
        .transpose()
        .map_err(AppError::bad_request)?;
    let search = query.search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let views = data
        .owned_campaigns(&user.user_id)
        .into_iter()
        .filter(|c| status.is_none_or(|wanted| c.status == wanted))
        .filter(|c| query.account_id.as_ref().is_none_or(|id| &c.account_id == id))
        .filter(|c| {
            search
                .as_ref()
                .is_none_or(|needle| c.title.to_lowercase().contains(needle.as_str()))
        })
        .map(|campaign| CampaignView::build(&data, campaign, &settings, state.revenue_per_result()))
        .collect();
    Ok(ApiResponse::ok(views))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<CampaignView>, AppError> {
    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let campaign = data.owned_campaign(&user.user_id, &id)?;
    Ok(ApiResponse::ok(CampaignView::build(
        &data,
        campaign,
        &settings,
        state.revenue_per_result(),
    )))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateCampaignRequest>,
) -> Result<ApiResponse<CampaignView>, AppError> {
    let title = payload.title.map(|t| t.trim().to_string());
    if title.as_deref().is_some_and(str::is_empty) {
        return Err(AppError::bad_request("Title cannot be empty"));
    }
    if payload.budget.is_some_and(|b| !b.is_finite() || b < 0.0) {
        return Err(AppError::bad_request("Budget must be a non-negative number"));
    }
    let budget_type = payload
        .budget_type
        .map(|t| t.parse::<BudgetType>())
        .transpose()
        .map_err(AppError::bad_request)?;
    if title.is_none()
        && payload.objective.is_none()
        && payload.budget.is_none()
        && budget_type.is_none()
        && payload.end_date.is_none()
    {
        return Err(AppError::bad_request("No updatable fields provided"));
    }

    let mut data = state.data.lock().await;
    let campaign = data.owned_campaign_mut(&user.user_id, &id)?;
    if payload.end_date.is_some_and(|end| end < campaign.start_date) {
        return Err(AppError::bad_request("End date cannot be before the start date"));
    }
    if let Some(title) = title {
        campaign.title = title;
    }
    if let Some(objective) = payload.objective {
        campaign.objective = objective.trim().to_string();
    }
    if let Some(budget) = payload.budget {
        campaign.budget = budget;
    }
    if let Some(budget_type) = budget_type {
        campaign.budget_type = budget_type;
    }
    if let Some(end_date) = payload.end_date {
        campaign.end_date = Some(end_date);
    }
    let campaign = campaign.clone();
    save(&state, &data).await?;

    let settings = data.settings_or_default(&user.user_id);
    Ok(ApiResponse::ok(CampaignView::build(
        &data,
        &campaign,
        &settings,
        state.revenue_per_result(),
    )))
}

/// An empty body means "no status given"; anything else must be a valid
/// `StatusRequest`.
fn requested_status(body: &[u8]) -> Result<Option<CampaignStatus>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: StatusRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))?;
    request
        .status
        .map(|s| s.parse::<CampaignStatus>())
        .transpose()
        .map_err(AppError::bad_request)
}

/// Sets the status, or flips active/paused when none is given.
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<CampaignView>, AppError> {
    let requested = requested_status(&body)?;

    let mut data = state.data.lock().await;
    let campaign = data.owned_campaign_mut(&user.user_id, &id)?;
    campaign.status = match (requested, campaign.status) {
        (Some(status), _) => status,
        (None, CampaignStatus::Active) => CampaignStatus::Paused,
        (None, CampaignStatus::Paused) => CampaignStatus::Active,
        (None, CampaignStatus::Completed) => {
            return Err(AppError::bad_request("A completed campaign cannot be toggled"));
        }
    };
    let campaign = campaign.clone();
    save(&state, &data).await?;
    info!(campaign_id = %campaign.id, status = %campaign.status, "campaign status changed");

    let settings = data.settings_or_default(&user.user_id);
    let message = format!("Campaign is now {}", campaign.status);
    Ok(ApiResponse::ok(CampaignView::build(
        &data,
        &campaign,
        &settings,
        state.revenue_per_result(),
    ))
    .with_message(message))
}

/// Totals over the daily series, optionally bounded by `from`/`to`. Without
/// a range and without any daily rows, the campaign's own counters are used.
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<ApiResponse<StatsResponse>, AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::bad_request("'from' must not be after 'to'"));
        }
    }

    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let campaign = data.owned_campaign(&user.user_id, &id)?;
    let conversion = data.conversion_for(campaign, &settings);

    let rows: Vec<_> = data
        .metrics_for(&campaign.id)
        .into_iter()
        .filter(|m| query.from.is_none_or(|from| m.date >= from))
        .filter(|m| query.to.is_none_or(|to| m.date <= to))
        .collect();
    let ranged = query.from.is_some() || query.to.is_some();

    let mut totals: Totals = if rows.is_empty() && !ranged {
        Totals::of_campaign(campaign)
    } else {
        rows.iter().map(|m| Totals::of_metric(m)).collect()
    };
    let raw_spend = totals.spend;
    if let Some(conversion) = conversion {
        totals.spend = conversion.apply(totals.spend);
    }

    Ok(ApiResponse::ok(StatsResponse {
        campaign_id: campaign.id.clone(),
        from: query.from,
        to: query.to,
        days: rows.len(),
        metrics: totals.metrics(state.revenue_per_result()),
        progress: progress(raw_spend, campaign.budget, conversion),
    }))
}

/// Daily series for the last `days` days (default 30).
pub async fn chart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ChartQuery>,
) -> Result<ApiResponse<Vec<DailyPoint>>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_CHART_DAYS);
    if !(1..=MAX_CHART_DAYS).contains(&days) {
        return Err(AppError::bad_request(format!(
            "days must be between 1 and {MAX_CHART_DAYS}"
        )));
    }
    let since = Local::now().date_naive() - Duration::days(days - 1);

    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    let campaign = data.owned_campaign(&user.user_id, &id)?;
    let rows: Vec<_> = data
        .metrics_for(&campaign.id)
        .into_iter()
        .filter(|m| m.date >= since)
        .collect();

    let points = data.display_metrics(&rows, &settings)
        .into_iter()
        .map(|m| DailyPoint {
            date: m.date,
            spend: round2(m.spend),
            impressions: m.impressions,
            clicks: m.clicks,
            ctr: ctr(m.impressions, m.clicks),
            conversion: m.conversion,
        })
        .collect();
    Ok(ApiResponse::ok(points))
}

/// Age/gender breakdown from the Graph API for campaigns linked to a
/// Facebook campaign id; an empty list otherwise.
pub async fn demographics(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    token: GraphToken,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    let facebook_id = {
        let data = state.data.lock().await;
        data.owned_campaign(&user.user_id, &id)?.facebook_id.clone()
    };
    let Some(facebook_id) = facebook_id else {
        return Ok(ApiResponse::ok(Vec::new()));
    };

    let access_token = token.resolve(&state)?;
    let rows = state
        .graph
        .list(
            &access_token,
            &format!("{facebook_id}/insights"),
            FB_INSIGHT_FIELDS,
            &[("breakdowns", "age,gender"), ("date_preset", "maximum")],
        )
        .await?;
    Ok(ApiResponse::ok(rows.iter().map(normalize_row).collect()))
}
