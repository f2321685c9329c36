//! Pass-through to the Graph API. These routes carry no bearer token; the
//! configured [`AccessTokenSource`](crate::graph::AccessTokenSource) decides
//! which Facebook token is forwarded.

use super::{ApiJson, ApiQuery};
use crate::constants::{
    FB_ACCOUNT_FIELDS, FB_ADSET_FIELDS, FB_CAMPAIGN_FIELDS, FB_INSIGHT_FIELDS, FB_PROFILE_FIELDS,
};
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::graph::login_dialog_url;
use crate::insights::normalize_row;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const FACEBOOK_TOKEN_HEADER: &str = "x-facebook-token";

/// The Facebook token the caller sent, from the `X-Facebook-Token` header or
/// an `access_token` query parameter.
pub struct GraphToken(pub Option<String>);

impl GraphToken {
    pub fn resolve(&self, state: &AppState) -> Result<String, AppError> {
        state.facebook_token.resolve(self.0.as_deref())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for GraphToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(FACEBOOK_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if header.is_some() {
            return Ok(Self(header));
        }

        let query = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| params)
            .unwrap_or_default();
        Ok(Self(query.get("access_token").cloned()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub campaign_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InsightQuery {
    pub object_id: Option<String>,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub account_id: Option<String>,
    pub date_preset: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl InsightQuery {
    /// The node insights are read from, in order of specificity.
    fn node(&self) -> Result<String, AppError> {
        self.adset_id
            .clone()
            .or_else(|| self.campaign_id.clone())
            .or_else(|| self.object_id.clone())
            .or_else(|| self.account_id.as_deref().map(account_node))
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::bad_request("One of adset_id, campaign_id, object_id or account_id is required")
            })
    }

    fn date_params(&self) -> Vec<(&'static str, String)> {
        match (&self.since, &self.until) {
            (Some(since), Some(until)) => vec![(
                "time_range",
                json!({ "since": since, "until": until }).to_string(),
            )],
            _ => vec![(
                "date_preset",
                self.date_preset.clone().unwrap_or_else(|| "last_30d".to_string()),
            )],
        }
    }
}

/// Graph addresses ad accounts as `act_<id>`.
fn account_node(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("act_") {
        id.to_string()
    } else {
        format!("act_{id}")
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{name} is required")))
}

#[derive(Debug, Serialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// Where the client sends the user to grant ad permissions.
pub async fn login_url(State(state): State<AppState>) -> Result<ApiResponse<LoginUrlResponse>, AppError> {
    let facebook = &state.config.facebook;
    let (Some(app_id), Some(redirect_uri)) = (&facebook.app_id, &facebook.redirect_uri) else {
        return Err(AppError::upstream("Facebook login is not configured"));
    };
    let url = login_dialog_url(&facebook.dialog_url, &facebook.graph_version, app_id, redirect_uri)?;
    Ok(ApiResponse::ok(LoginUrlResponse { url: url.to_string() }))
}

pub async fn exchange_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExchangeRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    let short_lived = required(payload.access_token, "access_token")?;
    let facebook = &state.config.facebook;
    let (Some(app_id), Some(app_secret)) = (&facebook.app_id, &facebook.app_secret) else {
        return Err(AppError::upstream("Facebook app credentials are not configured"));
    };

    let body = state
        .graph
        .exchange_token(&short_lived, app_id, app_secret)
        .await?;
    Ok(ApiResponse::ok(body))
}

pub async fn profile(
    State(state): State<AppState>,
    token: GraphToken,
) -> Result<ApiResponse<Value>, AppError> {
    let access_token = token.resolve(&state)?;
    let body = state
        .graph
        .fields(&access_token, "me", FB_PROFILE_FIELDS, &[])
        .await?;
    Ok(ApiResponse::ok(body))
}

pub async fn ad_accounts(
    State(state): State<AppState>,
    token: GraphToken,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    let access_token = token.resolve(&state)?;
    let accounts = state
        .graph
        .list(&access_token, "me/adaccounts", FB_ACCOUNT_FIELDS, &[])
        .await?;
    Ok(ApiResponse::ok(accounts))
}

pub async fn campaigns(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<AccountQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    let account_id = required(query.account_id, "account_id")?;
    let access_token = token.resolve(&state)?;
    let campaigns = state
        .graph
        .list(
            &access_token,
            &format!("{}/campaigns", account_node(&account_id)),
            FB_CAMPAIGN_FIELDS,
            &[],
        )
        .await?;
    Ok(ApiResponse::ok(campaigns))
}

pub async fn ad_sets(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<CampaignQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    let campaign_id = required(query.campaign_id, "campaign_id")?;
    let access_token = token.resolve(&state)?;
    let ad_sets = state
        .graph
        .list(
            &access_token,
            &format!("{campaign_id}/adsets"),
            FB_ADSET_FIELDS,
            &[],
        )
        .await?;
    Ok(ApiResponse::ok(ad_sets))
}

async fn single_insight(
    state: &AppState,
    token: &GraphToken,
    query: &InsightQuery,
) -> Result<Value, AppError> {
    let node = query.node()?;
    let access_token = token.resolve(state)?;
    let dates = query.date_params();
    let params: Vec<(&str, &str)> = dates.iter().map(|(k, v)| (*k, v.as_str())).collect();

    let record = state
        .graph
        .first(&access_token, &format!("{node}/insights"), FB_INSIGHT_FIELDS, &params)
        .await?;
    Ok(normalize_row(&record))
}

async fn breakdown(
    state: &AppState,
    token: &GraphToken,
    query: &InsightQuery,
    breakdowns: &str,
) -> Result<Vec<Value>, AppError> {
    let node = query.node()?;
    let access_token = token.resolve(state)?;
    let dates = query.date_params();
    let mut params: Vec<(&str, &str)> = vec![("breakdowns", breakdowns)];
    params.extend(dates.iter().map(|(k, v)| (*k, v.as_str())));

    let rows = state
        .graph
        .list(&access_token, &format!("{node}/insights"), FB_INSIGHT_FIELDS, &params)
        .await?;
    Ok(rows.iter().map(normalize_row).collect())
}

pub async fn insights(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<InsightQuery>,
) -> Result<ApiResponse<Value>, AppError> {
    Ok(ApiResponse::ok(single_insight(&state, &token, &query).await?))
}

pub async fn adset_insights(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<InsightQuery>,
) -> Result<ApiResponse<Value>, AppError> {
    required(query.adset_id.clone(), "adset_id")?;
    Ok(ApiResponse::ok(single_insight(&state, &token, &query).await?))
}

pub async fn demographic_insights(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<InsightQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    Ok(ApiResponse::ok(breakdown(&state, &token, &query, "age,gender").await?))
}

pub async fn placement_insights(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<InsightQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    Ok(ApiResponse::ok(
        breakdown(&state, &token, &query, "publisher_platform,platform_position").await?,
    ))
}

pub async fn location_insights(
    State(state): State<AppState>,
    token: GraphToken,
    ApiQuery(query): ApiQuery<InsightQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    Ok(ApiResponse::ok(breakdown(&state, &token, &query, "region").await?))
}
