pub mod accounts;
pub mod ai;
pub mod auth;
pub mod campaigns;
pub mod dashboard;
pub mod facebook;
pub mod reports;
pub mod settings;

use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::{AppData, Campaign, Settings};
use crate::state::AppState;
use crate::stats::progress;
use crate::storage::persist_data;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// `Json` whose rejection is reported in the envelope as a validation error.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` whose rejection is reported in the envelope as a validation error.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub async fn save(state: &AppState, data: &AppData) -> Result<(), AppError> {
    persist_data(&state.data_path, data).await
}

pub async fn health() -> ApiResponse<&'static str> {
    ApiResponse::ok("ok")
}

pub async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// A stored campaign plus everything derived from it. Money metrics are in
/// the caller's display currency; `spent` and `budget` stay as stored.
#[derive(Debug, Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub account_name: String,
    pub currency: String,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roi: f64,
    pub progress: u32,
}

impl CampaignView {
    pub fn build(data: &AppData, campaign: &Campaign, settings: &Settings, revenue_per_result: f64) -> Self {
        let metrics = data.display_totals(campaign, settings).metrics(revenue_per_result);
        let account = data.ad_accounts.get(&campaign.account_id);
        Self {
            account_name: account.map(|a| a.name.clone()).unwrap_or_default(),
            currency: account.map(|a| a.currency.clone()).unwrap_or_default(),
            ctr: metrics.ctr,
            cpc: metrics.cpc,
            cpm: metrics.cpm,
            roi: metrics.roi,
            progress: progress(
                campaign.spent,
                campaign.budget,
                data.conversion_for(campaign, settings),
            ),
            campaign: campaign.clone(),
        }
    }
}
