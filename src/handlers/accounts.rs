use super::{save, ApiJson};
use crate::auth::AuthUser;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::{AccountStatus, AdAccount, AppData, CampaignStatus};
use crate::state::AppState;
use crate::stats::round2;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: AdAccount,
    pub campaign_count: usize,
    pub active_campaigns: usize,
    /// In the account's own currency.
    pub total_spend: f64,
}

impl AccountView {
    fn build(data: &AppData, account: &AdAccount) -> Self {
        let campaigns: Vec<_> = data
            .campaigns
            .values()
            .filter(|campaign| campaign.account_id == account.id)
            .collect();
        Self {
            campaign_count: campaigns.len(),
            active_campaigns: campaigns
                .iter()
                .filter(|c| c.status == CampaignStatus::Active)
                .count(),
            total_spend: round2(campaigns.iter().map(|c| c.spent).sum()),
            account: account.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<AccountView>>, AppError> {
    let data = state.data.lock().await;
    let views = data
        .owned_accounts(&user.user_id)
        .into_iter()
        .map(|account| AccountView::build(&data, account))
        .collect();
    Ok(ApiResponse::ok(views))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<AccountView>, AppError> {
    let data = state.data.lock().await;
    let account = data.owned_account(&user.user_id, &id)?;
    Ok(ApiResponse::ok(AccountView::build(&data, account)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> Result<ApiResponse<AccountView>, AppError> {
    let name = payload.name.map(|n| n.trim().to_string());
    if name.as_deref().is_some_and(str::is_empty) {
        return Err(AppError::bad_request("Account name cannot be empty"));
    }
    let status = payload
        .status
        .map(|s| s.parse::<AccountStatus>())
        .transpose()
        .map_err(AppError::bad_request)?;
    if name.is_none() && status.is_none() {
        return Err(AppError::bad_request("Nothing to update: provide name or status"));
    }

    let mut data = state.data.lock().await;
    let account = data.owned_account_mut(&user.user_id, &id)?;
    if let Some(name) = name {
        account.name = name;
    }
    if let Some(status) = status {
        account.status = status;
    }
    let account = account.clone();
    save(&state, &data).await?;

    Ok(ApiResponse::ok(AccountView::build(&data, &account)))
}

/// Flips active/paused. Concurrent toggles serialize on the store lock; the
/// last one wins.
pub async fn toggle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<AccountView>, AppError> {
    let mut data = state.data.lock().await;
    let account = data.owned_account_mut(&user.user_id, &id)?;
    account.status = account.status.toggled();
    let account = account.clone();
    save(&state, &data).await?;

    info!(account_id = %account.id, status = %account.status, "toggled ad account");
    Ok(ApiResponse::ok(AccountView::build(&data, &account)).with_message(format!(
        "Account is now {}",
        account.status
    )))
}
