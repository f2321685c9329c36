use super::{save, ApiJson};
use crate::auth::AuthUser;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::Settings;
use crate::recommendations::{recommend, Recommendation};
use crate::state::AppState;
use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    pub alert_cost_threshold: Option<f64>,
    pub alert_ctr_threshold: Option<f64>,
    pub default_daily_budget: Option<f64>,
    pub currency: Option<String>,
    pub exchange_rate: Option<f64>,
}

impl UpdateSettingsRequest {
    fn apply(self, settings: &mut Settings) -> Result<(), AppError> {
        fn non_negative(name: &str, value: Option<f64>) -> Result<Option<f64>, AppError> {
            match value {
                Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::bad_request(format!(
                    "{name} must be a non-negative number"
                ))),
                other => Ok(other),
            }
        }

        let alert_cost = non_negative("alert_cost_threshold", self.alert_cost_threshold)?;
        let alert_ctr = non_negative("alert_ctr_threshold", self.alert_ctr_threshold)?;
        let daily_budget = non_negative("default_daily_budget", self.default_daily_budget)?;
        if self.exchange_rate.is_some_and(|r| !r.is_finite() || r <= 0.0) {
            return Err(AppError::bad_request("exchange_rate must be greater than zero"));
        }
        let currency = self.currency.map(|c| c.trim().to_ascii_uppercase());
        if currency
            .as_deref()
            .is_some_and(|c| c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()))
        {
            return Err(AppError::bad_request("currency must be a 3-letter ISO code"));
        }

        if let Some(v) = alert_cost {
            settings.alert_cost_threshold = v;
        }
        if let Some(v) = alert_ctr {
            settings.alert_ctr_threshold = v;
        }
        if let Some(v) = daily_budget {
            settings.default_daily_budget = v;
        }
        if let Some(c) = currency {
            settings.currency = c;
        }
        if let Some(r) = self.exchange_rate {
            settings.exchange_rate = r;
        }
        settings.updated_at = Utc::now();
        Ok(())
    }
}

/// Creates the settings document on first read.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Settings>, AppError> {
    let mut data = state.data.lock().await;
    let created = !data.settings.contains_key(&user.user_id);
    let settings = data.settings_entry(&user.user_id).clone();
    if created {
        save(&state, &data).await?;
    }
    Ok(ApiResponse::ok(settings))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateSettingsRequest>,
) -> Result<ApiResponse<Settings>, AppError> {
    let mut data = state.data.lock().await;
    let mut settings = data.settings_or_default(&user.user_id);
    payload.apply(&mut settings)?;
    data.settings.insert(user.user_id.clone(), settings.clone());
    save(&state, &data).await?;
    Ok(ApiResponse::ok(settings).with_message("Settings saved"))
}

pub async fn recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<Recommendation>>, AppError> {
    let data = state.data.lock().await;
    let settings = data.settings_or_default(&user.user_id);
    Ok(ApiResponse::ok(recommend(
        &data,
        &user.user_id,
        &settings,
        state.revenue_per_result(),
    )))
}
