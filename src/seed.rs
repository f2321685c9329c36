//! Demo data for local development and tests.

use crate::auth::hash_password;
use crate::errors::AppError;
use crate::models::{
    new_id, AccountStatus, AdAccount, AppData, BudgetType, Campaign, CampaignMetric,
    CampaignStatus, Settings, User,
};
use crate::stats::{ctr, round2, Totals};
use chrono::{Duration, Local, NaiveDate, Utc};

const METRIC_DAYS: i64 = 90;

/// A user without credentials; callers set `password_hash`.
pub fn demo_user(email: &str, name: &str) -> User {
    User {
        id: new_id(),
        email: email.trim().to_ascii_lowercase(),
        password_hash: String::new(),
        name: name.to_string(),
        avatar: None,
        facebook_id: None,
        created_at: Utc::now(),
    }
}

pub fn demo_account(user_id: &str, name: &str, currency: &str) -> AdAccount {
    AdAccount {
        id: new_id(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        status: AccountStatus::Active,
        currency: currency.to_string(),
        facebook_id: None,
        created_at: Utc::now(),
    }
}

pub fn demo_campaign(account_id: &str, title: &str, impressions: u64, clicks: u64) -> Campaign {
    let spent = clicks as f64 * 2_500.0;
    let results = clicks / 20;
    Campaign {
        id: new_id(),
        account_id: account_id.to_string(),
        title: title.to_string(),
        status: CampaignStatus::Active,
        objective: "OUTCOME_TRAFFIC".to_string(),
        budget: 1_000_000.0,
        budget_type: BudgetType::Daily,
        spent,
        impressions,
        clicks,
        results,
        cost_per_result: if results > 0 { round2(spent / results as f64) } else { 0.0 },
        start_date: Local::now().date_naive() - Duration::days(METRIC_DAYS),
        end_date: None,
        facebook_id: None,
        created_at: Utc::now(),
    }
}

/// One row per day ending at `last_day`, with a deterministic weekly shape.
pub fn demo_metrics(campaign_id: &str, last_day: NaiveDate, days: i64, scale: u64) -> Vec<CampaignMetric> {
    (0..days)
        .rev()
        .map(|offset| {
            let date = last_day - Duration::days(offset);
            let wave = (offset % 7) as u64 + 1;
            let impressions = scale * (8 + wave);
            let clicks = impressions * (10 + wave) / 1_000;
            let conversion = clicks / 25;
            CampaignMetric {
                id: new_id(),
                campaign_id: campaign_id.to_string(),
                date,
                spend: clicks as f64 * 2_400.0,
                impressions,
                clicks,
                ctr: ctr(impressions, clicks),
                conversion,
            }
        })
        .collect()
}

/// Sets a campaign's counters to the sums of its daily rows.
fn roll_up(campaign: &mut Campaign, metrics: &[CampaignMetric]) {
    let totals: Totals = metrics.iter().map(Totals::of_metric).collect();
    campaign.spent = round2(totals.spend);
    campaign.impressions = totals.impressions;
    campaign.clicks = totals.clicks;
    campaign.results = totals.results;
    campaign.cost_per_result = if totals.results > 0 {
        round2(totals.spend / totals.results as f64)
    } else {
        0.0
    };
}

/// A demo user with two accounts, four campaigns and 90 days of metrics.
pub fn build_demo_data(email: &str, password: &str) -> Result<AppData, AppError> {
    let mut data = AppData::default();
    let today = Local::now().date_naive();

    let mut user = demo_user(email, "Demo Operator");
    user.password_hash = hash_password(password)?;

    let main = demo_account(&user.id, "Main Store", "VND");
    let mut export = demo_account(&user.id, "Export Shop", "USD");
    export.status = AccountStatus::Paused;

    let plans = [
        (&main, "Spring Sale", "OUTCOME_SALES", CampaignStatus::Active, BudgetType::Daily, 1_500_000.0, 400),
        (&main, "Brand Awareness", "OUTCOME_AWARENESS", CampaignStatus::Active, BudgetType::Lifetime, 90_000_000.0, 900),
        (&main, "Lead Magnet", "OUTCOME_LEADS", CampaignStatus::Paused, BudgetType::Daily, 800_000.0, 150),
        (&export, "Overseas Retargeting", "OUTCOME_TRAFFIC", CampaignStatus::Active, BudgetType::Daily, 2_000_000.0, 250),
    ];

    for (account, title, objective, status, budget_type, budget, scale) in plans {
        let mut campaign = demo_campaign(&account.id, title, 0, 0);
        campaign.objective = objective.to_string();
        campaign.status = status;
        campaign.budget_type = budget_type;
        campaign.budget = budget;

        let metrics = demo_metrics(&campaign.id, today, METRIC_DAYS, scale);
        roll_up(&mut campaign, &metrics);
        data.campaign_metrics.extend(metrics);
        data.campaigns.insert(campaign.id.clone(), campaign);
    }

    data.settings.insert(user.id.clone(), Settings::defaults_for(&user.id));
    data.ad_accounts.insert(main.id.clone(), main);
    data.ad_accounts.insert(export.id.clone(), export);
    data.users.insert(user.id.clone(), user);

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    #[test]
    fn demo_data_is_consistent() {
        let data = build_demo_data("Demo@Example.com", "password123").unwrap();
        assert_eq!(data.users.len(), 1);
        assert_eq!(data.ad_accounts.len(), 2);
        assert_eq!(data.campaigns.len(), 4);
        assert_eq!(data.campaign_metrics.len(), 4 * METRIC_DAYS as usize);

        let user = data.user_by_email("demo@example.com").unwrap();
        assert!(verify_password("password123", &user.password_hash));
        assert_eq!(data.owned_campaigns(&user.id).len(), 4);
    }

    #[test]
    fn campaign_counters_match_daily_rows() {
        let data = build_demo_data("demo@example.com", "password123").unwrap();
        for campaign in data.campaigns.values() {
            let rows = data.metrics_for(&campaign.id);
            let impressions: u64 = rows.iter().map(|m| m.impressions).sum();
            let clicks: u64 = rows.iter().map(|m| m.clicks).sum();
            assert_eq!(campaign.impressions, impressions);
            assert_eq!(campaign.clicks, clicks);
        }
    }

    #[test]
    fn metrics_end_on_last_day() {
        let last = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let rows = demo_metrics("c1", last, 10, 100);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows.last().unwrap().date, last);
        assert_eq!(rows.first().unwrap().date, last - Duration::days(9));
    }
}
