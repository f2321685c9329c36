//! Rule-based suggestions derived from a user's campaigns and alert settings.

use crate::models::{AppData, BudgetType, CampaignStatus, Settings};
use crate::stats::progress;
use serde::Serialize;

/// Budget consumption (percent) at which an active daily campaign is flagged.
const BUDGET_WARNING_PERCENT: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    LowCtr,
    HighCostPerResult,
    BudgetNearlyExhausted,
    ResumeCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub campaign_id: String,
    pub campaign_title: String,
    pub kind: RecommendationKind,
    pub severity: Severity,
    pub message: String,
}

/// Most severe first.
pub fn recommend(
    data: &AppData,
    user_id: &str,
    settings: &Settings,
    revenue_per_result: f64,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    for campaign in data.owned_campaigns(user_id) {
        let metrics = data.display_totals(campaign, settings).metrics(revenue_per_result);
        let cost_per_result = if metrics.results > 0 {
            metrics.spend / metrics.results as f64
        } else {
            0.0
        };
        let mut push = |kind, severity, message: String| {
            out.push(Recommendation {
                campaign_id: campaign.id.clone(),
                campaign_title: campaign.title.clone(),
                kind,
                severity,
                message,
            });
        };

        match campaign.status {
            CampaignStatus::Active => {
                if metrics.impressions > 0 && metrics.ctr < settings.alert_ctr_threshold {
                    push(
                        RecommendationKind::LowCtr,
                        Severity::Medium,
                        format!(
                            "CTR {:.2}% is below your {:.2}% alert threshold; refresh the creative or narrow the audience.",
                            metrics.ctr, settings.alert_ctr_threshold
                        ),
                    );
                }
                if settings.alert_cost_threshold > 0.0 && cost_per_result > settings.alert_cost_threshold {
                    push(
                        RecommendationKind::HighCostPerResult,
                        Severity::High,
                        format!(
                            "Cost per result {:.0} {} exceeds your {:.0} alert threshold; consider pausing or lowering the bid.",
                            cost_per_result, settings.currency, settings.alert_cost_threshold
                        ),
                    );
                }
                let used = progress(
                    campaign.spent,
                    campaign.budget,
                    data.conversion_for(campaign, settings),
                );
                if campaign.budget_type == BudgetType::Daily && used >= BUDGET_WARNING_PERCENT {
                    push(
                        RecommendationKind::BudgetNearlyExhausted,
                        Severity::Low,
                        format!("{used}% of the daily budget is spent; raise it if results are good."),
                    );
                }
            }
            CampaignStatus::Paused => {
                let strong_ctr = metrics.ctr >= settings.alert_ctr_threshold * 2.0;
                let cheap = settings.alert_cost_threshold <= 0.0
                    || (metrics.results > 0 && cost_per_result <= settings.alert_cost_threshold);
                if metrics.impressions > 0 && strong_ctr && cheap {
                    push(
                        RecommendationKind::ResumeCandidate,
                        Severity::Low,
                        format!(
                            "Paused campaign had a {:.2}% CTR; resuming it may be worthwhile.",
                            metrics.ctr
                        ),
                    );
                }
            }
            CampaignStatus::Completed => {}
        }
    }

    out.sort_by_key(|r| r.severity);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{demo_account, demo_campaign, demo_user};

    fn fixture(status: CampaignStatus, impressions: u64, clicks: u64) -> (AppData, String) {
        let mut data = AppData::default();
        let user = demo_user("t@x.com", "T");
        let account = demo_account(&user.id, "Main", "VND");
        let mut campaign = demo_campaign(&account.id, "Test", impressions, clicks);
        campaign.status = status;
        let user_id = user.id.clone();
        data.users.insert(user.id.clone(), user);
        data.ad_accounts.insert(account.id.clone(), account);
        data.campaigns.insert(campaign.id.clone(), campaign);
        (data, user_id)
    }

    fn kinds(data: &AppData, user_id: &str) -> Vec<RecommendationKind> {
        let settings = Settings::defaults_for(user_id);
        recommend(data, user_id, &settings, 100_000.0)
            .into_iter()
            .map(|r| r.kind)
            .collect()
    }

    #[test]
    fn low_ctr_active_campaign_is_flagged() {
        // 0.5% CTR against the default 1% threshold
        let (data, user) = fixture(CampaignStatus::Active, 100_000, 500);
        assert!(kinds(&data, &user).contains(&RecommendationKind::LowCtr));
    }

    #[test]
    fn healthy_campaign_gets_no_ctr_warning() {
        let (data, user) = fixture(CampaignStatus::Active, 100_000, 3_000);
        assert!(!kinds(&data, &user).contains(&RecommendationKind::LowCtr));
    }

    #[test]
    fn strong_paused_campaign_is_a_resume_candidate() {
        let (data, user) = fixture(CampaignStatus::Paused, 100_000, 3_000);
        assert_eq!(kinds(&data, &user), vec![RecommendationKind::ResumeCandidate]);
    }

    #[test]
    fn exhausted_daily_budget_is_flagged() {
        // demo spend is 2,500 per click against a 1,000,000 budget
        let (data, user) = fixture(CampaignStatus::Active, 100_000, 3_000);
        assert!(kinds(&data, &user).contains(&RecommendationKind::BudgetNearlyExhausted));
    }

    #[test]
    fn other_users_campaigns_are_ignored() {
        let (data, _) = fixture(CampaignStatus::Active, 100_000, 500);
        assert!(kinds(&data, "someone-else").is_empty());
    }
}
