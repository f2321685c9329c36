//! Application-level joins over the in-memory document.
//!
//! Nothing here enforces referential integrity; every lookup that crosses
//! an ownership boundary filters on the caller's owned account ids.

use crate::errors::AppError;
use crate::models::{AdAccount, AppData, Campaign, CampaignMetric, Settings, User};
use crate::stats::{Conversion, Totals};
use std::collections::BTreeSet;

impl AppData {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|user| user.email == email)
    }

    pub fn owned_account_ids(&self, user_id: &str) -> BTreeSet<String> {
        self.ad_accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .map(|account| account.id.clone())
            .collect()
    }

    pub fn owned_accounts(&self, user_id: &str) -> Vec<&AdAccount> {
        self.ad_accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .collect()
    }

    pub fn owned_account(&self, user_id: &str, account_id: &str) -> Result<&AdAccount, AppError> {
        self.ad_accounts
            .get(account_id)
            .filter(|account| account.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Ad account not found"))
    }

    pub fn owned_account_mut(
        &mut self,
        user_id: &str,
        account_id: &str,
    ) -> Result<&mut AdAccount, AppError> {
        self.ad_accounts
            .get_mut(account_id)
            .filter(|account| account.user_id == user_id)
            .ok_or_else(|| AppError::not_found("Ad account not found"))
    }

    pub fn owned_campaigns(&self, user_id: &str) -> Vec<&Campaign> {
        let owned = self.owned_account_ids(user_id);
        self.campaigns
            .values()
            .filter(|campaign| owned.contains(&campaign.account_id))
            .collect()
    }

    pub fn owned_campaign(&self, user_id: &str, campaign_id: &str) -> Result<&Campaign, AppError> {
        let owned = self.owned_account_ids(user_id);
        self.campaigns
            .get(campaign_id)
            .filter(|campaign| owned.contains(&campaign.account_id))
            .ok_or_else(|| AppError::not_found("Campaign not found"))
    }

    pub fn owned_campaign_mut(
        &mut self,
        user_id: &str,
        campaign_id: &str,
    ) -> Result<&mut Campaign, AppError> {
        let owned = self.owned_account_ids(user_id);
        self.campaigns
            .get_mut(campaign_id)
            .filter(|campaign| owned.contains(&campaign.account_id))
            .ok_or_else(|| AppError::not_found("Campaign not found"))
    }

    /// Drops a user together with their settings, accounts, campaigns and metrics.
    pub fn remove_user(&mut self, user_id: &str) {
        let accounts = self.owned_account_ids(user_id);
        let campaigns: BTreeSet<String> = self
            .campaigns
            .values()
            .filter(|campaign| accounts.contains(&campaign.account_id))
            .map(|campaign| campaign.id.clone())
            .collect();

        self.campaign_metrics
            .retain(|metric| !campaigns.contains(&metric.campaign_id));
        self.campaigns.retain(|id, _| !campaigns.contains(id));
        self.ad_accounts.retain(|id, _| !accounts.contains(id));
        self.settings.remove(user_id);
        self.users.remove(user_id);
    }

    /// Daily rows for one campaign, oldest first.
    pub fn metrics_for(&self, campaign_id: &str) -> Vec<&CampaignMetric> {
        let mut rows: Vec<_> = self
            .campaign_metrics
            .iter()
            .filter(|metric| metric.campaign_id == campaign_id)
            .collect();
        rows.sort_by_key(|metric| metric.date);
        rows
    }

    /// Daily rows across every campaign the user owns, oldest first.
    pub fn metrics_for_user(&self, user_id: &str) -> Vec<&CampaignMetric> {
        let campaign_ids: BTreeSet<&str> = self
            .owned_campaigns(user_id)
            .into_iter()
            .map(|campaign| campaign.id.as_str())
            .collect();
        let mut rows: Vec<_> = self
            .campaign_metrics
            .iter()
            .filter(|metric| campaign_ids.contains(metric.campaign_id.as_str()))
            .collect();
        rows.sort_by_key(|metric| metric.date);
        rows
    }

    /// Returns the user's settings, creating the default document on first access.
    pub fn settings_entry(&mut self, user_id: &str) -> &mut Settings {
        self.settings
            .entry(user_id.to_string())
            .or_insert_with(|| Settings::defaults_for(user_id))
    }

    /// Settings without creating them; falls back to defaults.
    pub fn settings_or_default(&self, user_id: &str) -> Settings {
        self.settings
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Settings::defaults_for(user_id))
    }

    /// The account currency for a campaign, if its account exists.
    pub fn currency_of(&self, campaign: &Campaign) -> Option<&str> {
        self.ad_accounts
            .get(&campaign.account_id)
            .map(|account| account.currency.as_str())
    }

    /// Account-currency to display-currency conversion for one campaign.
    pub fn conversion_for(&self, campaign: &Campaign, settings: &Settings) -> Option<Conversion> {
        self.currency_of(campaign)
            .and_then(|currency| Conversion::between(currency, settings))
    }

    /// Campaign counters with spend in the display currency.
    pub fn display_totals(&self, campaign: &Campaign, settings: &Settings) -> Totals {
        let mut totals = Totals::of_campaign(campaign);
        if let Some(conversion) = self.conversion_for(campaign, settings) {
            totals.spend = conversion.apply(totals.spend);
        }
        totals
    }

    /// Daily rows with spend in the display currency.
    pub fn display_metrics(&self, rows: &[&CampaignMetric], settings: &Settings) -> Vec<CampaignMetric> {
        rows.iter()
            .map(|row| {
                let mut row = (*row).clone();
                let conversion = self
                    .campaigns
                    .get(&row.campaign_id)
                    .and_then(|campaign| self.conversion_for(campaign, settings));
                if let Some(conversion) = conversion {
                    row.spend = conversion.apply(row.spend);
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::seed::{demo_account, demo_campaign, demo_user};
    use crate::models::AppData;

    fn two_tenants() -> (AppData, String, String, String) {
        let mut data = AppData::default();
        let alice = demo_user("alice@example.com", "Alice");
        let bob = demo_user("bob@example.com", "Bob");
        let account = demo_account(&alice.id, "Alice Ads", "USD");
        let campaign = demo_campaign(&account.id, "Spring", 250_000, 2_000);
        let ids = (alice.id.clone(), bob.id.clone(), campaign.id.clone());
        data.users.insert(alice.id.clone(), alice);
        data.users.insert(bob.id.clone(), bob);
        data.ad_accounts.insert(account.id.clone(), account);
        data.campaigns.insert(campaign.id.clone(), campaign);
        (data, ids.0, ids.1, ids.2)
    }

    #[test]
    fn owner_can_read_campaign() {
        let (data, alice, _, campaign) = two_tenants();
        assert!(data.owned_campaign(&alice, &campaign).is_ok());
        assert_eq!(data.owned_campaigns(&alice).len(), 1);
    }

    #[test]
    fn other_user_gets_not_found() {
        let (mut data, _, bob, campaign) = two_tenants();
        let err = data.owned_campaign(&bob, &campaign).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        assert!(data.owned_campaign_mut(&bob, &campaign).is_err());
        assert!(data.owned_campaigns(&bob).is_empty());
    }

    #[test]
    fn accounts_are_scoped_to_their_owner() {
        let (mut data, alice, bob, _) = two_tenants();
        let account_id = data.owned_accounts(&alice)[0].id.clone();

        assert_eq!(data.owned_account(&alice, &account_id).unwrap().name, "Alice Ads");
        assert!(data.owned_account_mut(&alice, &account_id).is_ok());

        let err = data.owned_account(&bob, &account_id).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Ad account not found");
        assert!(data.owned_account_mut(&bob, &account_id).is_err());
        assert!(data.owned_accounts(&bob).is_empty());
        assert!(data.owned_account(&alice, "missing").is_err());
    }

    #[test]
    fn settings_are_created_lazily() {
        let (mut data, alice, _, _) = two_tenants();
        assert!(data.settings.is_empty());
        data.settings_entry(&alice).alert_ctr_threshold = 2.5;
        assert_eq!(data.settings.len(), 1);
        assert_eq!(data.settings_or_default(&alice).alert_ctr_threshold, 2.5);
    }

    #[test]
    fn removing_a_user_cascades() {
        let (mut data, alice, bob, _) = two_tenants();
        data.settings_entry(&alice);
        data.remove_user(&alice);
        assert!(data.ad_accounts.is_empty());
        assert!(data.campaigns.is_empty());
        assert!(data.settings.is_empty());
        assert_eq!(data.users.len(), 1);
        assert!(data.users.contains_key(&bob));
    }

    #[test]
    fn user_lookup_by_email() {
        let (data, alice, _, _) = two_tenants();
        assert_eq!(data.user_by_email("alice@example.com").map(|u| &u.id), Some(&alice));
        assert!(data.user_by_email("nobody@example.com").is_none());
    }
}
