use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the API exposes of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            facebook_id: user.facebook_id.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub user_id: String,
    pub alert_cost_threshold: f64,
    pub alert_ctr_threshold: f64,
    pub default_daily_budget: f64,
    /// Currency amounts are displayed in.
    pub currency: String,
    /// Display-currency units per one unit of an account's currency.
    pub exchange_rate: f64,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            alert_cost_threshold: 50_000.0,
            alert_ctr_threshold: 1.0,
            default_daily_budget: 500_000.0,
            currency: "VND".to_string(),
            exchange_rate: 25_000.0,
            updated_at: Utc::now(),
        }
    }
}

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "invalid {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

string_enum!(AccountStatus { Active => "active", Paused => "paused" });
string_enum!(CampaignStatus { Active => "active", Paused => "paused", Completed => "completed" });
string_enum!(BudgetType { Daily => "daily", Lifetime => "lifetime" });

impl AccountStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Paused,
            Self::Paused => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdAccount {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub status: AccountStatus,
    pub currency: String,
    #[serde(default)]
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub status: CampaignStatus,
    pub objective: String,
    pub budget: f64,
    pub budget_type: BudgetType,
    pub spent: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub results: u64,
    pub cost_per_result: f64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetric {
    pub id: String,
    pub campaign_id: String,
    pub date: NaiveDate,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub conversion: u64,
}

/// The whole persisted document, one map per collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    /// Keyed by user id.
    #[serde(default)]
    pub settings: BTreeMap<String, Settings>,
    #[serde(default, rename = "adaccounts")]
    pub ad_accounts: BTreeMap<String, AdAccount>,
    #[serde(default)]
    pub campaigns: BTreeMap<String, Campaign>,
    #[serde(default, rename = "campaignmetrics")]
    pub campaign_metrics: Vec<CampaignMetric>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
