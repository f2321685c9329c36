//! Derived ad metrics.
//!
//! Every ratio here is guarded: a zero denominator yields `0` instead of an
//! error or a non-finite value. CTR, CPC and CPM are rounded to two decimals;
//! ROI keeps full precision until it lands in [`Metrics`].

use crate::models::{Campaign, CampaignMetric, Settings};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn ctr(impressions: u64, clicks: u64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    round2(clicks as f64 / impressions as f64 * 100.0)
}

pub fn cpc(spend: f64, clicks: u64) -> f64 {
    if clicks == 0 {
        return 0.0;
    }
    round2(spend / clicks as f64)
}

pub fn cpm(spend: f64, impressions: u64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    round2(spend / impressions as f64 * 1000.0)
}

pub fn roi(results: u64, spend: f64, revenue_per_result: f64) -> f64 {
    if spend <= 0.0 {
        return 0.0;
    }
    let revenue = results as f64 * revenue_per_result;
    (revenue - spend) / spend * 100.0
}

/// Converts an amount from the account currency into the display currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub rate: f64,
}

impl Conversion {
    /// `None` when the currencies match or the rate is unusable.
    pub fn between(account_currency: &str, settings: &Settings) -> Option<Self> {
        if account_currency.eq_ignore_ascii_case(&settings.currency) {
            return None;
        }
        if !(settings.exchange_rate.is_finite() && settings.exchange_rate > 0.0) {
            return None;
        }
        Some(Self {
            rate: settings.exchange_rate,
        })
    }

    pub fn apply(self, amount: f64) -> f64 {
        amount * self.rate
    }
}

/// Budget consumption in whole percent, capped at 100.
pub fn progress(spend: f64, budget: f64, conversion: Option<Conversion>) -> u32 {
    if budget <= 0.0 || spend <= 0.0 {
        return 0;
    }
    let spend = conversion.map_or(spend, |c| c.apply(spend));
    let percent = (spend / budget * 100.0).round();
    percent.min(100.0) as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub results: u64,
}

impl Totals {
    pub fn of_campaign(campaign: &Campaign) -> Self {
        Self {
            spend: campaign.spent,
            impressions: campaign.impressions,
            clicks: campaign.clicks,
            results: campaign.results,
        }
    }

    pub fn of_metric(metric: &CampaignMetric) -> Self {
        Self {
            spend: metric.spend,
            impressions: metric.impressions,
            clicks: metric.clicks,
            results: metric.conversion,
        }
    }

    pub fn add(&mut self, other: Self) {
        self.spend += other.spend;
        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.results = self.results.saturating_add(other.results);
    }

    pub fn metrics(&self, revenue_per_result: f64) -> Metrics {
        Metrics {
            spend: round2(self.spend),
            impressions: self.impressions,
            clicks: self.clicks,
            results: self.results,
            ctr: ctr(self.impressions, self.clicks),
            cpc: cpc(self.spend, self.clicks),
            cpm: cpm(self.spend, self.impressions),
            roi: round2(roi(self.results, self.spend, revenue_per_result)),
        }
    }
}

impl FromIterator<Totals> for Totals {
    fn from_iter<I: IntoIterator<Item = Totals>>(iter: I) -> Self {
        let mut sum = Totals::default();
        for item in iter {
            sum.add(item);
        }
        sum
    }
}

/// The metrics contract shared by dashboard, detail and comparison views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub results: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub year: i32,
    /// Millions.
    pub spend: f64,
    /// Millions.
    pub profit: f64,
}

/// Sums daily rows per calendar month, oldest month first.
pub fn monthly_buckets(metrics: &[&CampaignMetric], revenue_per_result: f64) -> Vec<MonthlyPoint> {
    let mut buckets: Vec<(NaiveDate, f64, f64)> = Vec::new();

    for metric in metrics {
        let Some(month_start) = metric.date.with_day(1) else {
            continue;
        };
        let profit = metric.conversion as f64 * revenue_per_result - metric.spend;
        match buckets.iter_mut().find(|(start, _, _)| *start == month_start) {
            Some((_, spend, total_profit)) => {
                *spend += metric.spend;
                *total_profit += profit;
            }
            None => buckets.push((month_start, metric.spend, profit)),
        }
    }

    buckets.sort_by_key(|(start, _, _)| *start);
    buckets
        .into_iter()
        .map(|(start, spend, profit)| MonthlyPoint {
            month: start.format("%b").to_string(),
            year: start.year(),
            spend: round2(spend / 1_000_000.0),
            profit: round2(profit / 1_000_000.0),
        })
        .collect()
}
