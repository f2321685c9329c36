// Graph API
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v20.0";
pub const DEFAULT_FACEBOOK_DIALOG_URL: &str = "https://www.facebook.com";

// Graph API field selections
pub const FB_LOGIN_SCOPES: &str = "ads_read,ads_management,business_management";
pub const FB_PROFILE_FIELDS: &str = "id,name,email,picture";
pub const FB_ACCOUNT_FIELDS: &str = "id,account_id,name,account_status,currency,amount_spent,balance";
pub const FB_CAMPAIGN_FIELDS: &str =
    "id,name,status,effective_status,objective,daily_budget,lifetime_budget,start_time,stop_time";
pub const FB_ADSET_FIELDS: &str =
    "id,name,status,effective_status,daily_budget,lifetime_budget,optimization_goal,campaign_id";
pub const FB_INSIGHT_FIELDS: &str = "spend,impressions,clicks,reach,ctr,cpc,cpm,actions";

// Action types counted as a "result", in priority order.
pub const RESULT_ACTION_TYPES: &[&str] = &[
    "offsite_conversion.fb_pixel_purchase",
    "purchase",
    "lead",
    "onsite_conversion.messaging_conversation_started_7d",
    "link_click",
];

// LLM provider
pub const DEFAULT_AI_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.0-flash-001";

// Aggregation
pub const DEFAULT_REVENUE_PER_RESULT: f64 = 100_000.0;
