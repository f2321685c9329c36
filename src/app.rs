use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::{
    self, accounts, ai, auth, campaigns, dashboard, facebook, reports, settings,
};
use crate::state::AppState;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use std::{any::Any, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let dashboard_routes = Router::new()
        .route("/summary", get(dashboard::summary))
        .route("/chart-data", get(dashboard::chart_data))
        .route("/ad-sets", get(dashboard::ad_sets));

    let account_routes = Router::new()
        .route("/", get(accounts::list))
        .route("/:id", get(accounts::get).patch(accounts::update))
        .route("/:id/toggle", patch(accounts::toggle));

    let campaign_routes = Router::new()
        .route("/", get(campaigns::list))
        .route("/:id", get(campaigns::get).patch(campaigns::update))
        .route("/:id/status", patch(campaigns::set_status))
        .route("/:id/stats", get(campaigns::stats))
        .route("/:id/chart", get(campaigns::chart))
        .route("/:id/demographics", get(campaigns::demographics));

    let facebook_routes = Router::new()
        .route("/login-url", get(facebook::login_url))
        .route("/exchange-token", post(facebook::exchange_token))
        .route("/profile", get(facebook::profile))
        .route("/adaccounts", get(facebook::ad_accounts))
        .route("/campaigns", get(facebook::campaigns))
        .route("/insights", get(facebook::insights))
        .route("/adsets", get(facebook::ad_sets))
        .route("/adset-insights", get(facebook::adset_insights))
        .route("/insights/demographics", get(facebook::demographic_insights))
        .route("/insights/placements", get(facebook::placement_insights))
        .route("/insights/locations", get(facebook::location_insights));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/accounts", account_routes)
        .nest("/campaigns", campaign_routes)
        .route("/reports/compare", get(reports::compare))
        .route("/settings", get(settings::get).put(settings::update))
        .route("/recommendations", get(settings::recommendations))
        .route("/ai/chat", post(ai::chat))
        .nest("/facebook", facebook_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Unexpected("handler panicked".to_string()).into_response()
}

/// An empty allow-list admits any origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(facebook::FACEBOOK_TOKEN_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));

    if config.cors_origins.is_empty() {
        return layer.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
