use crate::ai::AiClient;
use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::graph::{token_source, AccessTokenSource, GraphClient};
use crate::models::AppData;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub config: Arc<Config>,
    pub tokens: TokenIssuer,
    pub graph: GraphClient,
    pub facebook_token: Arc<dyn AccessTokenSource>,
    pub ai: AiClient,
}

impl AppState {
    pub fn new(config: Config, data: AppData) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            data_path: config.data_path.clone(),
            data: Arc::new(Mutex::new(data)),
            tokens: TokenIssuer::from_config(&config),
            graph: GraphClient::new(
                http.clone(),
                &config.facebook.graph_url,
                &config.facebook.graph_version,
            ),
            facebook_token: token_source(&config.facebook),
            ai: AiClient::new(http, config.ai.clone()),
            config: Arc::new(config),
        })
    }

    pub fn revenue_per_result(&self) -> f64 {
        self.config.revenue_per_result
    }
}
