use crate::config::{FacebookConfig, TokenMode};
use crate::constants::FB_LOGIN_SCOPES;
use crate::errors::AppError;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph API request failed: {0}")]
    RequestFailed(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Invalid Graph API response: {0}")]
    InvalidResponse(String),
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Api { status: 400, message } => AppError::Validation(message),
            GraphError::Api { status: 401, message } => AppError::Auth(message),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Thin GET wrapper around `graph.facebook.com/<version>`.
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(client: Client, graph_url: &str, version: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/{}", graph_url.trim_end_matches('/'), version),
        }
    }

    /// GETs `path` with the token and extra query parameters, returning the
    /// decoded body of a successful response.
    pub async fn get(
        &self,
        access_token: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, GraphError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "graph api request");

        let request = self
            .client
            .get(&url)
            .query(&[("access_token", access_token)])
            .query(params);
        send_json(request).await
    }

    /// `GET <node>?fields=...`
    pub async fn fields(
        &self,
        access_token: &str,
        node: &str,
        fields: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, GraphError> {
        let mut params = vec![("fields", fields)];
        params.extend_from_slice(extra);
        self.get(access_token, node, &params).await
    }

    /// The `data` array of a list response.
    pub async fn list(
        &self,
        access_token: &str,
        edge: &str,
        fields: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<Value>, GraphError> {
        let body = self.fields(access_token, edge, fields, extra).await?;
        Ok(data_list(&body))
    }

    /// Single-record insight query: `data[0]`, or an empty object.
    pub async fn first(
        &self,
        access_token: &str,
        edge: &str,
        fields: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, GraphError> {
        let body = self.fields(access_token, edge, fields, extra).await?;
        Ok(data_list(&body)
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    pub async fn exchange_token(
        &self,
        short_lived_token: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Result<Value, GraphError> {
        let url = format!("{}/oauth/access_token", self.base_url);
        let request = self.client.get(&url).query(&[
            ("grant_type", "fb_exchange_token"),
            ("client_id", app_id),
            ("client_secret", app_secret),
            ("fb_exchange_token", short_lived_token),
        ]);
        send_json(request).await
    }
}

/// Sends the request and decodes the body, turning a non-2xx status into
/// [`GraphError::Api`] with Graph's own message.
async fn send_json(request: RequestBuilder) -> Result<Value, GraphError> {
    let response = request
        .send()
        .await
        .map_err(|e| GraphError::RequestFailed(e.to_string()))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;

    if !status.is_success() {
        return Err(GraphError::Api {
            status: status.as_u16(),
            message: upstream_message(&body),
        });
    }
    Ok(body)
}

/// The Facebook Login dialog URL that sends the user back to `redirect_uri`
/// with an authorization code.
pub fn login_dialog_url(
    dialog_url: &str,
    version: &str,
    app_id: &str,
    redirect_uri: &str,
) -> Result<Url, AppError> {
    let base = format!("{}/{}/dialog/oauth", dialog_url.trim_end_matches('/'), version);
    Url::parse_with_params(
        &base,
        &[
            ("client_id", app_id),
            ("redirect_uri", redirect_uri),
            ("scope", FB_LOGIN_SCOPES),
            ("response_type", "code"),
        ],
    )
    .map_err(|e| AppError::upstream(format!("invalid Facebook login URL: {e}")))
}

fn data_list(body: &Value) -> Vec<Value> {
    body.get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn upstream_message(body: &Value) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown Graph API error")
        .to_string()
}

/// Decides which access token the proxy sends to the Graph API.
pub trait AccessTokenSource: Send + Sync {
    /// `supplied` is the token the caller sent with the request, if any.
    fn resolve(&self, supplied: Option<&str>) -> Result<String, AppError>;
}

/// Always the server-held long-lived token; caller tokens are ignored.
pub struct ServiceToken {
    token: Option<String>,
}

impl AccessTokenSource for ServiceToken {
    fn resolve(&self, _supplied: Option<&str>) -> Result<String, AppError> {
        self.token
            .clone()
            .ok_or_else(|| AppError::upstream("Facebook access token is not configured"))
    }
}

/// Forwards the token supplied by the caller.
pub struct CallerToken;

impl AccessTokenSource for CallerToken {
    fn resolve(&self, supplied: Option<&str>) -> Result<String, AppError> {
        supplied
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::unauthorized("Missing Facebook access token"))
    }
}

pub fn token_source(config: &FacebookConfig) -> Arc<dyn AccessTokenSource> {
    match config.token_mode {
        TokenMode::Service => Arc::new(ServiceToken {
            token: config.access_token.clone(),
        }),
        TokenMode::Caller => Arc::new(CallerToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn facebook(mode: TokenMode, token: Option<&str>) -> FacebookConfig {
        FacebookConfig {
            app_id: None,
            app_secret: None,
            redirect_uri: None,
            dialog_url: "https://www.facebook.com".to_string(),
            access_token: token.map(str::to_string),
            token_mode: mode,
            graph_url: "https://graph.facebook.com".to_string(),
            graph_version: "v20.0".to_string(),
        }
    }

    #[test]
    fn service_token_ignores_caller() {
        let source = token_source(&facebook(TokenMode::Service, Some("server")));
        assert_eq!(source.resolve(Some("caller")).unwrap(), "server");
        assert_eq!(source.resolve(None).unwrap(), "server");
    }

    #[test]
    fn missing_service_token_is_a_server_error() {
        let source = token_source(&facebook(TokenMode::Service, None));
        let err = source.resolve(Some("caller")).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Facebook access token is not configured");
    }

    #[test]
    fn caller_token_is_forwarded() {
        let source = token_source(&facebook(TokenMode::Caller, Some("server")));
        assert_eq!(source.resolve(Some(" caller ")).unwrap(), "caller");
        assert!(source.resolve(None).is_err());
        assert!(source.resolve(Some("")).is_err());
    }

    #[test]
    fn upstream_status_is_kept_for_client_errors() {
        let bad = AppError::from(GraphError::Api { status: 400, message: "bad field".into() });
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.to_string(), "bad field");

        let expired = AppError::from(GraphError::Api { status: 401, message: "expired".into() });
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let other = AppError::from(GraphError::Api { status: 503, message: "down".into() });
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.to_string(), "down");
    }

    #[test]
    fn upstream_message_reads_error_object() {
        let body = json!({ "error": { "message": "Invalid OAuth access token.", "code": 190 } });
        assert_eq!(upstream_message(&body), "Invalid OAuth access token.");
        assert_eq!(upstream_message(&json!({})), "Unknown Graph API error");
    }

    #[test]
    fn login_url_carries_app_and_redirect() {
        let url = login_dialog_url(
            "https://www.facebook.com/",
            "v20.0",
            "12345",
            "https://app.example.com/facebook/callback",
        )
        .unwrap();
        assert_eq!(url.path(), "/v20.0/dialog/oauth");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "12345");
        assert_eq!(params["redirect_uri"], "https://app.example.com/facebook/callback");
        assert_eq!(params["scope"], FB_LOGIN_SCOPES);
    }
}
