use axum::http::StatusCode;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::StatsConfig;
use crate::error::{StatsError, StatsResult};

/// Query parameters as sent on the wire. Unset filters are simply absent.
pub type Query = Vec<(&'static str, String)>;

/// Shared by every reader and the recorder. Cloning is cheap; the inner
/// `reqwest::Client` keeps one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
}

impl BackendClient {
    pub fn new(config: &StatsConfig) -> StatsResult<Self> {
        let base = config.stats_base();
        Url::parse(&base).map_err(|e| StatsError::InvalidBaseUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StatsError::InvalidBaseUrl {
                url: base.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { http, base })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET `path` and return the decoded JSON body.
    pub async fn get_json(
        &self,
        path: &str,
        query: &Query,
        token: Option<&str>,
    ) -> StatsResult<Value> {
        let url = self.url(path);
        debug!(%url, ?query, authenticated = token.is_some(), "stats GET");

        let mut req = self.http.get(&url).query(query);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|source| StatsError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StatsError::Status {
                path: path.to_string(),
                status,
            });
        }

        resp.json::<Value>().await.map_err(|e| StatsError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// POST a JSON body. Only the status matters to callers.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> StatsResult<StatusCode> {
        let url = self.url(path);
        debug!(%url, authenticated = token.is_some(), "stats POST");

        let mut req = self.http.post(&url).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|source| StatsError::Transport {
            path: path.to_string(),
            source,
        })?;

        Ok(resp.status())
    }
}
